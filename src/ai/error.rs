use axum::http::StatusCode;

/// Failures at the AI boundary. None of them change stored state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AiError {
    #[error("AI features are not configured")]
    NotConfigured,
    #[error("AI service unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("AI service did not answer in time")]
    Timeout,
    #[error("AI service returned an unusable answer: {0}")]
    Malformed(String),
    #[error("a newer request replaced this one")]
    Superseded,
    #[error("{0}")]
    BadInput(String),
}

impl AiError {
    pub fn status(&self) -> StatusCode {
        match self {
            AiError::NotConfigured | AiError::Unavailable(_) | AiError::Malformed(_) => {
                StatusCode::BAD_GATEWAY
            }
            AiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AiError::Superseded => StatusCode::CONFLICT,
            AiError::BadInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<AiError> for (StatusCode, String) {
    fn from(e: AiError) -> Self {
        (e.status(), e.to_string())
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::Timeout
        } else {
            AiError::Unavailable(e.to_string())
        }
    }
}
