use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::ai::AiError;
use crate::nutrition::NutritionError;

/// Failure of a service call: rejected input, a storage fault or an AI
/// boundary fault. Persisted state is unchanged in every case.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Rejected(#[from] NutritionError),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl From<ServiceError> for (StatusCode, String) {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Rejected(e) => e.into(),
            ServiceError::Ai(e) => e.into(),
            ServiceError::Storage(e) => {
                error!(error = %format!("{e:#}"), "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not save your changes, please try again".into(),
                )
            }
        }
    }
}

/// `Json` body whose rejections answer 400 with axum's message, so a bad
/// enum value or a missing field reads like any other invalid input.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = (StatusCode, String);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let status = match &rejection {
                    JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    JsonRejection::BytesRejection(r) => r.status(),
                    _ => StatusCode::BAD_REQUEST,
                };
                warn!(%status, error = %rejection.body_text(), "request body rejected");
                Err((status, rejection.body_text()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_hide_details() {
        let (status, msg) =
            <(StatusCode, String)>::from(ServiceError::Storage(anyhow::anyhow!("pool timed out")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!msg.contains("pool"));
    }

    #[test]
    fn rejections_keep_their_status() {
        let (status, _) =
            <(StatusCode, String)>::from(ServiceError::from(NutritionError::MissingMetric("age")));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
