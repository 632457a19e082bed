use axum::http::StatusCode;
use uuid::Uuid;

/// Rejections raised by the nutrition domain. None of them mutate state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NutritionError {
    #[error("weight must be a positive number of grams, got {0}")]
    NonPositiveWeight(f64),

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(f64),

    #[error("serving unit `{0}` is not available for this food")]
    UnknownServingUnit(String),

    #[error("{field} {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    #[error("macro percentages must add up to 100, current total: {0}%")]
    MacroSplitTotal(u32),

    #[error("{0} is required to estimate daily calories")]
    MissingMetric(&'static str),

    #[error("food entry {0} not found")]
    EntryNotFound(Uuid),
}

impl NutritionError {
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidField { field, reason }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::EntryNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<NutritionError> for (StatusCode, String) {
    fn from(e: NutritionError) -> Self {
        (e.status(), e.to_string())
    }
}

/// Rejects NaN, infinities and negatives.
pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), NutritionError> {
    if !value.is_finite() {
        return Err(NutritionError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(NutritionError::invalid(field, "cannot be negative"));
    }
    Ok(())
}

pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<(), NutritionError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(NutritionError::invalid(field, "must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let (status, msg) = <(StatusCode, String)>::from(NutritionError::EntryNotFound(Uuid::nil()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(msg.contains("not found"));
    }

    #[test]
    fn validation_maps_to_400() {
        let (status, msg) = <(StatusCode, String)>::from(NutritionError::MacroSplitTotal(90));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(msg.contains("90%"));
    }

    #[test]
    fn finite_checks() {
        assert!(ensure_non_negative("fat", 0.0).is_ok());
        assert!(ensure_non_negative("fat", -0.5).is_err());
        assert!(ensure_non_negative("fat", f64::NAN).is_err());
        assert!(ensure_positive("weight", 0.0).is_err());
        assert!(ensure_positive("weight", f64::INFINITY).is_err());
        assert!(ensure_positive("weight", 12.5).is_ok());
    }
}
