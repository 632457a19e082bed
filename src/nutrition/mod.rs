//! Nutrition domain: serving-size scaling, daily aggregation, goal
//! evaluation, TDEE estimation and the food log itself. Pure code, no I/O.

pub mod aggregate;
pub mod error;
pub mod goals;
pub mod log;
pub mod profile;
pub mod scaler;
pub mod tdee;
pub mod types;

pub use error::NutritionError;
