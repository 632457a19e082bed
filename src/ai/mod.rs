//! Generative-model boundary. Nothing here reads or writes the food log;
//! clients confirm results and log them through the log routes.

pub mod client;
pub mod dto;
pub mod error;
pub mod flows;
pub mod generations;
pub mod handlers;
#[cfg(test)]
pub mod testing;

pub use error::AiError;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::ai_routes())
}
