//! The food log over HTTP: daily view, edits and the progress trend.

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::log_routes())
        .merge(handlers::progress_routes())
}
