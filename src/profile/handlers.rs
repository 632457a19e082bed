use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use tracing::instrument;

use super::dto::{MacroSplitRequest, TdeeApplied};
use super::services;
use crate::{
    auth::services::AuthUser,
    error::ApiJson,
    nutrition::{
        profile::ProfileAction,
        tdee::{MetricsInput, TdeeEstimate},
        types::UserProfile,
    },
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(put_profile))
        .route("/profile/macros", post(apply_macro_split))
        .route("/profile/tdee", post(estimate_tdee))
        .route("/profile/tdee/apply", post(apply_tdee))
}

type ApiError = (StatusCode, String);

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(services::get(&state, user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn put_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<UserProfile>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = services::apply(&state, user_id, ProfileAction::Replace(body)).await?;
    Ok(Json(profile))
}

#[instrument(skip(state))]
pub async fn apply_macro_split(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<MacroSplitRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let action = ProfileAction::ApplyMacroSplit(body.into());
    Ok(Json(services::apply(&state, user_id, action).await?))
}

#[instrument(skip(state))]
pub async fn estimate_tdee(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<MetricsInput>,
) -> Result<Json<TdeeEstimate>, ApiError> {
    Ok(Json(services::estimate_tdee(&state, user_id, body).await?))
}

#[instrument(skip(state))]
pub async fn apply_tdee(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<MetricsInput>,
) -> Result<Json<TdeeApplied>, ApiError> {
    let (estimate, profile) = services::apply_tdee(&state, user_id, body).await?;
    Ok(Json(TdeeApplied { estimate, profile }))
}
