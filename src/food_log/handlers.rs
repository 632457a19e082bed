use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use time::{Date, OffsetDateTime};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    AddCatalogFoodRequest, AddFoodRequest, AddedFoods, Dashboard, DateQuery, Progress,
    ProgressQuery, RescaleRequest, ReplaceFoodRequest, MAX_PROGRESS_DAYS,
};
use super::services;
use crate::{
    auth::services::AuthUser,
    error::ApiJson,
    nutrition::{
        log::{LogAction, LogChange},
        types::FoodItem,
    },
    state::AppState,
};

pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/log", get(get_day).post(add_foods))
        .route("/log/catalog", post(add_catalog_food))
        .route("/log/:id", patch(rescale_entry).delete(remove_entry))
        .route("/log/:id/food", put(replace_food))
}

pub fn progress_routes() -> Router<AppState> {
    Router::new().route("/progress", get(get_progress))
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

type ApiError = (StatusCode, String);

#[instrument(skip(state))]
pub async fn get_day(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DateQuery>,
) -> Result<Json<Dashboard>, ApiError> {
    let date = q.date.unwrap_or_else(today);
    Ok(Json(services::dashboard(&state, user_id, date).await?))
}

#[instrument(skip(state, body))]
pub async fn add_foods(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<AddFoodRequest>,
) -> Result<(StatusCode, Json<AddedFoods>), ApiError> {
    let action = LogAction::Add {
        date: body.date.unwrap_or_else(today),
        meal_type: body.meal_type,
        foods: body.items.into_iter().map(Into::into).collect(),
    };
    let items = added(services::apply(&state, user_id, action).await?)?;
    Ok((StatusCode::CREATED, Json(AddedFoods { items })))
}

#[instrument(skip(state, body))]
pub async fn add_catalog_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<AddCatalogFoodRequest>,
) -> Result<(StatusCode, Json<AddedFoods>), ApiError> {
    let action = LogAction::AddFromCatalog {
        date: body.date.unwrap_or_else(today),
        meal_type: body.meal_type,
        food: body.food,
        unit: body.unit,
        quantity: body.quantity,
    };
    let items = added(services::apply(&state, user_id, action).await?)?;
    Ok((StatusCode::CREATED, Json(AddedFoods { items })))
}

#[instrument(skip(state))]
pub async fn rescale_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<RescaleRequest>,
) -> Result<Json<FoodItem>, ApiError> {
    let action = LogAction::Rescale { id, weight: body.weight };
    Ok(Json(updated(services::apply(&state, user_id, action).await?)?))
}

#[instrument(skip(state, body))]
pub async fn replace_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<ReplaceFoodRequest>,
) -> Result<Json<FoodItem>, ApiError> {
    let action = LogAction::ReplaceFood { id, food: body.food };
    Ok(Json(updated(services::apply(&state, user_id, action).await?)?))
}

#[instrument(skip(state))]
pub async fn remove_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    services::apply(&state, user_id, LogAction::Remove { id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ProgressQuery>,
) -> Result<Json<Progress>, ApiError> {
    if q.days == 0 || q.days > MAX_PROGRESS_DAYS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("days must be between 1 and {MAX_PROGRESS_DAYS}"),
        ));
    }
    Ok(Json(services::progress(&state, user_id, today(), q.days).await?))
}

fn added(change: LogChange) -> Result<Vec<FoodItem>, ApiError> {
    match change {
        LogChange::Added(items) => Ok(items),
        other => Err(unexpected(other)),
    }
}

fn updated(change: LogChange) -> Result<FoodItem, ApiError> {
    match change {
        LogChange::Updated(item) => Ok(item),
        other => Err(unexpected(other)),
    }
}

fn unexpected(change: LogChange) -> ApiError {
    tracing::error!(?change, "food log returned a change of the wrong kind");
    (StatusCode::INTERNAL_SERVER_ERROR, "unexpected log change".into())
}
