use std::future::Future;

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::client::InlineImage;
use super::dto::{
    AugmentRequest, EstimateJsonRequest, ImageEstimate, ParsedFood, QueryRequest, RecipeRequest,
    RecipeResult, SearchResults, Suggestion,
};
use super::error::AiError;
use super::flows;
use super::generations::Flow;
use crate::{auth::services::AuthUser, error::ApiJson, state::AppState};

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/ai/estimate", post(estimate))
        .route("/ai/augment", post(augment))
        .route("/ai/search", post(search))
        .route("/ai/parse", post(parse))
        .route("/ai/recipe", post(recipe))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

type ApiError = (StatusCode, String);

/// Runs one flow call under a fresh generation ticket; the result is
/// dropped if a newer call for the same user and flow started meanwhile.
async fn guarded<T>(
    state: &AppState,
    owner: Uuid,
    flow: Flow,
    call: impl Future<Output = Result<T, AiError>>,
) -> Result<T, AiError> {
    let ticket = state.generations.begin(owner, flow);
    let result = call.await;
    if let Err(e) = &result {
        warn!(error = %e, %owner, ?flow, "AI flow failed");
    }
    state.generations.finish(ticket, result)
}

/// POST /ai/estimate: multipart field `image`, or JSON `{ photoDataUri }`.
#[instrument(skip(state, req))]
pub async fn estimate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    req: Request,
) -> Result<Json<ImageEstimate>, ApiError> {
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let image = if is_multipart {
        let mp = Multipart::from_request(req, &state)
            .await
            .map_err(|e| (e.status(), e.body_text()))?;
        image_from_multipart(mp).await?
    } else {
        let ApiJson(body) = ApiJson::<EstimateJsonRequest>::from_request(req, &state).await?;
        InlineImage::from_data_uri(&body.photo_data_uri)?
    };

    let model = state.ai.clone();
    let out = guarded(&state, user_id, Flow::Estimate, async move {
        flows::estimate_image(model.as_ref(), image).await
    })
    .await?;
    Ok(Json(out))
}

async fn image_from_multipart(mut mp: Multipart) -> Result<InlineImage, ApiError> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_owned)
            .unwrap_or_else(|| "application/octet-stream".into());
        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
        return Ok(InlineImage::from_bytes(&content_type, &data)?);
    }
    Err((StatusCode::BAD_REQUEST, "image is required".into()))
}

#[instrument(skip(state, body))]
pub async fn augment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<AugmentRequest>,
) -> Result<Json<Vec<Suggestion>>, ApiError> {
    let model = state.ai.as_ref();
    let out = guarded(&state, user_id, Flow::Augment, flows::augment(model, &body.items)).await?;
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<QueryRequest>,
) -> Result<Json<SearchResults>, ApiError> {
    let model = state.ai.as_ref();
    let results = guarded(&state, user_id, Flow::Search, flows::search(model, &body.query)).await?;
    Ok(Json(SearchResults { results }))
}

#[instrument(skip(state))]
pub async fn parse(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<QueryRequest>,
) -> Result<Json<Vec<ParsedFood>>, ApiError> {
    let model = state.ai.as_ref();
    let out = guarded(&state, user_id, Flow::Parse, flows::parse_text(model, &body.query)).await?;
    Ok(Json(out))
}

#[instrument(skip(state, body))]
pub async fn recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<RecipeRequest>,
) -> Result<Json<RecipeResult>, ApiError> {
    let model = state.ai.as_ref();
    let out = guarded(&state, user_id, Flow::Recipe, flows::reimagine_recipe(model, &body)).await?;
    Ok(Json(out))
}
