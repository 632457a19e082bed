use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, Credentials, JwtKeys, PublicUser, RefreshRequest, TokenKind},
        repo::User,
        services::{check_credentials, hash_password, verify_password, AuthError, AuthUser},
    },
    error::ApiJson,
    nutrition::types::UserProfile,
    profile,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn respond(state: &AppState, user: User) -> Result<AuthResponse, AuthError> {
    let tokens = JwtKeys::from_ref(state).issue(user.id)?;
    Ok(AuthResponse {
        access_token: tokens.access,
        refresh_token: tokens.refresh,
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let email = check_credentials(&payload, true)?;
    let hash = hash_password(&payload.password)?;
    let user = state.users.create(&email, &hash).await.map_err(|e| {
        warn!(%email, error = %e, "registration failed");
        AuthError::from(e)
    })?;

    // every account starts with the default goals
    profile::repo::save(state.store.as_ref(), user.id, &UserProfile::default())
        .await
        .map_err(|e| AuthError::Internal(e.context("seeding default profile")))?;

    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(respond(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let email = check_credentials(&payload, false)?;
    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(AuthError::Internal)?
        .ok_or_else(|| {
            warn!(%email, "login for unknown email");
            AuthError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(respond(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let claims = JwtKeys::from_ref(&state).verify(&payload.refresh_token, TokenKind::Refresh)?;
    let user = load_user(&state, claims.sub).await?;
    Ok(Json(respond(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = load_user(&state, user_id).await?;
    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
    }))
}

async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, AuthError> {
    state
        .users
        .find_by_id(user_id)
        .await
        .map_err(AuthError::Internal)?
        .ok_or_else(|| {
            warn!(%user_id, "token for a deleted user");
            AuthError::UnknownUser
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("id"));
    }
}
