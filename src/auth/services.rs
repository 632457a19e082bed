use crate::auth::dto::{Claims, Credentials, JwtKeys, TokenKind};
use crate::auth::repo::CreateUserError;
use crate::config::JwtConfig;
use crate::state::AppState;
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, warn};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid");
}

/// Account and token failures, each with a fixed public message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Missing or malformed Authorization header")]
    MissingToken,
    #[error("User not found")]
    UnknownUser,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("{expected:?} token required")]
    WrongTokenKind { expected: TokenKind },
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for (StatusCode, String) {
    fn from(e: AuthError) -> Self {
        let status = match &e {
            AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::Internal(inner) => {
                error!(error = %format!("{inner:#}"), "auth internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        };
        (status, e.to_string())
    }
}

impl From<CreateUserError> for AuthError {
    fn from(e: CreateUserError) -> Self {
        match e {
            CreateUserError::EmailTaken => AuthError::EmailTaken,
            CreateUserError::Other(inner) => AuthError::Internal(inner),
        }
    }
}

/// Normalized email for a login or registration attempt. Registration also
/// enforces the password length; logins are checked against the hash only.
pub fn check_credentials(c: &Credentials, registering: bool) -> Result<String, AuthError> {
    let email = c.email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        warn!(%email, "invalid email");
        return Err(AuthError::InvalidEmail);
    }
    if registering && c.password.chars().count() < MIN_PASSWORD_LEN {
        warn!(%email, "password too short");
        return Err(AuthError::WeakPassword);
    }
    Ok(email)
}

pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("argon2 hash: {e}"))?;
    Ok(hash.to_string())
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is
/// unreadable.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("argon2 parse hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        let minutes = |m: i64| Duration::from_secs(m.max(1) as u64 * 60);
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: minutes(cfg.ttl_minutes),
            refresh_ttl: minutes(cfg.refresh_ttl_minutes),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    fn sign(&self, owner: Uuid, kind: TokenKind) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: owner,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(anyhow::Error::new(e).context("jwt encode")))
    }

    /// Fresh access and refresh tokens for the owner of a food log.
    pub fn issue(&self, owner: Uuid) -> Result<TokenPair, AuthError> {
        let pair = TokenPair {
            access: self.sign(owner, TokenKind::Access)?,
            refresh: self.sign(owner, TokenKind::Refresh)?,
        };
        debug!(%owner, "token pair issued");
        Ok(pair)
    }

    /// Checks signature, expiry, issuer and audience, then the token kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| {
                warn!(error = %e, "token rejected");
                AuthError::InvalidToken
            })?
            .claims;
        if claims.kind != expected {
            warn!(owner = %claims.sub, kind = ?claims.kind, "wrong token kind");
            return Err(AuthError::WrongTokenKind { expected });
        }
        Ok(claims)
    }
}

fn bearer(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Owner of the request, taken from a Bearer access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer(parts).ok_or(AuthError::MissingToken)?;
        let claims = JwtKeys::from_ref(state).verify(token, TokenKind::Access)?;
        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn make_keys(issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: "same-secret".into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        })
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials { email: email.into(), password: password.into() }
    }

    #[test]
    fn credentials_are_normalized_and_checked() {
        assert_eq!(
            check_credentials(&creds("  Cook@Example.COM ", "long enough"), true).unwrap(),
            "cook@example.com"
        );
        assert!(matches!(
            check_credentials(&creds("cook@example", "long enough"), true),
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            check_credentials(&creds("cook@example.com", "short"), true),
            Err(AuthError::WeakPassword)
        ));
        // an old short password still reaches the hash check on login
        assert!(check_credentials(&creds("cook@example.com", "short"), false).is_ok());
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct-horse-battery").expect("hashing should succeed");
        assert!(verify_password("correct-horse-battery", &hash).expect("verify should succeed"));
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-valid-hash"),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn issued_pair_verifies_by_kind() {
        let keys = make_keys("iss", "aud");
        let owner = Uuid::new_v4();
        let pair = keys.issue(owner).expect("issue");

        assert_eq!(keys.verify(&pair.access, TokenKind::Access).unwrap().sub, owner);
        assert_eq!(keys.verify(&pair.refresh, TokenKind::Refresh).unwrap().sub, owner);
        assert!(matches!(
            keys.verify(&pair.refresh, TokenKind::Access),
            Err(AuthError::WrongTokenKind { expected: TokenKind::Access })
        ));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let pair = make_keys("good-iss", "good-aud").issue(Uuid::new_v4()).unwrap();
        let other = make_keys("bad-iss", "bad-aud");
        assert!(matches!(other.verify(&pair.access, TokenKind::Access), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn statuses_follow_the_failure() {
        let status = |e: AuthError| <(StatusCode, String)>::from(e).0;
        assert_eq!(status(AuthError::WeakPassword), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::EmailTaken), StatusCode::CONFLICT);
        assert_eq!(status(AuthError::InvalidToken), StatusCode::UNAUTHORIZED);
        let (code, msg) = <(StatusCode, String)>::from(AuthError::Internal(anyhow::anyhow!("db down")));
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!msg.contains("db down"));
    }

    #[tokio::test]
    async fn extractor_rejects_refresh_tokens() {
        let keys = make_keys("iss", "aud");
        let pair = keys.issue(Uuid::new_v4()).unwrap();
        let (mut parts, ()) = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {}", pair.refresh))
            .body(())
            .unwrap()
            .into_parts();

        let (status, _) = AuthUser::from_request_parts(&mut parts, &keys).await.unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
