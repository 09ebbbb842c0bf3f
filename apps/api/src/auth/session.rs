//! Opaque session tokens stored in `sessions`, carried by the `session` cookie
//! or an `Authorization: Bearer` header.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn create_session(pool: &PgPool, user_id: Uuid, ttl_days: i64) -> Result<String, AppError> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::days(ttl_days);
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;
    debug!("Created session for user {user_id}, expires {expires_at}");
    Ok(token)
}

pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// The user behind an unexpired session, if any.
pub async fn find_user_by_token(pool: &PgPool, token: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.email, u.name, u.is_verified
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = $1 AND s.expires_at > now()
        LIMIT 1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// The session token from the cookie, falling back to a bearer token.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|t| !t.is_empty());

    from_cookie
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
        .map(str::to_string)
}

pub fn session_cookie(token: &str, ttl_days: i64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Secure; Path=/; Max-Age={}",
        ttl_days * 24 * 60 * 60
    )
}

pub fn cleared_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Secure; Path=/; Max-Age=0")
}

/// Extractor for handlers that require a signed-in user. Rejects with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        find_user_by_token(&state.db, &token)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_shape() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_token_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=cookie-token; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_empty_cookie_is_no_session() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("t0k", 30);
        assert!(cookie.starts_with("session=t0k;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(cleared_session_cookie().contains("Max-Age=0"));
    }
}
