use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, is_valid_email, verify_password, MIN_PASSWORD_LEN};
use crate::auth::session::{
    cleared_session_cookie, create_session, delete_session, session_cookie, session_token,
    CurrentUser,
};
use crate::auth::throttle::client_key;
use crate::errors::AppError;
use crate::models::user::{User, UserRow};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Email and password are required.".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        )));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Please enter a valid email address.".into()));
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task failed: {e}"))??;
    let name = req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

    // Verification mail is not sent; accounts start verified.
    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, password_hash, name, is_verified)
        VALUES ($1, $2, $3, TRUE)
        RETURNING id
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(name)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return AppError::Conflict("This email address is already registered.".into());
            }
        }
        AppError::Database(e)
    })?;

    info!("Created user {user_id}");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully!".into(),
            user_id,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Step 1: Throttle before touching the database
    let client = client_key(&headers);
    state.throttle.check(&client)?;

    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Email and password required".into()));
    }

    // Step 2: Look up the account
    let user: Option<UserRow> = sqlx::query_as(
        "SELECT id, email, password_hash, name, is_verified FROM users WHERE email = $1 LIMIT 1",
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await?;
    let Some(user) = user else {
        state.throttle.record_failure(&client);
        warn!(
            "Login for unknown account, {} attempts left for {client}",
            state.throttle.remaining(&client)
        );
        return Err(AppError::Validation(INVALID_CREDENTIALS.into()));
    };
    if !user.is_verified {
        return Err(AppError::Forbidden(
            "Email not verified. Please check your inbox and click the verification link.".into(),
        ));
    }

    // Step 3: Check the password off the async runtime
    let password = req.password;
    let stored = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task failed: {e}"))??;
    if !ok {
        state.throttle.record_failure(&client);
        warn!(
            "Wrong password for user {}, {} attempts left for {client}",
            user.id,
            state.throttle.remaining(&client)
        );
        return Err(AppError::Validation(INVALID_CREDENTIALS.into()));
    }

    // Step 4: Reset the counter and open a session
    state.throttle.clear(&client);
    let token = create_session(&state.db, user.id, state.config.session_ttl_days).await?;
    info!("User {} signed in", user.id);

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, state.config.session_ttl_days))],
        Json(LoginResponse {
            ok: true,
            user: user.into(),
        }),
    ))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = session_token(&headers) {
        delete_session(&state.db, &token).await?;
    }
    Ok((
        [(header::SET_COOKIE, cleared_session_cookie())],
        Json(json!({ "ok": true })),
    ))
}

/// GET /api/v1/auth/me
pub async fn handle_me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse { user })
}
