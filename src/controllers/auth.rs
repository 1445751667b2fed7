use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::{basic_credentials, hash_token, SessionUser};
use crate::models::{NewUser, User};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route(
            "/auth/session",
            post(create_session).get(current_session).delete(delete_session),
        )
}

fn session_cookie(config: &Config, token: &str, max_age_seconds: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.session.cookie_name, token, max_age_seconds
    );
    if config.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))
}

// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    input.validate()?;

    let email = input.email.trim().to_lowercase();
    if User::find_by_email(&email, &state.db.pool).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password = input.password;
    let password_hash = blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await?
        .map_err(|e| AppError::Internal(format!("bcrypt: {}", e)))?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, name, password_hash)
         VALUES ($1, $2, $3, $4)
         RETURNING id, email, name, password_hash, created_at"
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(input.name.trim())
    .bind(password_hash)
    .fetch_one(&state.db.pool)
    .await?;

    info!("User {} registered", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/auth/session (Basic auth)
async fn create_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let (email, password) = basic_credentials(&headers).ok_or(AppError::Unauthorized)?;

    let user = User::find_by_email(&email.trim().to_lowercase(), &state.db.pool)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let candidate = user.clone();
    if !blocking(move || candidate.verify_password(&password)).await? {
        return Err(AppError::Unauthorized);
    }

    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let ttl = Duration::try_hours(state.config.session.ttl_hours)
        .ok_or_else(|| AppError::Internal("session.ttl_hours is out of range".to_string()))?;
    let expires_at = Utc::now() + ttl;

    sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(hash_token(&token))
        .bind(user.id)
        .bind(expires_at)
        .execute(&state.db.pool)
        .await?;

    info!("Session opened for user {}", user.id);

    let cookie = session_cookie(&state.config, &token, ttl.num_seconds());
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "token": token,
            "expiresAt": expires_at,
            "user": { "id": user.id, "email": user.email, "name": user.name }
        })),
    ))
}

// GET /api/auth/session
async fn current_session(user: SessionUser) -> impl IntoResponse {
    Json(json!({
        "id": user.user_id,
        "email": user.email,
        "name": user.name,
        "expiresAt": user.expires_at,
    }))
}

// DELETE /api/auth/session
async fn delete_session(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> AppResult<impl IntoResponse> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(&user.token_hash)
        .execute(&state.db.pool)
        .await?;

    if let Err(e) = state.cache.invalidate_session(&user.token_hash).await {
        tracing::warn!("failed to drop cached session: {:?}", e);
    }

    info!("Session closed for user {}", user.user_id);
    let cookie = session_cookie(&state.config, "", 0);
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}
