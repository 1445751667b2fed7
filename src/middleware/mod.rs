use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Пользователь, чья сессия подтверждена для текущего запроса.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub token_hash: String,
}

// Структура для результата из БД
#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: Uuid,
    email: String,
    name: String,
    expires_at: DateTime<Utc>,
}

/// Токен сессии: сначала `Authorization: Bearer`, затем cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// В БД хранится только SHA-256 от токена.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

/// Разбирает `Authorization: Basic base64(email:password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?
        .strip_prefix("Basic ")?;

    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    // Разделяем email:password
    let (email, password) = credentials.split_once(':')?;
    if email.is_empty() || password.is_empty() {
        return None;
    }
    Some((email.to_string(), password.to_string()))
}

/// Срок жизни записи о сессии в кеше: короткий и не дольше самой сессии.
pub fn session_cache_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>, cap_seconds: u64) -> u64 {
    let remaining = u64::try_from((expires_at - now).num_seconds()).unwrap_or(0);
    remaining.min(cap_seconds)
}

// Session extractor: всё, что его требует, недоступно без сессии
impl FromRequestParts<Arc<AppState>> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.session.cookie_name)
            .ok_or(AppError::Unauthorized)?;
        let token_hash = hash_token(&token);

        match state.cache.get_cached_session(&token_hash).await {
            Ok(Some(mut user)) if user.expires_at > Utc::now() => {
                user.token_hash = token_hash;
                return Ok(user);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("session cache unavailable: {:?}", e),
        }

        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT u.id AS user_id, u.email, u.name, s.expires_at
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = $1 AND s.expires_at > NOW()"
        )
        .bind(&token_hash)
        .fetch_optional(&state.db.pool)
        .await?;

        let row = row.ok_or(AppError::Unauthorized)?;
        let user = SessionUser {
            user_id: row.user_id,
            email: row.email,
            name: row.name,
            expires_at: row.expires_at,
            token_hash,
        };

        let ttl = session_cache_ttl(user.expires_at, Utc::now(), state.config.session.cache_ttl_seconds);
        if let Err(e) = state.cache.cache_session(&user.token_hash, &user, ttl).await {
            tracing::warn!("failed to cache session: {:?}", e);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cached_sessions_live_briefly() {
        let now = Utc::now();
        let month = now + chrono::Duration::days(30);
        assert_eq!(session_cache_ttl(month, now, 300), 300);
        assert_eq!(session_cache_ttl(now + chrono::Duration::seconds(40), now, 300), 40);
        assert_eq!(session_cache_ttl(now - chrono::Duration::seconds(1), now, 300), 0);
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; stays_session=from-cookie"));
        assert_eq!(session_token(&headers, "stays_session").as_deref(), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_token(&headers, "stays_session").as_deref(), Some("from-header"));
    }

    #[test]
    fn no_token_without_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers, "stays_session"), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("stays_session="));
        headers.append(header::COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(session_token(&headers, "stays_session"), None);
    }

    #[test]
    fn token_hash_is_stable_and_opaque() {
        let hash = hash_token("abc");
        assert_eq!(hash, hash_token("abc"));
        assert_ne!(hash, hash_token("abd"));
        assert_eq!(hash.len(), 43);
    }

    #[test]
    fn basic_credentials_split_on_first_colon() {
        let mut headers = HeaderMap::new();
        let encoded = general_purpose::STANDARD.encode("host@example.com:pa:ss");
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", encoded)).unwrap(),
        );
        assert_eq!(
            basic_credentials(&headers),
            Some(("host@example.com".to_string(), "pa:ss".to_string()))
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
        assert_eq!(basic_credentials(&headers), None);
    }
}
