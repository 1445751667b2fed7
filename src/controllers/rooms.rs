//! Публичные запросы к номерам: выдача с фильтрами и карточка номера.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::room::{parse_room_id, INVALID_ID};
use crate::search_client::RoomSearch;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/room.getAllRooms", get(get_all_rooms))
        .route("/room.getSingleRoom", get(get_single_room))
}

fn json_with_cache_status(body: String, status: &'static str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::HeaderName::from_static("x-cache"), status),
        ],
        body,
    )
        .into_response()
}

/// Поколение кеша номеров; `None`, если Redis недоступен.
async fn rooms_generation(state: &AppState) -> Option<i64> {
    match state.cache.rooms_generation().await {
        Ok(generation) => Some(generation),
        Err(e) => {
            tracing::warn!("rooms cache unavailable: {:?}", e);
            None
        }
    }
}

// GET /api/room.getAllRooms
pub async fn get_all_rooms(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RoomSearch>, QueryRejection>,
) -> AppResult<Response> {
    let Query(search) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    search.validate()?;

    // 1. Поколение читаем один раз, до запроса в базу
    let generation = rooms_generation(&state).await;
    if let Some(generation) = generation {
        match state.cache.get_cached_listing(generation, &search).await {
            Ok(Some(cached)) => return Ok(json_with_cache_status(cached, "HIT")),
            Ok(None) => {}
            Err(e) => tracing::warn!("listing cache read failed: {:?}", e),
        }
    }

    // 2. Cache Miss: идём в базу
    let (count, rooms) = state.search_client.search(&search).await?;

    let body = serde_json::to_string(&(count, &rooms))
        .map_err(|e| AppError::Internal(format!("failed to serialize listing: {}", e)))?;

    // 3. Сохраняем под прочитанным поколением
    if let Some(generation) = generation {
        if let Err(e) = state
            .cache
            .cache_listing(generation, &search, &body, state.config.listing.cache_ttl_seconds)
            .await
        {
            tracing::warn!("Failed to cache listing: {:?}", e);
        }
    }

    Ok(json_with_cache_status(body, "MISS"))
}

#[derive(Debug, Deserialize)]
pub struct SingleRoomQuery {
    pub id: Option<String>,
}

// GET /api/room.getSingleRoom?id=
pub async fn get_single_room(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SingleRoomQuery>,
) -> AppResult<impl IntoResponse> {
    // Нечисловой id: в базу не ходим
    let id = parse_room_id(params.id.as_deref())
        .ok_or_else(|| AppError::NotFound(INVALID_ID.to_string()))?;

    let generation = rooms_generation(&state).await;
    if let Some(generation) = generation {
        match state.cache.get_cached_room(generation, id).await {
            Ok(Some(room)) => return Ok(Json(room)),
            Ok(None) => {}
            Err(e) => tracing::warn!("room cache read failed: {:?}", e),
        }
    }

    let room = state
        .search_client
        .find(id)
        .await?
        .ok_or_else(|| AppError::room_not_found(id))?;

    if let Some(generation) = generation {
        if let Err(e) = state
            .cache
            .cache_room(generation, &room, state.config.listing.cache_ttl_seconds)
            .await
        {
            tracing::warn!("Failed to cache room {}: {:?}", id, e);
        }
    }

    Ok(Json(room))
}
