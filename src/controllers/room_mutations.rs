//! Защищённые мутации номеров. Каждый обработчик требует [`SessionUser`],
//! поэтому без сессии запрос отклоняется до разбора тела и обращения к БД.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::SessionUser;
use crate::models::{room::ROOM_COLUMNS, ImageInput, NewRoom, Room, RoomId, RoomPatch};
use crate::search_client::load_images;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/postNewRoom", post(post_new_room))
        .route("/putUpdateRoom", post(put_update_room))
        .route("/deleteSingleRoom", post(delete_single_room))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/* ---------- helpers ---------- */

/// `INSERT` изображений номера; уже существующие `(room_id, public_id)` пропускаются.
pub fn insert_images_query(room_id: i32, images: &[ImageInput]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("INSERT INTO room_images (url, public_id, room_id) ");
    qb.push_values(images, |mut row, image| {
        row.push_bind(image.url.trim().to_string())
            .push_bind(image.public_id.trim().to_string())
            .push_bind(room_id);
    });
    qb.push(" ON CONFLICT (room_id, public_id) DO NOTHING");
    qb
}

async fn insert_images(
    conn: &mut PgConnection,
    room_id: i32,
    images: &[ImageInput],
) -> Result<u64, sqlx::Error> {
    if images.is_empty() {
        return Ok(0);
    }

    let result = insert_images_query(room_id, images).build().execute(conn).await?;
    Ok(result.rows_affected())
}

pub fn insert_query(input: &NewRoom, user: &SessionUser) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "INSERT INTO rooms (name, description, address, guest_capacity, num_of_beds, \
         price_per_night, internet, breakfast, airconditioned, pets_allowed, room_cleaning, \
         ratings, num_of_reviews, category, creator_id) VALUES (",
    );
    {
        let mut values = qb.separated(", ");
        values
            .push_bind(input.name.trim().to_string())
            .push_bind(input.description.trim().to_string())
            .push_bind(input.address.trim().to_string())
            .push_bind(input.guest_capacity)
            .push_bind(input.num_of_beds)
            .push_bind(input.price_per_night.unwrap_or(0.0))
            .push_bind(input.internet)
            .push_bind(input.breakfast)
            .push_bind(input.airconditioned)
            .push_bind(input.pets_allowed)
            .push_bind(input.room_cleaning)
            .push_bind(input.ratings.unwrap_or(0.0))
            .push_bind(input.num_of_reviews.unwrap_or(0))
            .push_bind(input.category)
            .push_bind(user.user_id);
    }
    qb.push(format!(") RETURNING {}", ROOM_COLUMNS));
    qb
}

/// `UPDATE` только по присланным полям. Вызывать, если `patch.touches_row()`.
pub fn update_query(patch: &RoomPatch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE rooms SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(name.trim().to_string());
        }
        if let Some(description) = &patch.description {
            set.push("description = ").push_bind_unseparated(description.trim().to_string());
        }
        if let Some(address) = &patch.address {
            set.push("address = ").push_bind_unseparated(address.trim().to_string());
        }
        if let Some(guests) = patch.guest_capacity {
            set.push("guest_capacity = ").push_bind_unseparated(guests);
        }
        if let Some(beds) = patch.num_of_beds {
            set.push("num_of_beds = ").push_bind_unseparated(beds);
        }
        if let Some(price) = patch.price_per_night {
            set.push("price_per_night = ").push_bind_unseparated(price);
        }
        if let Some(internet) = patch.internet {
            set.push("internet = ").push_bind_unseparated(internet);
        }
        if let Some(breakfast) = patch.breakfast {
            set.push("breakfast = ").push_bind_unseparated(breakfast);
        }
        if let Some(airconditioned) = patch.airconditioned {
            set.push("airconditioned = ").push_bind_unseparated(airconditioned);
        }
        if let Some(pets) = patch.pets_allowed {
            set.push("pets_allowed = ").push_bind_unseparated(pets);
        }
        if let Some(cleaning) = patch.room_cleaning {
            set.push("room_cleaning = ").push_bind_unseparated(cleaning);
        }
        if let Some(ratings) = patch.ratings {
            set.push("ratings = ").push_bind_unseparated(ratings);
        }
        if let Some(reviews) = patch.num_of_reviews {
            set.push("num_of_reviews = ").push_bind_unseparated(reviews);
        }
        if let Some(category) = patch.category {
            set.push("category = ").push_bind_unseparated(category);
        }
    }
    qb.push(" WHERE id = ").push_bind(patch.id);
    qb.push(format!(" RETURNING {}", ROOM_COLUMNS));
    qb
}

async fn lock_room(conn: &mut PgConnection, id: i32) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(&format!(
        "SELECT {} FROM rooms WHERE id = $1 FOR UPDATE",
        ROOM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/* ---------- MUTATIONS ---------- */

// POST /api/postNewRoom
async fn post_new_room(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    payload: Result<Json<NewRoom>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let input = json_body(payload)?;
    input.validate()?;

    // Номер и его изображения пишутся одной транзакцией
    let mut tx = state.db.pool.begin().await?;

    let mut room = insert_query(&input, &user)
        .build_query_as::<Room>()
        .fetch_one(&mut *tx)
        .await?;

    let inserted = insert_images(&mut tx, room.id, &input.images).await?;
    room.images = load_images(&mut *tx, &[room.id]).await?;

    tx.commit().await?;

    state.cache.invalidate_room(room.id).await;
    info!(
        "Room {} created by {} with {} images",
        room.id, user.user_id, inserted
    );

    Ok((StatusCode::CREATED, Json(room)))
}

// POST /api/putUpdateRoom
async fn put_update_room(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    payload: Result<Json<RoomPatch>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let patch = json_body(payload)?;
    patch.validate()?;

    let mut tx = state.db.pool.begin().await?;

    let room = if patch.touches_row() {
        update_query(&patch)
            .build_query_as::<Room>()
            .fetch_optional(&mut *tx)
            .await?
    } else {
        lock_room(&mut tx, patch.id).await?
    };
    let mut room = room.ok_or_else(|| AppError::room_not_found(patch.id))?;

    let inserted = insert_images(&mut tx, room.id, &patch.images).await?;
    room.images = load_images(&mut *tx, &[room.id]).await?;

    tx.commit().await?;

    state.cache.invalidate_room(room.id).await;
    info!(
        "Room {} updated by {} ({} new images)",
        room.id, user.user_id, inserted
    );

    Ok(Json(room))
}

// POST /api/deleteSingleRoom
async fn delete_single_room(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    payload: Result<Json<RoomId>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let RoomId { id } = json_body(payload)?;

    let mut tx = state.db.pool.begin().await?;

    let mut room = lock_room(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::room_not_found(id))?;
    room.images = load_images(&mut *tx, &[id]).await?;

    // изображения удаляются каскадом
    sqlx::query("DELETE FROM rooms WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    state.cache.invalidate_room(id).await;
    info!("Room {} deleted by {}", id, user.user_id);

    Ok(Json(room))
}
