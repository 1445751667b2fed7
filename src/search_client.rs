use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::coerce;
use crate::models::room::{finite, ROOM_COLUMNS};
use crate::models::{Category, Feature, Room, RoomImage};

/// Размеры страницы: компактная выдача и сетка.
pub const PAGE_SIZES: [u32; 2] = [5, 10];
pub const DEFAULT_PER_PAGE: u32 = 5;

/// Фильтры выдачи номеров и номер страницы.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "price_range_is_ordered"))]
pub struct RoomSearch {
    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0), custom(function = "finite"))]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0), custom(function = "finite"))]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub min_beds: Option<i32>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub min_guests: Option<i32>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 5.0), custom(function = "finite"))]
    pub min_rating: Option<f64>,
    #[serde(default, deserialize_with = "coerce::optional_from_str", skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(
        default,
        deserialize_with = "coerce::comma_list",
        serialize_with = "coerce::serialize_comma_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub features: Vec<Feature>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "page_size_allowed"))]
    pub per_page: Option<u32>,
}

fn price_range_is_ordered(search: &RoomSearch) -> Result<(), ValidationError> {
    match (search.min_price, search.max_price) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("price_range")),
        _ => Ok(()),
    }
}

fn page_size_allowed(per_page: u32) -> Result<(), ValidationError> {
    if PAGE_SIZES.contains(&per_page) {
        Ok(())
    } else {
        Err(ValidationError::new("page_size"))
    }
}

/// Страница выдачи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub per_page: u32,
}

impl Page {
    pub fn new(number: u32, per_page: u32) -> Self {
        Self { number: number.max(1), per_page: per_page.max(1) }
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn offset(&self) -> i64 {
        (self.number as i64 - 1) * self.per_page as i64
    }

    /// `ceil(count / per_page)`
    pub fn total_pages(&self, count: i64) -> i64 {
        if count <= 0 {
            return 0;
        }
        let per_page = self.per_page as i64;
        (count + per_page - 1) / per_page
    }

    pub fn has_next(&self, count: i64) -> bool {
        count - self.per_page as i64 * self.number as i64 > 0
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }
}

impl RoomSearch {
    pub fn page(&self) -> Page {
        Page::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page.max(1));
        self
    }

    pub fn is_filtered(&self) -> bool {
        self.cleared() != self.clone().with_page(1)
    }

    /// Без фильтров, первая страница; размер страницы сохраняется.
    pub fn cleared(&self) -> Self {
        RoomSearch {
            page: Some(1),
            per_page: self.per_page,
            ..Default::default()
        }
    }

    /// Каноническая строка запроса: ключ кеша выдачи.
    pub fn cache_key(&self) -> String {
        let mut normalized = self.clone();
        let page = normalized.page();
        normalized.page = Some(page.number);
        normalized.per_page = Some(page.per_page);
        normalized.features.sort_by_key(|f| f.as_str());
        normalized.features.dedup();
        serde_urlencoded::to_string(&normalized).unwrap_or_default()
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(name) = &self.name {
            qb.push(" AND name ILIKE ").push_bind(like_pattern(name));
        }
        if let Some(address) = &self.address {
            qb.push(" AND address ILIKE ").push_bind(like_pattern(address));
        }
        if let Some(min) = self.min_price {
            qb.push(" AND price_per_night >= ").push_bind(min);
        }
        if let Some(max) = self.max_price {
            qb.push(" AND price_per_night <= ").push_bind(max);
        }
        if let Some(beds) = self.min_beds {
            qb.push(" AND num_of_beds >= ").push_bind(beds);
        }
        if let Some(guests) = self.min_guests {
            qb.push(" AND guest_capacity >= ").push_bind(guests);
        }
        if let Some(rating) = self.min_rating {
            qb.push(" AND ratings >= ").push_bind(rating);
        }
        if let Some(category) = self.category {
            qb.push(" AND category = ").push_bind(category);
        }
        for feature in &self.features {
            // имя колонки берётся из закрытого перечисления
            qb.push(format!(" AND {} = TRUE", feature.column()));
        }
    }

    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM rooms");
        self.push_conditions(&mut qb);
        qb
    }

    pub fn page_query(&self) -> QueryBuilder<'static, Postgres> {
        let page = self.page();
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM rooms", ROOM_COLUMNS));
        self.push_conditions(&mut qb);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        qb
    }
}

/// `%value%` с экранированием спецсимволов LIKE.
fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Раскладывает изображения по номерам, сохраняя их порядок.
pub fn attach_images(rooms: &mut [Room], images: Vec<RoomImage>) {
    let mut by_room: HashMap<i32, Vec<RoomImage>> = HashMap::new();
    for image in images {
        by_room.entry(image.room_id).or_default().push(image);
    }
    for room in rooms.iter_mut() {
        room.images = by_room.remove(&room.id).unwrap_or_default();
    }
}

pub async fn load_images<'e, E>(executor: E, room_ids: &[i32]) -> Result<Vec<RoomImage>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    if room_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, RoomImage>(
        "SELECT id, url, public_id, room_id FROM room_images WHERE room_id = ANY($1) ORDER BY id"
    )
    .bind(room_ids)
    .fetch_all(executor)
    .await
}

/// Клиент для поиска номеров
#[derive(Clone)]
pub struct RoomSearchClient {
    pool: PgPool,
}

impl RoomSearchClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Общее число подходящих номеров и запрошенная страница.
    pub async fn search(&self, search: &RoomSearch) -> Result<(i64, Vec<Room>), sqlx::Error> {
        let mut count_query = search.count_query();
        let mut page_query = search.page_query();

        let (count, mut rooms) = futures::try_join!(
            count_query.build_query_scalar::<i64>().fetch_one(&self.pool),
            page_query.build_query_as::<Room>().fetch_all(&self.pool),
        )?;

        let ids: Vec<i32> = rooms.iter().map(|r| r.id).collect();
        let images = load_images(&self.pool, &ids).await?;
        attach_images(&mut rooms, images);

        debug!("room search matched {} rows, returning {}", count, rooms.len());
        Ok((count, rooms))
    }

    pub async fn find(&self, id: i32) -> Result<Option<Room>, sqlx::Error> {
        find_room(&self.pool, id).await
    }
}

pub async fn find_room<'e, E>(executor: E, id: i32) -> Result<Option<Room>, sqlx::Error>
where
    E: PgExecutor<'e> + Copy,
{
    let room = sqlx::query_as::<_, Room>(&format!("SELECT {} FROM rooms WHERE id = $1", ROOM_COLUMNS))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    match room {
        Some(mut room) => {
            room.images = load_images(executor, &[room.id]).await?;
            Ok(Some(room))
        }
        None => Ok(None),
    }
}
