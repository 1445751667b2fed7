use crate::cache::CacheService;
use crate::models::Room;
use crate::search_client::RoomSearch;
use redis::AsyncCommands;
use tracing::info;

/// Поколение данных о номерах. Любая мутация увеличивает его, и все
/// ранее записанные страницы выдачи и карточки перестают читаться.
const ROOMS_GENERATION_KEY: &str = "rooms:gen";

pub fn listing_key(generation: i64, search: &RoomSearch) -> String {
    format!("rooms:list:{}:{}", generation, search.cache_key())
}

pub fn room_key(generation: i64, id: i32) -> String {
    format!("rooms:single:{}:{}", generation, id)
}

impl CacheService {
    /// Читается до запроса в БД; результат пишется под этим же поколением.
    pub async fn rooms_generation(&self) -> Result<i64, redis::RedisError> {
        let mut conn = self.redis.conn().await?;
        let generation: Option<i64> = conn.get(ROOMS_GENERATION_KEY).await?;
        Ok(generation.unwrap_or(0))
    }

    /// Закешированная страница выдачи (JSON `[count, rooms]`).
    pub async fn get_cached_listing(
        &self,
        generation: i64,
        search: &RoomSearch,
    ) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.redis.conn().await?;
        conn.get(listing_key(generation, search)).await
    }

    pub async fn cache_listing(
        &self,
        generation: i64,
        search: &RoomSearch,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn().await?;
        conn.set_ex(listing_key(generation, search), value, ttl_seconds).await
    }

    pub async fn get_cached_room(&self, generation: i64, id: i32) -> Result<Option<Room>, redis::RedisError> {
        let mut conn = self.redis.conn().await?;
        let cached: Option<String> = conn.get(room_key(generation, id)).await?;
        Ok(cached.and_then(|json| serde_json::from_str(&json).ok()))
    }

    pub async fn cache_room(&self, generation: i64, room: &Room, ttl_seconds: u64) -> Result<(), redis::RedisError> {
        let Ok(json) = serde_json::to_string(room) else {
            return Ok(());
        };
        let mut conn = self.redis.conn().await?;
        conn.set_ex(room_key(generation, room.id), json, ttl_seconds).await
    }

    /// После любой мутации: новое поколение. Старые записи доживают свой TTL,
    /// но больше не читаются.
    pub async fn invalidate_room(&self, id: i32) {
        let result: Result<i64, redis::RedisError> = async {
            let mut conn = self.redis.conn().await?;
            conn.incr(ROOMS_GENERATION_KEY, 1).await
        }
        .await;

        match result {
            Ok(generation) => info!("Room {} changed, rooms cache generation is now {}", id, generation),
            Err(e) => tracing::warn!("Failed to invalidate cache for room {}: {:?}", id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn listing_keys_carry_generation_and_filters() {
        let search = RoomSearch { category: Some(Category::King), ..Default::default() };
        assert_eq!(
            listing_key(3, &search),
            "rooms:list:3:category=KING&page=1&perPage=5"
        );
        assert_ne!(listing_key(3, &search), listing_key(4, &search));
        assert_eq!(room_key(2, 12), "rooms:single:2:12");
    }

    #[test]
    fn entries_written_before_a_mutation_are_not_read_after_it() {
        let search = RoomSearch::default();
        // чтение началось на поколении 7, затем удаление подняло его до 8
        let read_at = 7;
        let after_delete = read_at + 1;

        assert_ne!(listing_key(read_at, &search), listing_key(after_delete, &search));
        assert_ne!(room_key(read_at, 5), room_key(after_delete, 5));
        assert_eq!(room_key(after_delete, 5), room_key(after_delete, 5));
    }
}
