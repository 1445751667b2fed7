use crate::cache::CacheService;
use crate::middleware::SessionUser;
use redis::AsyncCommands;
use tracing::info;

fn session_key(token_hash: &str) -> String {
    format!("session:{}", token_hash)
}

impl CacheService {
    /// Сохранить пользователя сессии в кеш
    pub async fn cache_session(
        &self,
        token_hash: &str,
        user: &SessionUser,
        ttl_seconds: u64,
    ) -> Result<(), redis::RedisError> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let Ok(user_data) = serde_json::to_string(user) else {
            return Ok(());
        };
        let mut conn = self.redis.conn().await?;
        conn.set_ex(session_key(token_hash), user_data, ttl_seconds).await
    }

    /// Получить пользователя сессии из кеша
    pub async fn get_cached_session(&self, token_hash: &str) -> Result<Option<SessionUser>, redis::RedisError> {
        let mut conn = self.redis.conn().await?;
        let cached: Option<String> = conn.get(session_key(token_hash)).await?;
        Ok(cached.and_then(|json| serde_json::from_str(&json).ok()))
    }

    /// Инвалидировать конкретную сессию (для logout)
    pub async fn invalidate_session(&self, token_hash: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn().await?;
        let _: () = conn.del(session_key(token_hash)).await?;
        info!("Invalidated cached session");
        Ok(())
    }
}
