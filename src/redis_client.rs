use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    Client,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Redis-клиент с `ConnectionManager`: соединение открывается при первой
/// команде, а после обрыва менеджер переподключается сам.
#[derive(Clone)]
pub struct RedisClient {
    client: Client,
    conn: Arc<OnceCell<ConnectionManager>>,
}

impl RedisClient {
    pub fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        Ok(RedisClient {
            client,
            conn: Arc::new(OnceCell::new()),
        })
    }

    pub async fn conn(&self) -> redis::RedisResult<ConnectionManager> {
        // Неудачное первое подключение ячейку не заполняет: следующий вызов попробует снова
        let conn = self
            .conn
            .get_or_try_init(|| {
                let config = ConnectionManagerConfig::new().set_number_of_retries(1);
                ConnectionManager::new_with_config(self.client.clone(), config)
            })
            .await?;
        Ok(conn.clone())
    }

    pub async fn ping(&self) -> redis::RedisResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("PING").query_async(&mut conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_client_does_not_connect() {
        let client = RedisClient::new("redis://127.0.0.1:1").unwrap();
        assert!(client.conn.get().is_none());
        assert!(RedisClient::new("not a url").is_err());
    }

    #[tokio::test]
    async fn failed_connect_is_retried_on_next_call() {
        let client = RedisClient::new("redis://127.0.0.1:1").unwrap();
        assert!(client.conn().await.is_err());
        assert!(client.conn.get().is_none());
    }
}
