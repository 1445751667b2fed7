use crate::redis_client::RedisClient;

pub mod auth;
pub mod rooms;

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
}

impl CacheService {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }
}
