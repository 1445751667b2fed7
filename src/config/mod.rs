use config::{ConfigError, Environment, Map};
use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub listing: ListingConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `pretty` или `json`
    pub log_format: String,
    pub cors_origin: Option<String>,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Настройки сессий
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    pub cookie_name: String,
    /// Сколько пользователь сессии живёт в Redis; не дольше самой сессии.
    pub cache_ttl_seconds: u64,
}

// Настройки выдачи объявлений
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    pub cache_ttl_seconds: u64,
}

/// Плоские имена переменных, принимаемые наряду с `STAYS__SECTION__KEY`.
const FLAT_VARS: &[(&str, &str)] = &[
    ("HOST", "app.host"),
    ("PORT", "app.port"),
    ("ENVIRONMENT", "app.environment"),
    ("RUST_LOG", "app.rust_log"),
    ("LOG_FORMAT", "app.log_format"),
    ("CORS_ORIGIN", "app.cors_origin"),
    ("DATABASE_URL", "database.url"),
    ("DB_POOL_SIZE", "database.pool_size"),
    ("REDIS_URL", "redis.url"),
    ("SESSION_TTL_HOURS", "session.ttl_hours"),
    ("SESSION_COOKIE_NAME", "session.cookie_name"),
    ("SESSION_CACHE_TTL_SECONDS", "session.cache_ttl_seconds"),
    ("LISTING_CACHE_TTL_SECONDS", "listing.cache_ttl_seconds"),
];

/// Один год.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars().collect())
    }

    /// Собирает конфигурацию из переданного набора переменных окружения.
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "stays=debug,tower_http=debug")?
            .set_default("app.log_format", "pretty")?
            .set_default("database.pool_size", 20)?
            .set_default("session.ttl_hours", 24 * 30)?
            .set_default("session.cookie_name", "stays_session")?
            .set_default("session.cache_ttl_seconds", 300)?
            .set_default("listing.cache_ttl_seconds", 60)?
            .add_source(
                Environment::with_prefix("STAYS")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        for (var, key) in FLAT_VARS {
            builder = builder.set_override_option(*key, vars.get(*var).cloned())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session.ttl_hours) {
            return Err(ConfigError::Message(format!(
                "session.ttl_hours must be between 1 and {}, got {}",
                MAX_SESSION_TTL_HOURS, self.session.ttl_hours
            )));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }
}
