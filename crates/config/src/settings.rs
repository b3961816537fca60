use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub admin: AdminSettings,
    pub redemption: RedemptionSettings,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub issuer: String,
}

/// Admin endpoints are guarded by a shared key sent as `x-admin-key`.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminSettings {
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedemptionSettings {
    /// Upper bound on claim attempts when the conditional update loses a race.
    pub max_claim_attempts: u32,
    pub default_buddy_credit: i32,
    pub expiring_soon_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationSettings {
    /// When unset, notifications are only logged.
    pub mail_relay_url: Option<String>,
    pub from_address: String,
    pub queue_capacity: usize,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("BUDDYPERKS"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 5000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "buddyperks")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.refresh_token_ttl_secs", 2592000)?
            .set_default("jwt.issuer", "buddyperks")?
            .set_default("admin.api_key", "change-me-admin-key")?
            .set_default("redemption.max_claim_attempts", 5)?
            .set_default("redemption.default_buddy_credit", 5)?
            .set_default("redemption.expiring_soon_days", 7)?
            .set_default("notifications.mail_relay_url", None::<String>)?
            .set_default("notifications.from_address", "no-reply@buddyperks.local")?
            .set_default("notifications.queue_capacity", 1024)?
            .build()?;

        config.try_deserialize()
    }
}
