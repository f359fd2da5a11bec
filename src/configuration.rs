use crate::services::DEFAULT_DEVICE_TYPES;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub app_port: u16,
    pub app_host: String,
    /// Identity-service endpoint returning the user behind a bearer token.
    pub auth_url: String,
    pub access: AccessSettings,
    pub validation: ValidationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessSettings {
    /// Roles that see every tenant.
    pub admin_roles: Vec<String>,
    pub user_cache_ttl_secs: u64,
    pub permission_cache_ttl_secs: u64,
}

impl AccessSettings {
    pub fn user_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.user_cache_ttl_secs)
    }

    pub fn permission_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.permission_cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationSettings {
    pub device_types: Vec<String>,
}

impl DatabaseSettings {
    // postgresql://<username>:<password>@<host>:<port>/<database_name>
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name,
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port,
        )
    }
}

/// Defaults, then `configuration.yaml` if present, then `FLEETCONF__*`
/// environment variables (e.g. `FLEETCONF__DATABASE__HOST`).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    dotenvy::dotenv().ok();

    let device_types: Vec<String> = DEFAULT_DEVICE_TYPES.iter().map(|t| t.to_string()).collect();

    config::Config::builder()
        .set_default("app_host", "127.0.0.1")?
        .set_default("app_port", 8000)?
        .set_default("auth_url", "http://127.0.0.1:4000/me")?
        .set_default("database.host", "127.0.0.1")?
        .set_default("database.port", 5432)?
        .set_default("database.username", "postgres")?
        .set_default("database.password", "postgres")?
        .set_default("database.database_name", "fleetconf")?
        .set_default("database.max_connections", 5)?
        .set_default("access.admin_roles", vec!["group_admin".to_string()])?
        .set_default("access.user_cache_ttl_secs", 60)?
        .set_default("access.permission_cache_ttl_secs", 60)?
        .set_default("validation.device_types", device_types)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("FLEETCONF")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("access.admin_roles")
                .with_list_parse_key("validation.device_types")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
