use inkwell_db::client::ConnectionSettings;
use serde::Deserialize;
use std::{
    fmt::{Debug, Formatter},
    net::{IpAddr, Ipv4Addr},
};
use thiserror::Error;
use tracing::debug;

pub const PRODUCTION_ENV: &str = "production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
}

/// Process configuration, read once at startup from the environment (and a
/// `.env` file, if present).
#[derive(Clone, Eq, PartialEq, Hash, Deserialize)]
pub struct Env {
    #[serde(default = "default_server_address")]
    pub server_address: IpAddr,
    #[serde(default = "default_app_port")]
    pub app_port: u16,
    #[serde(default = "default_app_env")]
    pub app_env: String,

    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_max_lifetime_secs")]
    pub db_max_lifetime_secs: u64,

    pub jwt_secret: String,
    #[serde(default = "default_jwt_ttl_hours")]
    pub jwt_ttl_hours: u32,

    #[serde(default)]
    pub seed_admin: bool,
    #[serde(default = "default_seed_admin_user")]
    pub seed_admin_user: String,
    #[serde(default = "default_seed_admin_email")]
    pub seed_admin_email: String,
    #[serde(default = "default_seed_admin_pass")]
    pub seed_admin_pass: String,
}

fn default_server_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_app_port() -> u16 {
    8080
}

fn default_app_env() -> String {
    "development".to_owned()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_max_connections() -> u32 {
    25
}

fn default_db_min_connections() -> u32 {
    10
}

fn default_db_max_lifetime_secs() -> u64 {
    300
}

fn default_jwt_ttl_hours() -> u32 {
    24
}

fn default_seed_admin_user() -> String {
    "admin".to_owned()
}

fn default_seed_admin_email() -> String {
    "admin@example.com".to_owned()
}

fn default_seed_admin_pass() -> String {
    "admin123".to_owned()
}

/// Settings for the bootstrap admin account.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SeedSettings {
    pub enabled: bool,
    pub production: bool,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Debug for SeedSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedSettings")
            .field("enabled", &self.enabled)
            .field("production", &self.production)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl Env {
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if e.not_found() {
                debug!("No .env file found, using environment variables");
            } else {
                return Err(e.into());
            }
        }

        Ok(envy::from_env()?)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case(PRODUCTION_ENV)
    }

    #[must_use]
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            host: self.db_host.clone(),
            port: self.db_port,
            username: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            max_connections: self.db_max_connections,
            min_connections: self.db_min_connections.min(self.db_max_connections),
            max_lifetime: std::time::Duration::from_secs(self.db_max_lifetime_secs),
        }
    }

    /// Bounds beyond the field's range are checked by
    /// [`TokenIssuer::new`](inkwell_common::model::auth::TokenIssuer::new).
    #[must_use]
    pub fn token_lifetime(&self) -> time::Duration {
        time::Duration::hours(i64::from(self.jwt_ttl_hours))
    }

    #[must_use]
    pub fn seed_settings(&self) -> SeedSettings {
        SeedSettings {
            enabled: self.seed_admin,
            production: self.is_production(),
            username: self.seed_admin_user.clone(),
            email: self.seed_admin_email.clone(),
            password: self.seed_admin_pass.clone(),
        }
    }
}

impl Debug for Env {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("server_address", &self.server_address)
            .field("app_port", &self.app_port)
            .field("app_env", &self.app_env)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_name", &self.db_name)
            .field("jwt_ttl_hours", &self.jwt_ttl_hours)
            .field("seed_admin", &self.seed_admin)
            .finish_non_exhaustive()
    }
}
