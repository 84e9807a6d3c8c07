use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::store::credentials::PasswordScheme;
use crate::store::{DEFAULT_DELAY, DEFAULT_NAMESPACE};

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// redb file; the store runs in memory when unset.
    pub data_path: Option<PathBuf>,
    pub namespace: String,
    pub network_delay: Duration,
    pub password_scheme: PasswordScheme,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = StoreConfig {
            data_path: std::env::var("DATA_PATH").ok().map(PathBuf::from),
            namespace: std::env::var("STORE_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.into()),
            network_delay: std::env::var("NETWORK_DELAY_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_DELAY),
            password_scheme: match std::env::var("PASSWORD_SCHEME") {
                Ok(v) => PasswordScheme::parse(&v)?,
                Err(_) => PasswordScheme::Argon2,
            },
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "tallypro".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "tallypro-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        Ok(Self { store, jwt })
    }
}
