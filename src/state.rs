use crate::auth::reset::ResetCodes;
use crate::config::AppConfig;
use crate::storage::{KvStore, MemoryStore, RedbStore};
use crate::store::{RecordStore, StoreOptions};
use anyhow::Context;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub config: Arc<AppConfig>,
    pub reset_codes: Arc<ResetCodes>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let kv = match &config.store.data_path {
            Some(path) => Arc::new(
                RedbStore::open(path).with_context(|| format!("open {}", path.display()))?,
            ) as Arc<dyn KvStore>,
            None => {
                warn!("DATA_PATH not set; records will not survive a restart");
                Arc::new(MemoryStore::new()) as Arc<dyn KvStore>
            }
        };

        let store = RecordStore::open(
            kv,
            StoreOptions {
                namespace: config.store.namespace.clone(),
                latency: crate::store::latency::Latency::new(config.store.network_delay),
                scheme: config.store.password_scheme,
            },
        )
        .context("open record store")?;

        Ok(Self::from_parts(Arc::new(store), config))
    }

    pub fn from_parts(store: Arc<RecordStore>, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            config,
            reset_codes: Arc::new(ResetCodes::default()),
        }
    }

    /// In-memory, zero-latency state with plaintext credentials.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{JwtConfig, StoreConfig};
        use crate::store::{credentials::PasswordScheme, latency::Latency};
        use std::time::Duration;

        let config = Arc::new(AppConfig {
            store: StoreConfig {
                data_path: None,
                namespace: "test".into(),
                network_delay: Duration::ZERO,
                password_scheme: PasswordScheme::Plain,
            },
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
        });

        let store = RecordStore::open(
            Arc::new(MemoryStore::new()),
            StoreOptions {
                namespace: config.store.namespace.clone(),
                latency: Latency::none(),
                scheme: PasswordScheme::Plain,
            },
        )
        .expect("in-memory store opens");

        Self::from_parts(Arc::new(store), config)
    }
}
