use std::sync::Arc;

use crate::{
    config::{Config, StoreBackend},
    database::{MemoryStore, RedisStore, Store},
    rbac::PermissionModel,
};

pub struct AppState {
    pub config: Config,
    pub permissions: PermissionModel,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store: Arc<dyn Store> = match config.store {
            StoreBackend::Redis => Arc::new(RedisStore::connect(&config.redis_url).await),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };

        Self::with_store(config, store)
    }

    /// Assembles state around an explicit store; used by tests and any
    /// caller that wants to skip `Config::load`.
    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Arc<Self> {
        Arc::new(Self {
            config,
            permissions: PermissionModel::new(),
            store,
        })
    }
}
