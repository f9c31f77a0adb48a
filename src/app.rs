//! Startup wiring: the dependency graph is built once, from explicit
//! constructor parameters, and handed to whoever needs it.

use std::sync::Arc;

use tracing::info;

use crate::catalog::{CatalogItem, Conte, Devinette, HttpRemoteSource, RemoteSource};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::storage::{
    CacheStore, ConteRepository, DevinetteRepository, FileStore, KeyValueStore, MemoryStore,
};

pub struct App {
    pub contes: Arc<ConteRepository>,
    pub devinettes: Arc<DevinetteRepository>,
}

impl App {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        conte_remote: Arc<dyn RemoteSource<Conte>>,
        devinette_remote: Arc<dyn RemoteSource<Devinette>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            contes: Arc::new(ConteRepository::new(
                conte_remote,
                Arc::new(CacheStore::with_clock(backend.clone(), clock.clone())),
            )),
            devinettes: Arc::new(DevinetteRepository::new(
                devinette_remote,
                Arc::new(CacheStore::with_clock(backend, clock)),
            )),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let backend: Arc<dyn KeyValueStore> = if config.cache.in_memory {
            info!("Using in-memory cache");
            Arc::new(MemoryStore::new())
        } else {
            let dir = config.resolved_cache_dir()?;
            info!("Using cache directory {}", dir.display());
            Arc::new(FileStore::new(dir)?)
        };

        Ok(Self::new(
            backend,
            remote_for::<Conte>(config)?,
            remote_for::<Devinette>(config)?,
            Arc::new(SystemClock),
        ))
    }
}

fn remote_for<T: CatalogItem>(config: &Config) -> Result<Arc<dyn RemoteSource<T>>> {
    Ok(Arc::new(HttpRemoteSource::<T>::from_config(&config.api)?))
}
