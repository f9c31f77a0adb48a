pub mod cache;
pub mod file_store;
pub mod repository;
pub mod traits;

pub use cache::{CachePartition, CacheStore, CACHE_TTL};
pub use file_store::FileStore;
pub use repository::{
    CatalogRepository, ConteRepository, ContentRepository, DevinetteRepository, RepositoryStats,
    RiddleRepository,
};
pub use traits::{KeyValueStore, MemoryStore};
