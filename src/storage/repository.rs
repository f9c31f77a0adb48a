use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::catalog::{
    partition_by_premium, CatalogItem, Conte, Devinette, DevinetteAnswer, Difficulty, RemoteSource,
};
use crate::catalog::devinette::normalize_answer;
use crate::outcome::{Failure, Outcome};
use crate::storage::cache::CacheStore;

/// Result-returning access to one catalog collection.
///
/// `get_all` and `get_by_id` are cache-first: a fresh cached value is returned
/// without touching the network. On a miss the remote source is queried and
/// its answer written back to the cache on a best-effort basis.
#[async_trait]
pub trait CatalogRepository<T: CatalogItem>: Send + Sync {
    async fn get_all(&self) -> Outcome<Vec<T>>;

    async fn get_by_id(&self, id: &str) -> Outcome<T>;

    /// Always remote
    async fn search(&self, query: &str) -> Outcome<Vec<T>>;

    /// Always remote
    async fn get_by_category(&self, category: &str) -> Outcome<Vec<T>>;

    /// Fetch one item remotely and pin it in the cache for offline use.
    /// Unlike write-back, a cache failure here is reported.
    async fn download(&self, id: &str) -> Outcome<()>;

    async fn get_free(&self) -> Outcome<Vec<T>>;

    async fn get_premium(&self) -> Outcome<Vec<T>>;

    async fn clear_cache(&self) -> Outcome<()>;
}

/// Riddle-only views layered on the cache-first reads.
#[async_trait]
pub trait RiddleRepository: CatalogRepository<Devinette> {
    async fn get_by_difficulty(&self, difficulty: Difficulty) -> Outcome<Vec<Devinette>>;

    async fn get_hint(&self, id: &str, index: usize) -> Outcome<String>;

    async fn check_answer(&self, id: &str, answer: &str) -> Outcome<DevinetteAnswer>;
}

/// Counters describing how reads were served.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub remote_fetches: u64,
    pub remote_failures: u64,
    pub write_back_failures: u64,
}

impl RepositoryStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

pub struct ContentRepository<T> {
    remote: Arc<dyn RemoteSource<T>>,
    cache: Arc<CacheStore<T>>,
    stats: RwLock<RepositoryStats>,
}

pub type ConteRepository = ContentRepository<Conte>;
pub type DevinetteRepository = ContentRepository<Devinette>;

impl<T: CatalogItem> ContentRepository<T> {
    pub fn new(remote: Arc<dyn RemoteSource<T>>, cache: Arc<CacheStore<T>>) -> Self {
        Self {
            remote,
            cache,
            stats: RwLock::new(RepositoryStats::default()),
        }
    }

    pub fn stats(&self) -> RepositoryStats {
        self.stats.read().clone()
    }

    fn record_hit(&self) {
        self.stats.write().cache_hits += 1;
    }

    fn record_miss(&self) {
        self.stats.write().cache_misses += 1;
    }

    fn record_remote(&self, ok: bool) {
        let mut stats = self.stats.write();
        stats.remote_fetches += 1;
        if !ok {
            stats.remote_failures += 1;
        }
    }

    fn record_write_back_failure(&self) {
        self.stats.write().write_back_failures += 1;
    }

    async fn fetch_remote<V, F>(&self, request: F) -> Outcome<V>
    where
        F: std::future::Future<Output = crate::error::Result<V>> + Send,
        V: Send,
    {
        let result = request.await;
        self.record_remote(result.is_ok());
        result.map_err(|e| {
            warn!(collection = T::COLLECTION, error = %e, "Remote request failed");
            Failure::from_remote(&e)
        })
    }
}

#[async_trait]
impl<T: CatalogItem> CatalogRepository<T> for ContentRepository<T> {
    async fn get_all(&self) -> Outcome<Vec<T>> {
        match self.cache.read_all().await {
            Ok(items) => {
                self.record_hit();
                return Ok(items);
            }
            Err(e) => {
                self.record_miss();
                debug!(collection = T::COLLECTION, reason = %e, "Cache miss, falling back to remote");
            }
        }

        let items = self.fetch_remote(self.remote.get_all()).await?;

        if let Err(e) = self.cache.write_all(items.clone()).await {
            self.record_write_back_failure();
            warn!(collection = T::COLLECTION, error = %e, "Cache write-back failed");
        }

        Ok(items)
    }

    async fn get_by_id(&self, id: &str) -> Outcome<T> {
        match self.cache.read_by_id(id).await {
            Ok(item) => {
                self.record_hit();
                return Ok(item);
            }
            Err(e) => {
                self.record_miss();
                debug!(collection = T::COLLECTION, id, reason = %e, "Cache miss, falling back to remote");
            }
        }

        let item = self.fetch_remote(self.remote.get_by_id(id)).await?;

        if let Err(e) = self.cache.upsert_one(item.clone()).await {
            self.record_write_back_failure();
            warn!(collection = T::COLLECTION, id, error = %e, "Cache write-back failed");
        }

        Ok(item)
    }

    async fn search(&self, query: &str) -> Outcome<Vec<T>> {
        self.fetch_remote(self.remote.search(query)).await
    }

    async fn get_by_category(&self, category: &str) -> Outcome<Vec<T>> {
        self.fetch_remote(self.remote.get_by_category(category)).await
    }

    async fn download(&self, id: &str) -> Outcome<()> {
        let item = self.fetch_remote(self.remote.get_by_id(id)).await?;
        self.cache.upsert_one(item).await.map_err(|e| {
            warn!(collection = T::COLLECTION, id, error = %e, "Download could not be cached");
            Failure::from_store(&e)
        })
    }

    async fn get_free(&self) -> Outcome<Vec<T>> {
        let (free, _) = partition_by_premium(self.get_all().await?);
        Ok(free)
    }

    async fn get_premium(&self) -> Outcome<Vec<T>> {
        let (_, premium) = partition_by_premium(self.get_all().await?);
        Ok(premium)
    }

    async fn clear_cache(&self) -> Outcome<()> {
        self.cache.clear().await.map_err(|e| Failure::from_store(&e))
    }
}

#[async_trait]
impl RiddleRepository for ContentRepository<Devinette> {
    async fn get_by_difficulty(&self, difficulty: Difficulty) -> Outcome<Vec<Devinette>> {
        let mut riddles = self.get_all().await?;
        riddles.retain(|d| d.difficulty == difficulty);
        Ok(riddles)
    }

    async fn get_hint(&self, id: &str, index: usize) -> Outcome<String> {
        let riddle = self.get_by_id(id).await?;
        riddle.hint(index).map(str::to_string).ok_or_else(|| {
            Failure::validation(format!(
                "Indice {} indisponible pour la devinette {} ({} indice(s))",
                index,
                id,
                riddle.hints.len()
            ))
        })
    }

    async fn check_answer(&self, id: &str, answer: &str) -> Outcome<DevinetteAnswer> {
        if normalize_answer(answer).is_empty() {
            return Err(Failure::validation("La réponse ne peut pas être vide"));
        }
        let riddle = self.get_by_id(id).await?;
        Ok(DevinetteAnswer::evaluate(&riddle, answer, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{conte, devinette};
    use crate::clock::ManualClock;
    use crate::error::{Error, Result};
    use crate::outcome::FailureKind;
    use crate::storage::cache::CACHE_TTL;
    use crate::storage::traits::{KeyValueStore, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const T0: i64 = 1_709_283_600_000;

    /// In-memory remote with a call counter; `None` for a list means "fail".
    struct FakeRemote<T> {
        items: Option<Vec<T>>,
        error: fn() -> Error,
        calls: AtomicUsize,
    }

    impl<T: CatalogItem> FakeRemote<T> {
        fn serving(items: Vec<T>) -> Self {
            Self { items: Some(items), error: || Error::Network("unused".to_string()), calls: AtomicUsize::new(0) }
        }

        fn failing(error: fn() -> Error) -> Self {
            Self { items: None, error, calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn respond(&self) -> Result<Vec<T>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.items.clone().ok_or_else(self.error)
        }
    }

    #[async_trait]
    impl<T: CatalogItem> RemoteSource<T> for FakeRemote<T> {
        async fn get_all(&self) -> Result<Vec<T>> {
            self.respond()
        }

        async fn get_by_id(&self, id: &str) -> Result<T> {
            self.respond()?
                .into_iter()
                .find(|item| item.id() == id)
                .ok_or_else(|| Error::Server { status: 404, reason: "Not Found".to_string() })
        }

        async fn search(&self, _query: &str) -> Result<Vec<T>> {
            self.respond()
        }

        async fn get_by_category(&self, _category: &str) -> Result<Vec<T>> {
            self.respond()
        }
    }

    /// Backend that accepts reads but fails every write.
    #[derive(Default)]
    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, _key: &str, _value: String) -> Result<()> {
            Err(Error::Cache("quota exceeded".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Err(Error::Cache("storage locked".to_string()))
        }
    }

    struct Harness<T> {
        repo: ContentRepository<T>,
        remote: Arc<FakeRemote<T>>,
        cache: Arc<CacheStore<T>>,
        clock: Arc<ManualClock>,
    }

    fn harness<T: CatalogItem>(remote: FakeRemote<T>, backend: Arc<dyn KeyValueStore>) -> Harness<T> {
        let clock = Arc::new(ManualClock::new(T0));
        let cache = Arc::new(CacheStore::with_clock(backend, clock.clone()));
        let remote = Arc::new(remote);
        let repo = ContentRepository::new(remote.clone(), cache.clone());
        Harness { repo, remote, cache, clock }
    }

    fn ids<T: CatalogItem>(items: &[T]) -> Vec<&str> {
        items.iter().map(|item| item.id()).collect()
    }

    #[tokio::test]
    async fn test_cache_hit_skips_remote() {
        let h = harness(
            FakeRemote::<Conte>::failing(|| Error::Network("must not be called".to_string())),
            Arc::new(MemoryStore::new()),
        );
        h.cache.write_all(vec![conte("a", false), conte("b", true)]).await.unwrap();

        assert_eq!(ids(&h.repo.get_all().await.unwrap()), vec!["a", "b"]);
        assert_eq!(h.repo.get_by_id("b").await.unwrap().id, "b");
        assert_eq!(h.remote.calls(), 0);
        assert_eq!(h.repo.stats().cache_hits, 2);
        assert_eq!(h.repo.stats().hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(RepositoryStats::default().hit_rate(), 0.0);
        let stats = RepositoryStats { cache_hits: 3, cache_misses: 1, ..Default::default() };
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[tokio::test]
    async fn test_miss_falls_back_and_writes_back() {
        let h = harness(
            FakeRemote::serving(vec![conte("a", false), conte("b", false)]),
            Arc::new(MemoryStore::new()),
        );

        assert_eq!(ids(&h.repo.get_all().await.unwrap()), vec!["a", "b"]);
        assert_eq!(ids(&h.cache.read_all().await.unwrap()), vec!["a", "b"]);

        // Second read is served from the cache.
        h.repo.get_all().await.unwrap();
        assert_eq!(h.remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_cache_triggers_remote() {
        let h = harness(FakeRemote::serving(vec![conte("fresh", false)]), Arc::new(MemoryStore::new()));
        h.cache.write_all(vec![conte("stale", false)]).await.unwrap();

        h.clock.advance(CACHE_TTL.as_millis() as i64 - 1);
        assert_eq!(ids(&h.repo.get_all().await.unwrap()), vec!["stale"]);

        h.clock.advance(1);
        assert_eq!(ids(&h.repo.get_all().await.unwrap()), vec!["fresh"]);
        assert_eq!(h.remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_miss_upserts_into_cache() {
        let h = harness(FakeRemote::serving(vec![conte("x", true)]), Arc::new(MemoryStore::new()));
        h.cache.write_all(vec![conte("a", false)]).await.unwrap();

        assert_eq!(h.repo.get_by_id("x").await.unwrap().id, "x");
        assert_eq!(ids(&h.cache.read_all().await.unwrap()), vec!["a", "x"]);
    }

    #[tokio::test]
    async fn test_write_back_failure_is_swallowed() {
        let h = harness(
            FakeRemote::serving(vec![conte("a", false), conte("b", true)]),
            Arc::new(ReadOnlyStore::default()),
        );

        assert_eq!(ids(&h.repo.get_all().await.unwrap()), vec!["a", "b"]);
        assert_eq!(h.repo.get_by_id("b").await.unwrap().id, "b");
        assert_eq!(h.repo.stats().write_back_failures, 2);
    }

    #[tokio::test]
    async fn test_download_surfaces_cache_failure() {
        let h = harness(FakeRemote::serving(vec![conte("x", false)]), Arc::new(ReadOnlyStore::default()));

        let failure = h.repo.download("x").await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Cache);
        // Backend detail ("quota exceeded") stays in the logs.
        assert_eq!(failure.message(), "Erreur lors de la mise en cache");

        let failure = h.repo.clear_cache().await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Cache);
        assert_eq!(failure.message(), "Erreur lors de la suppression du cache");
    }

    #[tokio::test]
    async fn test_download_bypasses_fresh_cache() {
        let h = harness(FakeRemote::serving(vec![conte("a", true)]), Arc::new(MemoryStore::new()));
        h.cache.write_all(vec![conte("a", false)]).await.unwrap();

        h.repo.download("a").await.unwrap();
        assert_eq!(h.remote.calls(), 1);
        assert!(h.cache.read_by_id("a").await.unwrap().is_premium);
    }

    #[tokio::test]
    async fn test_remote_failure_mapping() {
        let h = harness(
            FakeRemote::<Conte>::failing(|| Error::Server { status: 500, reason: "Internal Server Error".to_string() }),
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(h.repo.get_all().await.unwrap_err().kind(), FailureKind::Server);

        let h = harness(
            FakeRemote::<Conte>::failing(|| Error::Network("Impossible de récupérer les contes".to_string())),
            Arc::new(MemoryStore::new()),
        );
        let failure = h.repo.search("lièvre").await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Network);
        assert_eq!(failure.message(), "Impossible de récupérer les contes");

        let h = harness(
            FakeRemote::<Conte>::failing(|| Error::Invalid("weird".to_string())),
            Arc::new(MemoryStore::new()),
        );
        let failure = h.repo.get_by_category("Peur").await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Server);
        assert_eq!(failure.message(), "Erreur inconnue");
    }

    #[tokio::test]
    async fn test_free_and_premium_views() {
        let h = harness(
            FakeRemote::<Conte>::failing(|| Error::Network("offline".to_string())),
            Arc::new(MemoryStore::new()),
        );
        h.cache
            .write_all(vec![conte("a", false), conte("b", true), conte("c", false), conte("d", true)])
            .await
            .unwrap();

        assert_eq!(ids(&h.repo.get_free().await.unwrap()), vec!["a", "c"]);
        assert_eq!(ids(&h.repo.get_premium().await.unwrap()), vec!["b", "d"]);
    }

    #[tokio::test]
    async fn test_derived_views_inherit_failures() {
        let h = harness(
            FakeRemote::<Conte>::failing(|| Error::Network("offline".to_string())),
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(h.repo.get_free().await.unwrap_err().kind(), FailureKind::Network);
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let h = harness(FakeRemote::serving(vec![conte("a", false)]), Arc::new(MemoryStore::new()));
        h.repo.get_all().await.unwrap();
        h.repo.clear_cache().await.unwrap();
        assert!(h.cache.read_all().await.is_err());

        let h = harness(FakeRemote::<Conte>::serving(vec![]), Arc::new(ReadOnlyStore::default()));
        assert_eq!(h.repo.clear_cache().await.unwrap_err().kind(), FailureKind::Cache);
    }

    #[tokio::test]
    async fn test_riddle_views() {
        let h = harness(
            FakeRemote::serving(vec![
                devinette("d1", Difficulty::Facile, &["Elle sert à coudre"]),
                devinette("d2", Difficulty::Difficile, &[]),
            ]),
            Arc::new(MemoryStore::new()),
        );

        let hard = h.repo.get_by_difficulty(Difficulty::Difficile).await.unwrap();
        assert_eq!(ids(&hard), vec!["d2"]);

        assert_eq!(h.repo.get_hint("d1", 0).await.unwrap(), "Elle sert à coudre");
        assert_eq!(h.repo.get_hint("d1", 1).await.unwrap_err().kind(), FailureKind::Validation);
        assert_eq!(h.repo.get_hint("d2", 0).await.unwrap_err().kind(), FailureKind::Validation);

        let answer = h.repo.check_answer("d1", "l'aiguille").await.unwrap();
        assert!(answer.is_correct);
        assert_eq!(answer.points_earned, 10);

        assert_eq!(h.repo.check_answer("d1", "  ").await.unwrap_err().kind(), FailureKind::Validation);
        assert_eq!(h.remote.calls(), 1);
    }
}
