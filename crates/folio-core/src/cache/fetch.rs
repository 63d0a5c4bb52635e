//! Stale-while-revalidate wrapper around a remote fetch.
//!
//! A `CachedResource` serves a fresh cache entry immediately and refreshes
//! it in a detached task; results of that task come back over an mpsc
//! channel and are applied when the owner calls `poll_updates` or
//! `settle`. Without a fresh entry it fetches in the foreground.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::store::CacheStore;
use crate::api::ApiError;

/// A remote read of one whole resource.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    type Output: Serialize + DeserializeOwned + Send + 'static;

    async fn fetch(&self) -> anyhow::Result<Self::Output>;
}

/// Reason a foreground fetch failed, kept in resource state for display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    message: String,
    not_found: bool,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            not_found: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The backend answered, but the resource has no rows.
    pub fn is_not_found(&self) -> bool {
        self.not_found
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(e: anyhow::Error) -> Self {
        let not_found = e
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<ApiError>(), Some(ApiError::NotFound(_))));
        Self {
            message: format!("{:#}", e),
            not_found,
        }
    }
}

/// What a consumer renders from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<FetchError>,
}

/// Hook for a single cached resource.
pub struct CachedResource<T> {
    key: String,
    store: Arc<CacheStore>,
    fetcher: Arc<dyn Fetch<Output = T>>,
    state: ResourceState<T>,
    updates_tx: mpsc::UnboundedSender<T>,
    updates_rx: mpsc::UnboundedReceiver<T>,
    refresh_task: Option<JoinHandle<()>>,
}

impl<T> CachedResource<T>
where
    T: Serialize + DeserializeOwned + Default + Send + 'static,
{
    pub fn new(
        key: impl Into<String>,
        store: Arc<CacheStore>,
        fetcher: Arc<dyn Fetch<Output = T>>,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            key: key.into(),
            store,
            fetcher,
            state: ResourceState::default(),
            updates_tx,
            updates_rx,
            refresh_task: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &ResourceState<T> {
        &self.state
    }

    pub fn data(&self) -> &T {
        &self.state.data
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.state.error.as_ref()
    }

    /// Load the resource: cached data right away with a background refresh,
    /// or a blocking fetch when nothing fresh is cached.
    pub async fn fetch(&mut self) {
        match self.store.get::<T>(&self.key) {
            Some(cached) => {
                debug!(cache = %self.key, "Serving cached data, refreshing in background");
                self.state.data = cached;
                self.state.loading = false;
                self.state.error = None;
                self.spawn_refresh();
            }
            None => self.fetch_cold().await,
        }
    }

    /// Fetch from the backend regardless of what is cached.
    pub async fn refetch(&mut self) {
        self.fetch_cold().await;
    }

    async fn fetch_cold(&mut self) {
        self.state.loading = true;

        let fetcher = Arc::clone(&self.fetcher);
        // Run on its own task so a panicking fetch surfaces as an error
        let result = match tokio::spawn(async move { fetcher.fetch().await }).await {
            Ok(result) => result.map_err(FetchError::from),
            Err(e) => Err(FetchError::new(format!("fetch task failed: {}", e))),
        };

        match result {
            Ok(data) => {
                info!(cache = %self.key, "Fetched from backend");
                self.store.set(&self.key, &data);
                self.state.data = data;
                self.state.error = None;
            }
            Err(e) => {
                warn!(cache = %self.key, error = %e, "Fetch failed");
                self.state.error = Some(e);
            }
        }

        self.state.loading = false;
    }

    fn spawn_refresh(&mut self) {
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        let tx = self.updates_tx.clone();

        let handle = tokio::spawn(async move {
            match fetcher.fetch().await {
                Ok(data) => {
                    store.set(&key, &data);
                    if tx.send(data).is_err() {
                        debug!(cache = %key, "Resource dropped before background refresh landed");
                    }
                }
                Err(e) => {
                    warn!(cache = %key, error = %format!("{:#}", e), "Background refresh failed, keeping cached data");
                }
            }
        });

        self.refresh_task = Some(handle);
    }

    /// Apply any background refresh results that have arrived.
    /// Returns true if the data changed.
    pub fn poll_updates(&mut self) -> bool {
        let mut updated = false;
        while let Ok(data) = self.updates_rx.try_recv() {
            self.state.data = data;
            updated = true;
        }
        updated
    }

    /// Wait for the most recent background refresh to finish, then apply it.
    pub async fn settle(&mut self) -> bool {
        if let Some(handle) = self.refresh_task.take() {
            if let Err(e) = handle.await {
                warn!(cache = %self.key, error = %e, "Background refresh task failed");
            }
        }
        self.poll_updates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::storage::{FailingStorage, KeyValueStorage, MemoryStorage};
    use crate::cache::store::CACHE_TTL_MS;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const NOW: i64 = 1_700_000_000_000;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Row {
        id: i64,
    }

    fn rows(ids: &[i64]) -> Vec<Row> {
        ids.iter().map(|&id| Row { id }).collect()
    }

    /// Returns queued results in order; records how often it was called.
    struct ScriptedFetcher {
        results: Mutex<VecDeque<anyhow::Result<Vec<Row>>>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(results: Vec<anyhow::Result<Vec<Row>>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn delayed(results: Vec<anyhow::Result<Vec<Row>>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                delay: Some(delay),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetch for ScriptedFetcher {
        type Output = Vec<Row>;

        async fn fetch(&self) -> anyhow::Result<Vec<Row>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted result")))
        }
    }

    struct PanickingFetcher;

    #[async_trait]
    impl Fetch for PanickingFetcher {
        type Output = Vec<Row>;

        async fn fetch(&self) -> anyhow::Result<Vec<Row>> {
            panic!("backend client blew up");
        }
    }

    fn memory_store() -> (Arc<CacheStore>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = CacheStore::new(storage.clone()).with_clock(Arc::new(ManualClock::new(NOW)));
        (Arc::new(store), storage)
    }

    #[tokio::test]
    async fn test_cold_hit_populates_state_and_store() {
        let (store, _storage) = memory_store();
        let fetcher = ScriptedFetcher::new(vec![Ok(rows(&[1]))]);
        let mut skills = CachedResource::<Vec<Row>>::new("skills", store.clone(), fetcher.clone());

        skills.fetch().await;

        assert_eq!(
            skills.state(),
            &ResourceState {
                data: rows(&[1]),
                loading: false,
                error: None,
            }
        );
        assert_eq!(store.get::<Vec<Row>>("skills"), Some(rows(&[1])));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_cold_failure_sets_error_and_writes_nothing() {
        let (store, _storage) = memory_store();
        let fetcher = ScriptedFetcher::new(vec![Err(anyhow::anyhow!("connection refused"))]);
        let mut skills = CachedResource::<Vec<Row>>::new("skills", store.clone(), fetcher);

        skills.fetch().await;

        assert!(!skills.is_loading());
        assert_eq!(skills.data(), &Vec::<Row>::new());
        assert_eq!(
            skills.error().map(FetchError::message),
            Some("connection refused")
        );
        assert_eq!(store.get::<Vec<Row>>("skills"), None);
    }

    #[test]
    fn test_fetch_error_recognizes_not_found() {
        let empty = anyhow::Error::from(ApiError::NotFound("no rows in cv_info".to_string()))
            .context("Failed to load cv_info");
        let err = FetchError::from(empty);
        assert!(err.is_not_found());
        assert!(err.message().contains("no rows in cv_info"));

        let down = FetchError::from(anyhow::Error::from(ApiError::ServerError("boom".to_string())));
        assert!(!down.is_not_found());
        assert!(!FetchError::new("fetch task failed").is_not_found());
    }

    #[tokio::test]
    async fn test_cold_failure_keeps_previous_data() {
        let (store, _storage) = memory_store();
        let fetcher = ScriptedFetcher::new(vec![Ok(rows(&[1])), Err(anyhow::anyhow!("down"))]);
        let mut skills = CachedResource::<Vec<Row>>::new("skills", store, fetcher);

        skills.refetch().await;
        skills.refetch().await;

        assert_eq!(skills.data(), &rows(&[1]));
        assert!(skills.error().is_some());
        assert!(!skills.is_loading());
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_reported_as_error() {
        let (store, _storage) = memory_store();
        let mut skills = CachedResource::<Vec<Row>>::new("skills", store, Arc::new(PanickingFetcher));

        skills.fetch().await;

        assert!(!skills.is_loading());
        assert!(skills.error().is_some());
        assert!(skills.data().is_empty());
    }

    #[tokio::test]
    async fn test_warm_hit_returns_cached_then_revalidates() {
        let (store, _storage) = memory_store();
        store.set("projects", &rows(&[7]));
        let fetcher =
            ScriptedFetcher::delayed(vec![Ok(rows(&[8, 7]))], Duration::from_millis(20));
        let mut projects = CachedResource::<Vec<Row>>::new("projects", store.clone(), fetcher.clone());

        projects.fetch().await;

        // Old value is served immediately without a loading phase
        assert_eq!(projects.data(), &rows(&[7]));
        assert!(!projects.is_loading());
        assert_eq!(store.get::<Vec<Row>>("projects"), Some(rows(&[7])));

        assert!(projects.settle().await);
        assert_eq!(projects.data(), &rows(&[8, 7]));
        assert_eq!(store.get::<Vec<Row>>("projects"), Some(rows(&[8, 7])));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_warm_hit_background_failure_is_silent() {
        let (store, storage) = memory_store();
        let seeded = json!({ "data": [{ "id": 7 }], "timestamp": NOW - 1000 });
        storage
            .set_item("cache_projects", &seeded.to_string())
            .unwrap();
        let fetcher = ScriptedFetcher::new(vec![Err(anyhow::anyhow!("timeout"))]);
        let mut projects = CachedResource::<Vec<Row>>::new("projects", store.clone(), fetcher);

        projects.fetch().await;
        assert_eq!(projects.data(), &rows(&[7]));
        assert!(!projects.is_loading());

        assert!(!projects.settle().await);
        assert_eq!(projects.data(), &rows(&[7]));
        assert!(projects.error().is_none());
        assert_eq!(store.get::<Vec<Row>>("projects"), Some(rows(&[7])));
    }

    #[tokio::test]
    async fn test_clear_forces_cold_path() {
        let (store, _storage) = memory_store();
        store.set("services", &rows(&[2]));
        let fetcher = ScriptedFetcher::new(vec![Ok(rows(&[3]))]);
        let mut services = CachedResource::<Vec<Row>>::new("services", store.clone(), fetcher.clone());

        store.clear(Some("services"));
        services.fetch().await;

        // Cold path: result is applied before fetch returns, no settle needed
        assert_eq!(services.data(), &rows(&[3]));
        assert_eq!(fetcher.calls(), 1);
        assert!(!services.poll_updates());
    }

    #[tokio::test]
    async fn test_refetch_bypasses_fresh_cache() {
        let (store, _storage) = memory_store();
        store.set("skills", &rows(&[1]));
        let fetcher = ScriptedFetcher::new(vec![Ok(rows(&[4]))]);
        let mut skills = CachedResource::<Vec<Row>>::new("skills", store.clone(), fetcher);

        skills.refetch().await;

        assert_eq!(skills.data(), &rows(&[4]));
        assert_eq!(store.get::<Vec<Row>>("skills"), Some(rows(&[4])));
    }

    #[tokio::test]
    async fn test_expired_entry_takes_cold_path() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let store = Arc::new(CacheStore::new(storage).with_clock(clock.clone()));
        store.set("skills", &rows(&[1]));
        clock.advance(CACHE_TTL_MS + 1);

        let fetcher = ScriptedFetcher::new(vec![Ok(rows(&[2]))]);
        let mut skills = CachedResource::<Vec<Row>>::new("skills", store, fetcher);
        skills.fetch().await;

        assert_eq!(skills.data(), &rows(&[2]));
    }

    #[tokio::test]
    async fn test_broken_storage_still_serves_fetched_data() {
        let store = Arc::new(CacheStore::new(Arc::new(FailingStorage)));
        let fetcher = ScriptedFetcher::new(vec![Ok(rows(&[1])), Ok(rows(&[2]))]);
        let mut skills = CachedResource::<Vec<Row>>::new("skills", store, fetcher.clone());

        skills.fetch().await;
        assert_eq!(skills.data(), &rows(&[1]));
        assert!(skills.error().is_none());

        // Nothing could be cached, so the next read goes to the backend again
        skills.fetch().await;
        assert_eq!(skills.data(), &rows(&[2]));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_background_write_lands_after_hook_is_dropped() {
        let (store, _storage) = memory_store();
        store.set("skills", &rows(&[1]));
        let fetcher = ScriptedFetcher::new(vec![Ok(rows(&[9]))]);
        let mut skills = CachedResource::<Vec<Row>>::new("skills", store.clone(), fetcher);

        skills.fetch().await;
        let handle = skills.refresh_task.take().expect("refresh in flight");
        drop(skills);
        handle.await.unwrap();

        assert_eq!(store.get::<Vec<Row>>("skills"), Some(rows(&[9])));
    }
}
