//! Local caching for remote portfolio content.
//!
//! This module provides the `CacheStore` for storing and retrieving
//! snapshots of backend resources, and `CachedResource`, the
//! stale-while-revalidate wrapper every resource hook is built from.
//! Entries are stored as JSON `{data, timestamp}` under `cache_<key>` and
//! expire one hour after they were written.
//!
//! Storage and clock are injected so the cache can be backed by files on
//! disk in the application and by memory and a manual clock in tests.

pub mod clock;
pub mod fetch;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fetch::{CachedResource, Fetch, FetchError, ResourceState};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::{CacheStore, CachedData, CACHE_TTL_MS};
