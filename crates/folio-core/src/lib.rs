//! Core library for folio.
//!
//! Provides the read-through content cache used by every portfolio
//! resource, the REST client for the hosted backend, the data models,
//! the owner's session handling, and the admin mutation service.

pub mod admin;
pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod resources;
pub mod utils;

pub use admin::{AdminError, AdminService};
pub use api::{ApiClient, ApiError};
pub use cache::{CacheStore, CachedResource, FetchError, ResourceState};
pub use config::Config;
pub use resources::{Portfolio, ResourceKey};
