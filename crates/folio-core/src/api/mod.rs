//! REST client for the hosted backend.
//!
//! This module provides the `ApiClient` for reading and writing portfolio
//! tables, uploading files to object storage, and signing the owner in.
//!
//! Every request carries the project's anon key; once signed in, the
//! session's access token is sent as the bearer token instead.

pub mod client;
pub mod error;

pub use client::{ApiClient, CONTENT_BUCKET};
pub use error::ApiError;
