//! Owner-side content editing.
//!
//! Every write goes through `AdminService::commit`, which derives both the
//! table and the cache key from one `ResourceKey` and clears that cache
//! entry only once the backend has confirmed the write. A failed write
//! leaves the cache untouched.

pub mod service;
pub mod uploads;

pub use service::{submit_contact_message, AdminError, AdminService, Write};
pub use uploads::{validate_cv_file, validate_image_file, MAX_CV_BYTES};
