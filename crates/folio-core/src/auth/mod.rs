//! Owner authentication.
//!
//! This module provides:
//! - `Session`: the signed-in owner's access token, persisted to disk and
//!   ignored once expired
//! - `CredentialStore`: optional OS-level password storage via keyring
//!
//! Only the admin service needs a session; public reads use the anon key.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
