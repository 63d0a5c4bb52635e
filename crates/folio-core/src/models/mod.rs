//! Data models for portfolio content.
//!
//! Rows mirror the backend tables:
//!
//! - `Skill`, `Project`, `Service`: list resources, newest first
//! - `ContactInfo`, `CvInfo`, `AboutSection`: single-row resources
//! - `ContactMessage`: visitor messages, write-only
//!
//! `id` is generated by the backend and left out of inserts when empty.

pub mod content;
pub mod language;
pub mod message;
pub mod profile;

pub use content::{Project, Service, Skill};
pub use language::Language;
pub use message::ContactMessage;
pub use profile::{AboutSection, ContactInfo, CvInfo};

/// Serde helper for skipping unset server-generated ids.
pub(crate) fn is_blank(s: &str) -> bool {
    s.is_empty()
}
