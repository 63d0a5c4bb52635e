//! Small helpers for display, icon colors and upload file names.

pub mod color;
pub mod files;
pub mod format;

pub use color::color_for_icon;
pub use files::{content_type_for, unique_file_name};
pub use format::{format_date, truncate_string};
