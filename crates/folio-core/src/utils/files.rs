//! Naming and typing of files uploaded to object storage.

use std::path::Path;

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of the random suffix in generated object names.
const RANDOM_SUFFIX_LEN: usize = 7;

/// File extension of `name`, lowercased, if it has one.
pub fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Collision-resistant object name: `<prefix><ms epoch>-<random>.<ext>`.
pub fn unique_file_name(prefix: &str, original: &str, now_millis: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    match extension(original) {
        Some(ext) => format!("{}{}-{}.{}", prefix, now_millis, suffix, ext),
        None => format!("{}{}-{}", prefix, now_millis, suffix),
    }
}

/// MIME type for the extensions the admin panel accepts.
pub fn content_type_for(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub fn is_image(name: &str) -> bool {
    content_type_for(name).starts_with("image/")
}
