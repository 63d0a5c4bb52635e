use super::AdminError;
use crate::utils::files::{extension, is_image};

/// CV files larger than this are rejected before upload.
pub const MAX_CV_BYTES: usize = 10 * 1024 * 1024;

pub fn validate_cv_file(file_name: &str, bytes: &[u8]) -> Result<(), AdminError> {
    if extension(file_name).as_deref() != Some("pdf") {
        return Err(AdminError::Invalid("only PDF files can be uploaded as a CV".to_string()));
    }
    if !bytes.starts_with(b"%PDF") {
        return Err(AdminError::Invalid(format!("{} is not a PDF document", file_name)));
    }
    if bytes.len() > MAX_CV_BYTES {
        return Err(AdminError::Invalid(format!(
            "CV must be at most 10MB, got {:.1}MB",
            bytes.len() as f64 / (1024.0 * 1024.0)
        )));
    }
    Ok(())
}

pub fn validate_image_file(file_name: &str, bytes: &[u8]) -> Result<(), AdminError> {
    if !is_image(file_name) {
        return Err(AdminError::Invalid(format!("{} is not a supported image", file_name)));
    }
    if bytes.is_empty() {
        return Err(AdminError::Invalid(format!("{} is empty", file_name)));
    }
    Ok(())
}
