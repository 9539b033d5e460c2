//! License image storage.
//!
//! Uploaded clinician license images land on local disk under the configured
//! uploads directory, scoped by a generated prefix:
//! `<uploads.dir>/<uuid>/<original filename>`. Validation (content type and
//! size) happens before any byte is written.

use std::path::PathBuf;

use uuid::Uuid;

use crate::config::UploadsConfig;
use crate::errors::{Error, Result};

/// Content types accepted for license images.
const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "application/pdf"];

pub struct LicenseStore {
    dir: PathBuf,
    max_file_size: u64,
}

impl LicenseStore {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_file_size: config.max_file_size,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Reject disallowed content types before the body is even read.
    pub fn validate_content_type(&self, content_type: &str) -> Result<()> {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(Error::BadRequest {
                message: format!(
                    "License file type {content_type:?} is not allowed (expected one of: {})",
                    ALLOWED_CONTENT_TYPES.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// Incremental size check, called per multipart chunk so oversized uploads
    /// abort as early as possible.
    pub fn validate_size(&self, total_size: u64) -> Result<()> {
        if total_size > self.max_file_size {
            return Err(Error::PayloadTooLarge {
                message: format!(
                    "License file exceeds maximum allowed size of {} bytes ({} MB)",
                    self.max_file_size,
                    self.max_file_size / (1024 * 1024)
                ),
            });
        }
        Ok(())
    }

    /// Persist a fully-validated upload. Returns the storage path relative to
    /// the uploads directory (`<prefix>/<filename>`), which is what gets
    /// recorded on the signup request row.
    pub async fn save(&self, original_filename: &str, bytes: &[u8]) -> Result<String> {
        let filename = sanitize_filename(original_filename);
        let prefix = Uuid::new_v4().to_string();

        let parent = self.dir.join(&prefix);
        tokio::fs::create_dir_all(&parent).await.map_err(|e| Error::Internal {
            operation: format!("create upload directory: {e}"),
        })?;

        let path = parent.join(&filename);
        tokio::fs::write(&path, bytes).await.map_err(|e| Error::Internal {
            operation: format!("write license file: {e}"),
        })?;

        Ok(format!("{prefix}/{filename}"))
    }
}

/// Keep only the final path component and replace anything that isn't a safe
/// filename character. An empty result falls back to "license".
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        "license".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(max_file_size: u64) -> LicenseStore {
        LicenseStore {
            dir: std::env::temp_dir().join(format!("echoes-test-uploads-{}", std::process::id())),
            max_file_size,
        }
    }

    #[test]
    fn test_content_type_validation() {
        let store = test_store(1024);
        assert!(store.validate_content_type("image/png").is_ok());
        assert!(store.validate_content_type("image/jpeg").is_ok());
        assert!(store.validate_content_type("application/pdf").is_ok());
        assert!(store.validate_content_type("text/plain").is_err());
        assert!(store.validate_content_type("image/gif").is_err());
    }

    #[test]
    fn test_size_validation() {
        let store = test_store(5 * 1024 * 1024);
        assert!(store.validate_size(5 * 1024 * 1024).is_ok());
        let err = store.validate_size(6 * 1024 * 1024).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { .. }));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("license.png"), "license.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my license (1).pdf"), "my_license__1_.pdf");
        assert_eq!(sanitize_filename("///"), "license");
    }

    #[tokio::test]
    async fn test_save_scopes_by_prefix() {
        let store = test_store(1024);
        let path = store.save("license.png", b"fake-png").await.unwrap();

        let (prefix, filename) = path.split_once('/').unwrap();
        assert_eq!(filename, "license.png");
        assert!(Uuid::parse_str(prefix).is_ok());

        let stored = tokio::fs::read(store.dir.join(&path)).await.unwrap();
        assert_eq!(stored, b"fake-png");
    }
}
