//! # Blob Store
//!
//! Product images live outside the row store; a product only keeps the
//! public URL.
//!
//! ```text
//! upload(session, "png", bytes)
//!     │
//!     ▼
//! {root}/{user_id}-{unix_millis}.png           (never overwritten)
//!     │
//!     ▼
//! "{public_base_url}/{user_id}-{unix_millis}.png"  ──► product.image_url
//!
//! delete(session, url)  ──► removes {root}/{last url segment}
//!                            only if it is exactly {user_id}-{digits}.{ext}
//! ```
//!
//! User ids may themselves contain `-`, so a bare prefix match is not enough:
//! `alice` must not reach `alice-corp-1700000000000.png`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use stockly_core::{Session, ValidationError};

/// Longest accepted file extension.
const MAX_EXTENSION_LEN: usize = 10;

/// Storage for uploaded product images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` and returns the public URL of the new blob.
    async fn upload(&self, session: &Session, extension: &str, bytes: &[u8]) -> DbResult<String>;

    /// Removes the blob behind `url`.
    ///
    /// Returns `Ok(false)` when there was nothing to remove.
    async fn delete(&self, session: &Session, url: &str) -> DbResult<bool>;
}

// =============================================================================
// Local Directory Store
// =============================================================================

/// Blob store backed by a local directory served over HTTP.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    /// Creates a store writing into `root`, with URLs under `public_base_url`.
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        LocalBlobStore {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Directory the blobs are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if needed.
    pub async fn ensure_root(&self) -> DbResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_base_url, file_name)
    }
}

/// Lowercases and checks an extension such as `png` or `.JPG`.
fn normalize_extension(extension: &str) -> DbResult<String> {
    let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ValidationError::InvalidFormat {
            field: "extension".to_string(),
            reason: "must be 1-10 letters or digits".to_string(),
        }
        .into());
    }
    Ok(ext)
}

/// The file name a URL points at, if it is a plain name we could have written.
fn file_name_of(url: &str) -> Option<&str> {
    let name = url.trim().rsplit('/').next()?;
    let name = name.split(['?', '#']).next()?;
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    plain.then_some(name)
}

/// Whether `file_name` is one `upload` wrote for `user_id`.
fn is_owned_by(file_name: &str, user_id: &str) -> bool {
    let Some(rest) = file_name
        .strip_prefix(user_id)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };
    let Some((millis, ext)) = rest.split_once('.') else {
        return false;
    };
    !millis.is_empty()
        && millis.chars().all(|c| c.is_ascii_digit())
        && !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, session: &Session, extension: &str, bytes: &[u8]) -> DbResult<String> {
        let ext = normalize_extension(extension)?;
        if bytes.is_empty() {
            return Err(ValidationError::Required {
                field: "image".to_string(),
            }
            .into());
        }

        let file_name = format!("{}-{}.{}", session.user_id, Utc::now().timestamp_millis(), ext);
        if file_name_of(&file_name) != Some(file_name.as_str()) {
            return Err(DbError::Storage(format!("unusable file name: {file_name}")));
        }

        self.ensure_root().await?;
        let path = self.root.join(&file_name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        info!(user_id = %session.user_id, file = %file_name, size = bytes.len(), "Image uploaded");
        Ok(self.url_for(&file_name))
    }

    async fn delete(&self, session: &Session, url: &str) -> DbResult<bool> {
        let Some(file_name) = file_name_of(url) else {
            debug!(url = %url, "Ignoring image URL without a file name");
            return Ok(false);
        };

        if !is_owned_by(file_name, &session.user_id) {
            debug!(user_id = %session.user_id, file = %file_name, "Image belongs to another owner");
            return Ok(false);
        }

        match tokio::fs::remove_file(self.root.join(file_name)).await {
            Ok(()) => {
                info!(user_id = %session.user_id, file = %file_name, "Image deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn store() -> LocalBlobStore {
        let root = std::env::temp_dir().join(format!("stockly-blobs-{}", Uuid::new_v4()));
        LocalBlobStore::new(root, "http://localhost:8080/images/")
    }

    #[tokio::test]
    async fn test_upload_then_delete() {
        let store = store();
        let session = Session::new("alice");

        let url = store.upload(&session, ".PNG", b"\x89PNG fake").await.unwrap();
        assert!(url.starts_with("http://localhost:8080/images/alice-"));
        assert!(url.ends_with(".png"));

        let name = file_name_of(&url).unwrap();
        let stored = tokio::fs::read(store.root().join(name)).await.unwrap();
        assert_eq!(stored, b"\x89PNG fake");

        assert!(store.delete(&session, &url).await.unwrap());
        assert!(!store.delete(&session, &url).await.unwrap());

        tokio::fs::remove_dir_all(store.root()).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_other_owner_is_ignored() {
        let store = store();
        let url = store.upload(&Session::new("alice"), "jpg", b"img").await.unwrap();

        assert!(!store.delete(&Session::new("bob"), &url).await.unwrap());
        let name = file_name_of(&url).unwrap();
        assert!(store.root().join(name).exists());

        tokio::fs::remove_dir_all(store.root()).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_needs_exact_owner_not_prefix() {
        let store = store();
        let url = store.upload(&Session::new("alice-corp"), "png", b"img").await.unwrap();
        let name = file_name_of(&url).unwrap();

        assert!(!store.delete(&Session::new("alice"), &url).await.unwrap());
        assert!(store.root().join(name).exists());

        assert!(store.delete(&Session::new("alice-corp"), &url).await.unwrap());
        assert!(!store.root().join(name).exists());

        tokio::fs::remove_dir_all(store.root()).await.unwrap();
    }

    #[test]
    fn test_is_owned_by() {
        assert!(is_owned_by("alice-1700000000000.png", "alice"));
        assert!(is_owned_by("alice-corp-1700000000000.png", "alice-corp"));

        assert!(!is_owned_by("alice-corp-1700000000000.png", "alice"));
        assert!(!is_owned_by("alice-1700000000000", "alice"));
        assert!(!is_owned_by("alice-.png", "alice"));
        assert!(!is_owned_by("alice-17.tar.gz", "alice"));
        assert!(!is_owned_by("alice1700000000000.png", "alice"));
        assert!(!is_owned_by("bob-1700000000000.png", "alice"));
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let store = store();
        let session = Session::new("alice");
        assert!(store.upload(&session, "../sh", b"x").await.is_err());
        assert!(store.upload(&session, "", b"x").await.is_err());
        assert!(store.upload(&session, "png", b"").await.is_err());
        assert!(!store.delete(&session, "http://host/images/..").await.unwrap());
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of("http://h/images/u-1.png"), Some("u-1.png"));
        assert_eq!(file_name_of("http://h/images/u-1.png?v=2"), Some("u-1.png"));
        assert_eq!(file_name_of("http://h/images/"), None);
        assert_eq!(file_name_of("u 1.png"), None);
    }
}
