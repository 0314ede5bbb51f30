use std::path::{Path, PathBuf};

use base64::Engine;
use uuid::Uuid;

use crate::{constants::RECIPE_IMAGE_DIR, error::StoreError};

/// A decoded `data:image/<ext>;base64,<payload>` value.
#[derive(Debug, PartialEq, Eq)]
pub struct DataUri {
    pub extension: String,
    pub bytes: Vec<u8>,
}

pub fn parse_data_uri(value: &str) -> Result<DataUri, StoreError> {
    let invalid = || StoreError::invalid("image", "Expected a base64 encoded image data URI");

    let (format, payload) = value.split_once(";base64,").ok_or_else(invalid)?;
    let extension = format.strip_prefix("data:image/").ok_or_else(invalid)?;

    if !is_valid_extension(extension) {
        return Err(invalid());
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| {
            log::debug!("Rejected image payload: {e}");
            invalid()
        })?;

    if bytes.is_empty() {
        return Err(StoreError::invalid("image", "The submitted image is empty"));
    }

    Ok(DataUri {
        extension: extension.to_lowercase(),
        bytes,
    })
}

/// Extension from an `image/<ext>` content type.
pub fn extension_from_content_type(content_type: &str) -> Option<String> {
    let subtype = content_type
        .split(';')
        .next()?
        .trim()
        .strip_prefix("image/")?;

    is_valid_extension(subtype).then(|| subtype.to_lowercase())
}

fn is_valid_extension(extension: &str) -> bool {
    !extension.is_empty()
        && extension.len() <= 10
        && extension.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Recipe pictures on local disk below `root`, published under `url_prefix`.
/// Stored paths are relative to `root`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        let mut url_prefix = url_prefix.to_string();
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }

        Self {
            root: root.into(),
            url_prefix,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save_data_uri(&self, value: &str) -> Result<String, StoreError> {
        let image = parse_data_uri(value)?;
        self.save_bytes(&image.bytes, &image.extension).await
    }

    pub async fn save_bytes(&self, bytes: &[u8], extension: &str) -> Result<String, StoreError> {
        if bytes.is_empty() {
            return Err(StoreError::invalid("image", "The submitted image is empty"));
        }
        if !is_valid_extension(extension) {
            return Err(StoreError::invalid("image", "Unsupported image type"));
        }

        let relative = format!("{RECIPE_IMAGE_DIR}/{}.{extension}", Uuid::new_v4().simple());
        let path = self.root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Internal(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::Internal(format!("Failed to write {}: {e}", path.display())))?;

        log::debug!("Stored image {relative} ({} bytes)", bytes.len());

        Ok(relative)
    }

    /// Failures only get logged; a stale file never fails a request.
    pub async fn remove(&self, relative: &str) {
        if relative.is_empty() || relative.contains("..") {
            return;
        }

        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            log::warn!("Failed to remove image {relative}: {e}");
        }
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}{}", self.url_prefix, relative)
    }

    /// Path segments of the public prefix, which the server mounts `root`
    /// under. A scheme and host in the prefix are skipped.
    pub fn route_segments(&self) -> Vec<String> {
        let path = match self.url_prefix.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
            None => self.url_prefix.as_str(),
        };

        path.split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_is_decoded() {
        let image = parse_data_uri("data:image/png;base64,aGVsbG8=").unwrap();

        assert_eq!(image.extension, "png");
        assert_eq!(image.bytes, b"hello");
    }

    #[test]
    fn malformed_data_uris_are_rejected() {
        for value in [
            "",
            "aGVsbG8=",
            "data:text/plain;base64,aGVsbG8=",
            "data:image/png;base64,not base64!",
            "data:image/../x;base64,aGVsbG8=",
            "data:image/png;base64,",
        ] {
            assert!(
                matches!(parse_data_uri(value), Err(StoreError::Validation(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn content_type_extension() {
        assert_eq!(extension_from_content_type("image/JPEG"), Some("jpeg".into()));
        assert_eq!(
            extension_from_content_type("image/png; charset=binary"),
            Some("png".into())
        );
        assert_eq!(extension_from_content_type("application/json"), None);
    }

    #[test]
    fn url_has_single_separator() {
        let store = ImageStore::new("media", "/media");
        assert_eq!(
            store.url("recipes/images/a.png"),
            "/media/recipes/images/a.png"
        );
    }

    #[test]
    fn route_follows_url_prefix() {
        assert_eq!(ImageStore::new("media", "/media/").route_segments(), vec!["media"]);
        assert_eq!(
            ImageStore::new("media", "/static/uploads").route_segments(),
            vec!["static", "uploads"]
        );
        assert_eq!(
            ImageStore::new("media", "https://cdn.example.com/files/").route_segments(),
            vec!["files"]
        );
    }

    #[tokio::test]
    async fn saved_image_lands_under_root() {
        let root = std::env::temp_dir().join(format!("images-{}", Uuid::new_v4().simple()));
        let store = ImageStore::new(&root, "/media/");

        let relative = store
            .save_data_uri("data:image/gif;base64,R0lGODlh")
            .await
            .unwrap();

        assert!(relative.starts_with("recipes/images/"));
        assert!(relative.ends_with(".gif"));
        assert_eq!(tokio::fs::read(root.join(&relative)).await.unwrap(), b"GIF89a");

        store.remove(&relative).await;
        assert!(!root.join(&relative).exists());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
