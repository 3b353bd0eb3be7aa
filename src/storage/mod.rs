pub mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Unsupported content type '{0}'")]
    UnsupportedType(String),

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Upload is empty")]
    Empty,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where uploaded files live and how clients reach them
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Returns false when nothing was stored under `key`
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    fn public_url(&self, key: &str) -> String;
}

/// Image formats accepted for avatars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
    Webp,
    Gif,
}

impl ImageType {
    pub fn from_content_type(content_type: &str) -> Result<Self, StorageError> {
        let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Ok(ImageType::Png),
            "image/jpeg" | "image/jpg" => Ok(ImageType::Jpeg),
            "image/webp" => Ok(ImageType::Webp),
            "image/gif" => Ok(ImageType::Gif),
            _ => Err(StorageError::UnsupportedType(content_type.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpeg => "jpg",
            ImageType::Webp => "webp",
            ImageType::Gif => "gif",
        }
    }
}

/// Content-addressed key for a user's avatar: `avatars/<user>/<sha256>.<ext>`
pub fn avatar_key(user_id: Uuid, kind: ImageType, bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("avatars/{}/{:x}.{}", user_id, digest, kind.extension())
}

/// Check type and size limits before anything touches the store
pub fn check_upload(content_type: &str, bytes: &[u8], limit: usize) -> Result<ImageType, StorageError> {
    if bytes.is_empty() {
        return Err(StorageError::Empty);
    }
    if bytes.len() > limit {
        return Err(StorageError::TooLarge { size: bytes.len(), limit });
    }
    ImageType::from_content_type(content_type)
}

/// Keys are relative slash-separated paths of plain segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidKey(key.to_string());
    if key.is_empty() || key.starts_with('/') {
        return Err(invalid());
    }
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(invalid());
        }
        if !segment.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
            return Err(invalid());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_keys_are_content_addressed() {
        let user = Uuid::nil();
        let a = avatar_key(user, ImageType::Png, b"same");
        let b = avatar_key(user, ImageType::Png, b"same");
        let c = avatar_key(user, ImageType::Png, b"different");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("avatars/00000000-0000-0000-0000-000000000000/"));
        assert!(a.ends_with(".png"));
        assert!(validate_key(&a).is_ok());
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert_eq!(ImageType::from_content_type("image/JPEG; charset=binary").unwrap(), ImageType::Jpeg);
        assert!(matches!(
            ImageType::from_content_type("application/pdf"),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn enforces_upload_limits() {
        assert!(matches!(check_upload("image/png", b"", 10), Err(StorageError::Empty)));
        assert!(matches!(
            check_upload("image/png", &[0u8; 11], 10),
            Err(StorageError::TooLarge { size: 11, limit: 10 })
        ));
        assert_eq!(check_upload("image/gif", &[0u8; 10], 10).unwrap(), ImageType::Gif);
    }

    #[test]
    fn rejects_traversal_keys() {
        for key in ["", "/etc/passwd", "../x", "a/../b", "a//b", "a/./b", "a\\b", "a b"] {
            assert!(validate_key(key).is_err(), "{key:?} should be rejected");
        }
    }
}
