//! Reference to an image held by the external asset store.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use emporium_core::{DomainError, ValueObject};

/// Errors that can occur when parsing an [`ImageRef`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("image path cannot be empty")]
    Empty,
    #[error("image path must be at most {max} characters")]
    TooLong { max: usize },
    #[error("image path must be relative")]
    Absolute,
    #[error("image path must not contain '..' segments")]
    ParentSegment,
}

impl From<ImageRefError> for DomainError {
    fn from(err: ImageRefError) -> Self {
        DomainError::validation(format!("image: {err}"))
    }
}

/// Relative path of an image inside the asset store.
///
/// The catalog never reads or writes the blob itself; it only keeps the path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ImageRef(String);

impl ImageRef {
    /// Maximum stored path length.
    pub const MAX_LENGTH: usize = 100;

    /// Directory uploaded product images are placed under.
    pub const UPLOAD_DIR: &'static str = "images/products";

    /// Placeholder used when an image is created without one.
    pub const PLACEHOLDER: &'static str = "images/products/default.jpg";

    pub fn parse(path: &str) -> Result<Self, ImageRefError> {
        if path.trim().is_empty() {
            return Err(ImageRefError::Empty);
        }
        if path.starts_with('/') || path.starts_with('\\') {
            return Err(ImageRefError::Absolute);
        }
        if path.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(ImageRefError::ParentSegment);
        }
        if path.chars().count() > Self::MAX_LENGTH {
            return Err(ImageRefError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(path.to_owned()))
    }

    /// Path for a file uploaded under [`ImageRef::UPLOAD_DIR`].
    pub fn uploaded(file_name: &str) -> Result<Self, ImageRefError> {
        let file_name = file_name.trim_start_matches('/');
        if file_name.is_empty() {
            return Err(ImageRefError::Empty);
        }
        Self::parse(&format!("{}/{}", Self::UPLOAD_DIR, file_name))
    }

    /// The built-in placeholder image.
    pub fn placeholder() -> Self {
        Self(Self::PLACEHOLDER.to_owned())
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == Self::PLACEHOLDER
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ImageRef {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl ValueObject for ImageRef {}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImageRef {
    type Error = ImageRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        image.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_placeholder() {
        let image = ImageRef::default();
        assert_eq!(image.as_str(), "images/products/default.jpg");
        assert!(image.is_placeholder());
    }

    #[test]
    fn uploaded_files_land_in_upload_dir() {
        let image = ImageRef::uploaded("hammer-front.png").unwrap();
        assert_eq!(image.as_str(), "images/products/hammer-front.png");
        assert!(!image.is_placeholder());
    }

    #[test]
    fn rejects_escaping_paths() {
        assert_eq!(ImageRef::parse("/etc/passwd"), Err(ImageRefError::Absolute));
        assert_eq!(
            ImageRef::parse("images/../secrets.txt"),
            Err(ImageRefError::ParentSegment)
        );
        assert_eq!(ImageRef::uploaded(""), Err(ImageRefError::Empty));
    }

    #[test]
    fn rejects_overlong_paths() {
        let name = "a".repeat(ImageRef::MAX_LENGTH);
        assert_eq!(
            ImageRef::uploaded(&name),
            Err(ImageRefError::TooLong { max: ImageRef::MAX_LENGTH })
        );
    }
}
