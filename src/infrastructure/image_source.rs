//! Image inputs for face service calls

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::domain::DomainError;

/// Where an image comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// File on disk, read only when the image is needed
    Path(PathBuf),
    /// Bytes already in memory, with a label for diagnostics
    Bytes { label: String, data: Bytes },
}

impl ImageSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(label: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::Bytes {
            label: label.into(),
            data: data.into(),
        }
    }

    /// Load the image contents; files are opened, read and closed in one step
    pub async fn load(&self) -> Result<Bytes, DomainError> {
        match self {
            Self::Path(path) => read_image(path).await,
            Self::Bytes { data, .. } => Ok(data.clone()),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Bytes { label, .. } => write!(f, "{}", label),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Read an image file into memory
pub async fn read_image(path: &Path) -> Result<Bytes, DomainError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| DomainError::io(path.display().to_string(), e.to_string()))?;

    Ok(Bytes::from(data))
}
