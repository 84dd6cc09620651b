//! Upload storage on the local filesystem

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised by the upload store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid filename")]
    InvalidFilename(String),

    #[error("File not found")]
    NotFound(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Stores uploaded files under one directory, keyed by client filename.
///
/// Filenames are kept verbatim. A later upload with the same name replaces
/// the earlier file. Names that would resolve outside the directory are
/// rejected.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the store, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::Io {
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    /// Path of a stored file, or an error if the name is not a plain file name
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, StorageError> {
        validate_filename(filename)?;
        Ok(self.dir.join(filename))
    }

    /// Path reported to clients for a stored file
    pub fn public_path(&self, filename: &str) -> String {
        self.dir.join(filename).to_string_lossy().into_owned()
    }

    /// Write an upload, overwriting any file with the same name
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(filename)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), size = bytes.len(), "Upload saved");
        Ok(path)
    }

    /// Whether a file with this name has been stored
    pub async fn exists(&self, filename: &str) -> bool {
        match self.path_for(filename) {
            Ok(path) => tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Read a stored file back
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// Accept only a single normal path component
fn validate_filename(filename: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidFilename(filename.to_string());

    if filename.is_empty() || filename.contains(['/', '\\', '\0']) {
        return Err(invalid());
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}
