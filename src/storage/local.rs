//! JSON document storage for persisting store state to disk.

use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use super::DocType;
use crate::error::SyncError;

/// Storage for the local JSON documents.
///
/// Handles loading and saving documents to the filesystem.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    data_dir: PathBuf,
}

impl LocalStorage {
    /// Creates a new storage instance rooted at `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the full path for a document type.
    pub fn path(&self, doc_type: DocType) -> PathBuf {
        self.data_dir.join(doc_type.filename())
    }

    /// Checks if a document exists on disk.
    pub fn exists(&self, doc_type: DocType) -> bool {
        self.path(doc_type).exists()
    }

    /// Loads a document from disk.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    /// Returns `Err` for other I/O or parsing errors.
    pub async fn load<T: DeserializeOwned>(
        &self,
        doc_type: DocType,
    ) -> Result<Option<T>, StorageError> {
        Self::read_json(&self.path(doc_type)).await
    }

    /// Reads and decodes any JSON file, returning `Ok(None)` if it doesn't exist.
    pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
        match fs::read(path).await {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::ParseError(path.to_path_buf(), e))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(path.to_path_buf(), e)),
        }
    }

    /// Reads a user-supplied JSON file. A missing file is reported as
    /// [`SyncError::ResourceNotFound`] rather than as absence.
    pub async fn read_external<T: DeserializeOwned>(path: &Path) -> Result<T, SyncError> {
        Self::read_json(path)
            .await?
            .ok_or_else(|| SyncError::ResourceNotFound(path.display().to_string()))
    }

    /// Saves a document to disk.
    ///
    /// Creates the data directory if it doesn't exist. The document is written
    /// to a sibling temp file first and renamed over the target, so readers
    /// never observe a partial write.
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        doc_type: DocType,
        value: &T,
    ) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let path = self.path(doc_type);
        let bytes = serde_json::to_vec_pretty(value).map_err(StorageError::EncodeError)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| StorageError::IoError(tmp_path.clone(), e))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StorageError::IoError(path, e))?;

        Ok(())
    }
}

/// Errors that can occur during local storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    #[error("I/O error for {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] io::Error),

    /// The file exists but is not a valid document.
    #[error("Failed to parse {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_json::Error),

    #[error("Failed to encode document: {0}")]
    EncodeError(#[source] serde_json::Error),
}
