//! File-backed JSON cache with change detection
//!
//! Provides a `JsonCache` that loads a serializable value from a JSON file and
//! writes it back only when the serialized bytes differ from what is on disk.

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// SHA-256 digest of a cache file's contents
type Checksum = [u8; 32];

/// Errors that can occur when loading or saving the cache file
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file exists but could not be read, or could not be written
    #[error("cache file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache file does not contain valid JSON of the expected shape
    #[error("corrupt cache file {}: {source}", path.display())]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory value could not be serialized
    #[error("failed to serialize cache data: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A value persisted to a JSON file
///
/// The cache owns its value. `load` replaces the value with the file contents
/// and `save` writes it back. After either succeeds, the recorded checksum
/// matches the bytes on disk, which lets `save` skip the write when nothing
/// changed.
#[derive(Debug)]
pub struct JsonCache<T> {
    data: T,
    path: PathBuf,
    checksum: Option<Checksum>,
}

fn checksum(bytes: &[u8]) -> Checksum {
    Sha256::digest(bytes).into()
}

impl<T> JsonCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a cache holding `data`, backed by the file at `path`
    ///
    /// Nothing is read until `load` is called.
    pub fn new(data: T, path: impl Into<PathBuf>) -> Self {
        Self {
            data,
            path: path.into(),
            checksum: None,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached value
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Mutable access to the cached value
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Reads the backing file into the cached value
    ///
    /// A missing file is not an error: the value and checksum are left as they
    /// were, which is the normal first-run case.
    ///
    /// # Returns
    /// * `Ok(())` if the file was loaded or does not exist
    /// * `Err(CacheError::Io)` if the file exists but cannot be read
    /// * `Err(CacheError::Deserialize)` if the file contents are not valid
    pub fn load(&mut self) -> Result<(), CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cache file to load");
                return Ok(());
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        self.data = serde_json::from_slice(&bytes).map_err(|source| CacheError::Deserialize {
            path: self.path.clone(),
            source,
        })?;
        self.checksum = Some(checksum(&bytes));
        debug!(path = %self.path.display(), bytes = bytes.len(), "loaded cache file");
        Ok(())
    }

    /// Writes the cached value to the backing file if it has changed
    ///
    /// The value is serialized as indented JSON. The parent directory is
    /// created when a write is needed.
    ///
    /// # Returns
    /// * `Ok(true)` if the file was written
    /// * `Ok(false)` if the serialized value matched the last recorded checksum
    /// * `Err` if serialization, directory creation, or writing fails
    pub fn save(&mut self) -> Result<bool, CacheError> {
        let json = serde_json::to_string_pretty(&self.data).map_err(CacheError::Serialize)?;
        let sum = checksum(json.as_bytes());

        if self.checksum == Some(sum) {
            debug!(path = %self.path.display(), "cache unchanged, skipping write");
            return Ok(false);
        }

        self.write(&json)?;
        self.checksum = Some(sum);
        debug!(path = %self.path.display(), bytes = json.len(), "wrote cache file");
        Ok(true)
    }

    fn write(&self, json: &str) -> Result<(), CacheError> {
        let io_error = |source: io::Error| CacheError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
        fs::write(&self.path, json).map_err(io_error)
    }
}
