//! Output storage
//!
//! Pages and index files are written through [`Storage`] so the conversion
//! can target something other than the local filesystem.

use std::fs;
use std::path::Path;

use crate::error::{DocsError, Result};

/// Filesystem operations needed to materialize the output tree
pub trait Storage {
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all of its missing parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Create or replace a file
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Remove a directory tree; a missing directory is not an error
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

/// [`Storage`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Storage for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| DocsError::io(path, e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).map_err(|e| DocsError::io(path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other.map_err(|e| DocsError::io(path, e)),
        }
    }
}
