//! Capability-scoped document store for uploaded files.
//!
//! All operations run against a [`Dir`] handle opened once at startup, so a
//! stored name can never escape the upload root even if sanitisation upstream
//! regresses.

use std::io;
use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};

use crate::domain::ports::{DocumentStore, DocumentStoreError};

pub struct DirDocumentStore {
    root: Dir,
}

impl DirDocumentStore {
    /// Open (creating if needed) the upload root.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Io`] when the directory cannot be
    /// created or opened.
    pub fn open(path: &Path) -> Result<Self, DocumentStoreError> {
        Dir::create_ambient_dir_all(path, ambient_authority()).map_err(io_err)?;
        let root = Dir::open_ambient_dir(path, ambient_authority()).map_err(io_err)?;
        Ok(Self { root })
    }
}

fn io_err(error: io::Error) -> DocumentStoreError {
    DocumentStoreError::Io {
        message: error.to_string(),
    }
}

impl DocumentStore for DirDocumentStore {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), DocumentStoreError> {
        self.root.write(name, bytes).map_err(io_err)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, DocumentStoreError> {
        match self.root.read(name) {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(DocumentStoreError::NotFound { name: name.into() })
            }
            Err(error) => Err(io_err(error)),
        }
    }

    fn delete(&self, name: &str) -> Result<(), DocumentStoreError> {
        match self.root.remove_file(name) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_err(error)),
        }
    }
}
