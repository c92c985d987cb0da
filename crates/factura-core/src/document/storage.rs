//! Filesystem document storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{DocumentStorage, Result, is_plain_file_name};
use crate::error::DocumentError;
use crate::models::invoice::InvoiceDocument;

/// Stores documents as files in one directory, keyed by file name.
#[derive(Debug, Clone)]
pub struct FsDocumentStorage {
    root: PathBuf,
}

impl FsDocumentStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, file_name: &str) -> Result<PathBuf> {
        if !is_plain_file_name(file_name) {
            return Err(DocumentError::InvalidName(file_name.to_string()));
        }
        Ok(self.root.join(file_name))
    }
}

impl DocumentStorage for FsDocumentStorage {
    fn write(&self, document: &InvoiceDocument) -> Result<()> {
        let path = self.path_for(document.file_name())?;

        fs::create_dir_all(&self.root).map_err(|source| DocumentError::Write {
            path: self.root.clone(),
            source,
        })?;
        fs::write(&path, document.bytes()).map_err(|source| DocumentError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "stored invoice document");
        Ok(())
    }

    fn read(&self, file_name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(file_name)?;

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(DocumentError::Read { path, source }),
        }
    }
}
