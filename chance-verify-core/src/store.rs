//! Persistence boundary for control documents.

use std::error::Error as StdError;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::ControlDocument;

/// Errors raised while reading or writing a control document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document file could not be opened.
    #[error("failed to open control document {path}: {source}")]
    Open {
        /// Document path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The document contents could not be decoded or failed validation.
    #[error("failed to decode control document {path}: {source}")]
    Decode {
        /// Document path.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The document could not be encoded.
    #[error("failed to encode control document for {path}: {source}")]
    Encode {
        /// Target path.
        path: Utf8PathBuf,
        /// Encoder error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// Writing the encoded document failed.
    #[error("failed to write control document {path}: {source}")]
    Write {
        /// Target path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Reads and writes control documents in the solver's file format.
///
/// `write` must produce a complete, self-consistent file each time so every
/// solver run reads a fresh copy of the document.
pub trait DocumentStore {
    /// Load a document from `path`.
    fn load(&self, path: &Utf8Path) -> Result<ControlDocument, StoreError>;

    /// Serialise `document` to `path`, replacing any existing file.
    fn write(&self, document: &ControlDocument, path: &Utf8Path) -> Result<(), StoreError>;
}
