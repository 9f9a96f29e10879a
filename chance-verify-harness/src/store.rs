//! JSON persistence for control documents.

use std::io::BufReader;

use camino::Utf8Path;
use chance_verify_core::{ControlDocument, DocumentStore, StoreError};
use log::debug;

/// Stores control documents as pretty-printed JSON.
///
/// Every write replaces the whole file, so each solver run reads a complete
/// document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonDocumentStore;

impl DocumentStore for JsonDocumentStore {
    fn load(&self, path: &Utf8Path) -> Result<ControlDocument, StoreError> {
        let file = chance_verify_fs::open_utf8_file(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|err| StoreError::Decode {
            path: path.to_path_buf(),
            source: Box::new(err),
        })
    }

    fn write(&self, document: &ControlDocument, path: &Utf8Path) -> Result<(), StoreError> {
        let mut encoded =
            serde_json::to_vec_pretty(document).map_err(|err| StoreError::Encode {
                path: path.to_path_buf(),
                source: Box::new(err),
            })?;
        encoded.push(b'\n');
        chance_verify_fs::write_utf8_file(path, &encoded).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("wrote control document to {path}");
        Ok(())
    }
}
