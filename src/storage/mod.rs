//! On-device persistence for the local-first stores.
//!
//! Each store owns exactly one JSON document in the data directory:
//! - `notes.json`: notes written while signed out
//! - `favorites.json`: starred ayahs
//! - `folders.json`: bookmark folders and their entries
//! - `progress.json`: reading progress
//!
//! Missing documents load as `None`; writes replace the whole file atomically.

mod doc_type;
mod local;

pub use doc_type::DocType;
pub use local::{LocalStorage, StorageError};
