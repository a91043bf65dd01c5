//! Document type enumeration for local storage.

/// Local documents, one per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    Notes,
    Favorites,
    Folders,
    ReadingProgress,
}

impl DocType {
    /// Returns the filename for this document type.
    pub fn filename(&self) -> &'static str {
        match self {
            DocType::Notes => "notes.json",
            DocType::Favorites => "favorites.json",
            DocType::Folders => "folders.json",
            DocType::ReadingProgress => "progress.json",
        }
    }
}
