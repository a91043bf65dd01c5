//! Kurani Sync Library
//!
//! Data sync and caching layer for the Kurani reader: Arabic text cache,
//! notes, favorites and bookmark folders, reading progress and the Arabic
//! dictionary.

pub mod bookmarks;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod gateway;
pub mod models;
pub mod notes;
pub mod progress;
pub mod remote_favorites;
pub mod session;
pub mod storage;
pub mod text;

pub use bookmarks::{BookmarkStore, FolderAddOutcome};
pub use config::{Config, ConfigError, ConfigSource, ConfigValue, RemoteConfig};
pub use dictionary::ArabicDictionary;
pub use error::SyncError;
pub use gateway::{
    GatewayError, GatewayOp, HttpGateway, MemoryGateway, Query, RemoteGateway, Row,
};
pub use models::{
    AyahKey, DictionaryEntry, Favorite, FavoriteRow, FavoriteViewRow, Folder, FolderEntry, Note,
    Passage, Surah, WordFragment,
};
pub use notes::{AuthObserver, NotesStore, LOCAL_OWNER};
pub use progress::ReadingProgressStore;
pub use remote_favorites::RemoteFavorites;
pub use session::{AuthProvider, OwnerId, Session, SessionBroadcaster};
pub use storage::{DocType, LocalStorage, StorageError};
pub use text::{TextCache, TextFetch, TextMap, TextScope};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
