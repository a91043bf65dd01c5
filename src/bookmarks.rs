//! Local-first favorites and bookmark folders.
//!
//! Both lists live in memory and are written back to their own JSON document
//! after every mutation. A failed write is logged and otherwise ignored: the
//! in-memory lists stay authoritative until the next successful write.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{normalize_note, Favorite, Folder, FolderEntry};
use crate::storage::{DocType, LocalStorage};

/// Result of [`BookmarkStore::add_ayah_to_folder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderAddOutcome {
    /// A new entry was added to the folder.
    Inserted,
    /// The ayah was already in the folder; its note and timestamp were refreshed.
    Updated,
    /// No folder has the given id.
    Failed,
}

pub struct BookmarkStore {
    storage: LocalStorage,
    favorites: Vec<Favorite>,
    folders: Vec<Folder>,
}

impl BookmarkStore {
    /// Loads both documents. Unreadable documents start empty.
    pub async fn load(storage: LocalStorage) -> Self {
        let favorites = load_list(&storage, DocType::Favorites).await;
        let folders = load_list(&storage, DocType::Folders).await;

        let mut store = Self {
            storage,
            favorites,
            folders,
        };
        store.sort_favorites();
        store.sort_folders();
        for folder in &mut store.folders {
            folder.sort_entries();
        }
        store
    }

    /// Favorites, newest first.
    pub fn favorites(&self) -> &[Favorite] {
        &self.favorites
    }

    /// Folders, newest first.
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, id: Uuid) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn is_favorite(&self, surah: u32, ayah: u32) -> bool {
        self.favorite(surah, ayah).is_some()
    }

    pub fn favorite(&self, surah: u32, ayah: u32) -> Option<&Favorite> {
        self.favorites
            .iter()
            .find(|f| f.surah == surah && f.ayah == ayah)
    }

    pub async fn add_favorite(&mut self, surah: u32, ayah: u32) {
        if self.is_favorite(surah, ayah) {
            return;
        }
        self.favorites.insert(0, Favorite::new(surah, ayah));
        self.sort_favorites();
        self.persist_favorites().await;
    }

    pub async fn remove_favorite(&mut self, surah: u32, ayah: u32) {
        let before = self.favorites.len();
        self.favorites.retain(|f| !(f.surah == surah && f.ayah == ayah));
        if self.favorites.len() == before {
            return;
        }
        self.persist_favorites().await;
    }

    /// Flips the favorite state and returns the new state.
    ///
    /// Only for the signed-out path; after a remote round trip use
    /// [`Self::set_favorite`] so the change is not applied twice.
    pub async fn toggle_favorite(&mut self, surah: u32, ayah: u32) -> bool {
        if self.is_favorite(surah, ayah) {
            self.remove_favorite(surah, ayah).await;
            false
        } else {
            self.add_favorite(surah, ayah).await;
            true
        }
    }

    /// Sets the exact favorite state for an ayah.
    ///
    /// With `added_at` the favorite gets that timestamp, which is how a
    /// rollback restores the prior entry. Without it a new favorite is stamped
    /// now and an existing one is left alone.
    pub async fn set_favorite(
        &mut self,
        surah: u32,
        ayah: u32,
        is_favorite: bool,
        added_at: Option<DateTime<Utc>>,
    ) {
        if !is_favorite {
            self.remove_favorite(surah, ayah).await;
            return;
        }

        let existing = self
            .favorites
            .iter_mut()
            .find(|f| f.surah == surah && f.ayah == ayah);
        match (existing, added_at) {
            (Some(_), None) => return,
            (Some(favorite), Some(ts)) => {
                if favorite.created_at == ts {
                    return;
                }
                favorite.created_at = ts;
            }
            (None, ts) => {
                let favorite = Favorite::at(surah, ayah, ts.unwrap_or_else(Utc::now));
                self.favorites.insert(0, favorite);
            }
        }
        self.sort_favorites();
        self.persist_favorites().await;
    }

    /// Creates a folder, optionally holding `initial_entry`, and returns its id.
    pub async fn create_folder(&mut self, name: &str, initial_entry: Option<FolderEntry>) -> Uuid {
        let mut folder = Folder::new(name.trim());
        if let Some(entry) = initial_entry {
            folder = folder.with_entry(entry);
        }
        let id = folder.id;

        self.folders.insert(0, folder);
        self.sort_folders();
        self.persist_folders().await;
        id
    }

    /// Saves an ayah into a folder. Re-adding an ayah refreshes its note and
    /// timestamp instead of adding a second entry.
    pub async fn add_ayah_to_folder(
        &mut self,
        surah: u32,
        ayah: u32,
        note: Option<&str>,
        folder_id: Uuid,
    ) -> FolderAddOutcome {
        let Some(folder) = self.folders.iter_mut().find(|f| f.id == folder_id) else {
            tracing::warn!(%folder_id, "Folder not found");
            return FolderAddOutcome::Failed;
        };

        let outcome = match folder
            .entries
            .iter_mut()
            .find(|e| e.surah == surah && e.ayah == ayah)
        {
            Some(entry) => {
                entry.note = normalize_note(note);
                entry.added_at = Utc::now();
                folder.sort_entries();
                FolderAddOutcome::Updated
            }
            None => {
                folder.entries.insert(0, FolderEntry::new(surah, ayah, note));
                FolderAddOutcome::Inserted
            }
        };

        self.persist_folders().await;
        outcome
    }

    /// Removes one entry from a folder. Returns false when either is missing.
    pub async fn remove_entry(&mut self, entry_id: Uuid, folder_id: Uuid) -> bool {
        let Some(folder) = self.folders.iter_mut().find(|f| f.id == folder_id) else {
            return false;
        };
        let before = folder.entries.len();
        folder.entries.retain(|e| e.id != entry_id);
        if folder.entries.len() == before {
            return false;
        }

        self.persist_folders().await;
        true
    }

    pub async fn delete_folder(&mut self, folder_id: Uuid) -> bool {
        let before = self.folders.len();
        self.folders.retain(|f| f.id != folder_id);
        if self.folders.len() == before {
            return false;
        }

        self.persist_folders().await;
        true
    }

    /// Rewrites the note of every folder entry for (`surah`, `ayah`) across
    /// all folders. Returns how many entries changed.
    pub async fn update_note_snapshot(&mut self, surah: u32, ayah: u32, note: Option<&str>) -> usize {
        let note = normalize_note(note);
        let mut changed = 0;
        for entry in self
            .folders
            .iter_mut()
            .flat_map(|f| f.entries.iter_mut())
            .filter(|e| e.surah == surah && e.ayah == ayah)
        {
            if entry.note != note {
                entry.note = note.clone();
                changed += 1;
            }
        }

        if changed > 0 {
            self.persist_folders().await;
        }
        changed
    }

    fn sort_favorites(&mut self) {
        self.favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    fn sort_folders(&mut self) {
        self.folders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    async fn persist_favorites(&self) {
        if let Err(e) = self.storage.save(DocType::Favorites, &self.favorites).await {
            tracing::warn!("Failed to save favorites: {}", e);
        }
    }

    async fn persist_folders(&self) {
        if let Err(e) = self.storage.save(DocType::Folders, &self.folders).await {
            tracing::warn!("Failed to save folders: {}", e);
        }
    }
}

async fn load_list<T: serde::de::DeserializeOwned>(storage: &LocalStorage, doc_type: DocType) -> Vec<T> {
    match storage.load::<Vec<T>>(doc_type).await {
        Ok(Some(items)) => {
            tracing::info!("Loaded {} item(s) from {}", items.len(), doc_type.filename());
            items
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!("Ignoring {}: {}", doc_type.filename(), e);
            Vec::new()
        }
    }
}
