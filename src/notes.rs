//! Notes store with remote persistence when signed in and a local
//! `notes.json` document otherwise.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::SyncError;
use crate::gateway::{select_as, upsert_as, Query, RemoteGateway};
use crate::models::Note;
use crate::session::{OwnerId, Session};
use crate::storage::{DocType, LocalStorage};

const NOTES_TABLE: &str = "notes";
const CONFLICT_KEYS: [&str; 3] = ["user_id", "surah", "ayah"];

/// Owner id stamped on notes written while signed out.
pub const LOCAL_OWNER: Uuid = Uuid::nil();

/// Upsert payload for the remote `notes` table; the service keeps the id.
#[derive(Debug, Serialize)]
struct NoteUpsert<'a> {
    user_id: Uuid,
    surah: u32,
    ayah: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    text: &'a str,
    updated_at: DateTime<Utc>,
}

pub struct NotesStore {
    gateway: Arc<dyn RemoteGateway>,
    storage: LocalStorage,
    session: Session,
    notes: Vec<Note>,
    local_notes: Vec<Note>,
    loading: bool,
    refresh_error: Option<String>,
}

impl NotesStore {
    /// Creates an anonymous store with the local document already loaded.
    ///
    /// A missing or unreadable document is treated as an empty list.
    pub async fn load(gateway: Arc<dyn RemoteGateway>, storage: LocalStorage) -> Self {
        let local_notes = match storage.load::<Vec<Note>>(DocType::Notes).await {
            Ok(Some(mut notes)) => {
                sort_notes(&mut notes);
                tracing::info!("Loaded {} local note(s)", notes.len());
                notes
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Ignoring local notes: {}", e);
                Vec::new()
            }
        };

        Self {
            gateway,
            storage,
            session: Session::Anonymous,
            notes: local_notes.clone(),
            local_notes,
            loading: false,
            refresh_error: None,
        }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    /// Notes visible for the current session, ordered by surah then ayah.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, surah: u32, ayah: u32) -> Option<&Note> {
        self.notes.iter().find(|n| n.surah == surah && n.ayah == ayah)
    }

    pub fn notes_for_surah(&self, surah: u32) -> Vec<&Note> {
        self.notes.iter().filter(|n| n.surah == surah).collect()
    }

    pub fn grouped_by_surah(&self) -> BTreeMap<u32, Vec<&Note>> {
        let mut grouped: BTreeMap<u32, Vec<&Note>> = BTreeMap::new();
        for note in &self.notes {
            grouped.entry(note.surah).or_default().push(note);
        }
        grouped
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last background refresh that failed, if the list shown
    /// is older than the remote copy. Cleared by the next successful refresh.
    pub fn refresh_error(&self) -> Option<&str> {
        self.refresh_error.as_deref()
    }

    /// Switches the store to `session` and reloads the matching list.
    pub async fn apply_session(&mut self, session: Session) {
        self.session = session;
        match session {
            Session::Anonymous => {
                self.loading = false;
                self.refresh_error = None;
                self.notes = self.local_notes.clone();
            }
            Session::Authenticated(_) => {
                self.fetch_all().await;
            }
        }
    }

    /// Reloads the visible list.
    ///
    /// Signed out this serves the local list without touching the network.
    /// Signed in it replaces the list with the owner's remote notes; a failed
    /// refresh keeps the previous list and is recorded in [`Self::refresh_error`].
    pub async fn fetch_all(&mut self) -> &[Note] {
        let owner = match self.session {
            Session::Anonymous => {
                self.notes = self.local_notes.clone();
                return &self.notes;
            }
            Session::Authenticated(owner) => owner,
        };

        self.loading = true;
        match self.fetch_remote(owner).await {
            Ok(mut notes) => {
                sort_notes(&mut notes);
                tracing::debug!("Fetched {} remote note(s)", notes.len());
                self.notes = notes;
                self.refresh_error = None;
            }
            Err(e) => {
                tracing::warn!("Failed to refresh notes: {}", e);
                self.refresh_error = Some(e.to_string());
            }
        }
        self.loading = false;

        &self.notes
    }

    async fn fetch_remote(&self, owner: OwnerId) -> Result<Vec<Note>, SyncError> {
        let query = Query::new()
            .eq("user_id", owner.to_string())
            .order("surah", true)
            .order("ayah", true);
        Ok(select_as(self.gateway.as_ref(), NOTES_TABLE, &query).await?)
    }

    /// Saves the note for (`surah`, `ayah`), replacing any existing one.
    ///
    /// Without a `title` the existing note's title is kept. Signed in, the
    /// list changes only after the service confirms the write. Signed out,
    /// the note goes to the local document and a failed write leaves the
    /// list unchanged.
    pub async fn upsert_note(
        &mut self,
        surah: u32,
        ayah: u32,
        title: Option<&str>,
        text: &str,
    ) -> Result<Note, SyncError> {
        let existing = self.note(surah, ayah);
        let title = title
            .map(str::to_string)
            .or_else(|| existing.and_then(|n| n.title.clone()));

        match self.session {
            Session::Authenticated(owner) => {
                let payload = NoteUpsert {
                    user_id: owner.as_uuid(),
                    surah,
                    ayah,
                    title: title.as_deref(),
                    text,
                    updated_at: Utc::now(),
                };
                let stored: Vec<Note> = upsert_as(
                    self.gateway.as_ref(),
                    NOTES_TABLE,
                    &[payload],
                    &CONFLICT_KEYS,
                )
                .await?;
                let note = stored.into_iter().next().ok_or_else(|| {
                    SyncError::Decode(format!("{} upsert returned no row", NOTES_TABLE))
                })?;

                upsert_into(&mut self.notes, note.clone());
                Ok(note)
            }
            Session::Anonymous => {
                let mut note = Note::new(LOCAL_OWNER, surah, ayah, text);
                note.title = title;
                if let Some(prior) = self.local_notes.iter().find(|n| n.key() == note.key()) {
                    note.id = prior.id;
                }

                let mut updated = self.local_notes.clone();
                upsert_into(&mut updated, note.clone());
                self.storage.save(DocType::Notes, &updated).await?;

                self.local_notes = updated;
                self.notes = self.local_notes.clone();
                Ok(note)
            }
        }
    }

    /// Imports a notes document into the local list, replacing notes with
    /// the same surah and ayah. Returns the number of notes imported.
    pub async fn import_local(&mut self, path: &Path) -> Result<usize, SyncError> {
        let imported: Vec<Note> = LocalStorage::read_external(path).await?;
        let count = imported.len();

        let mut updated = self.local_notes.clone();
        for mut note in imported {
            note.owner_id = LOCAL_OWNER;
            upsert_into(&mut updated, note);
        }
        self.storage.save(DocType::Notes, &updated).await?;
        self.local_notes = updated;

        if !self.session.is_authenticated() {
            self.notes = self.local_notes.clone();
        }
        tracing::info!("Imported {} note(s) from {}", count, path.display());
        Ok(count)
    }

    /// Spawns a task that applies every session published on `sessions`,
    /// starting with the current one.
    ///
    /// The task holds only a weak reference and ends once the store is
    /// dropped or the sender goes away. Dropping the returned guard stops it.
    pub fn observe_auth_changes(
        store: &Arc<Mutex<NotesStore>>,
        mut sessions: watch::Receiver<Session>,
    ) -> AuthObserver {
        let store: Weak<Mutex<NotesStore>> = Arc::downgrade(store);
        let handle = tokio::spawn(async move {
            loop {
                let session = *sessions.borrow_and_update();
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.lock().await.apply_session(session).await;
                drop(store);

                if sessions.changed().await.is_err() {
                    break;
                }
            }
            tracing::debug!("Auth observer stopped");
        });
        AuthObserver { handle }
    }
}

/// Handle to the task started by [`NotesStore::observe_auth_changes`].
#[derive(Debug)]
pub struct AuthObserver {
    handle: JoinHandle<()>,
}

impl AuthObserver {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for AuthObserver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn sort_notes(notes: &mut [Note]) {
    notes.sort_by_key(|n| n.key());
}

fn upsert_into(notes: &mut Vec<Note>, note: Note) {
    match notes.iter_mut().find(|n| n.key() == note.key()) {
        Some(existing) => *existing = note,
        None => notes.push(note),
    }
    sort_notes(notes);
}
