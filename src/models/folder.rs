use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::passage::AyahKey;

/// A user-named collection of bookmarked ayahs.
///
/// Entries are kept newest first; a folder holds at most one entry per ayah.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<FolderEntry>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: FolderEntry) -> Self {
        self.entries.insert(0, entry);
        self
    }

    pub fn entry(&self, surah: u32, ayah: u32) -> Option<&FolderEntry> {
        self.entries
            .iter()
            .find(|e| e.surah == surah && e.ayah == ayah)
    }

    pub(crate) fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
    }
}

/// An ayah saved into a folder, with an optional note snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderEntry {
    pub id: Uuid,
    pub surah: u32,
    pub ayah: u32,
    #[serde(default)]
    pub note: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl FolderEntry {
    pub fn new(surah: u32, ayah: u32, note: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            surah,
            ayah,
            note: normalize_note(note),
            added_at: Utc::now(),
        }
    }

    pub fn key(&self) -> AyahKey {
        AyahKey::new(self.surah, self.ayah)
    }
}

/// Trims note text; empty or whitespace-only text counts as no note.
pub fn normalize_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_normalize_note() {
        assert_eq!(normalize_note(Some("  read daily ")), Some("read daily".into()));
        assert_eq!(normalize_note(Some("   ")), None);
        assert_eq!(normalize_note(None), None);
    }

    #[test]
    fn test_folder_with_entry() {
        let folder = Folder::new("Morning").with_entry(FolderEntry::new(1, 1, Some(" x ")));
        let entry = folder.entry(1, 1).unwrap();
        assert_eq!(entry.note.as_deref(), Some("x"));
        assert!(folder.entry(1, 2).is_none());
    }

    #[test]
    fn test_sort_entries_newest_first() {
        let mut folder = Folder::new("Study");
        let mut older = FolderEntry::new(1, 1, None);
        older.added_at = Utc::now() - Duration::hours(1);
        let newer = FolderEntry::new(1, 2, None);
        folder.entries = vec![older, newer];

        folder.sort_entries();

        assert_eq!(folder.entries[0].ayah, 2);
        assert_eq!(folder.entries[1].ayah, 1);
    }
}
