use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::passage::AyahKey;

/// A user's note on one ayah.
///
/// The same shape is used for rows of the remote `notes` table and for the
/// local `notes.json` document. There is at most one note per
/// (owner, surah, ayah).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub surah: u32,
    pub ayah: u32,
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(owner_id: Uuid, surah: u32, ayah: u32, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            surah,
            ayah,
            title: None,
            text: text.into(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn key(&self) -> AyahKey {
        AyahKey::new(self.surah, self.ayah)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => writeln!(f, "{} ({})", title, self.key())?,
            None => writeln!(f, "{}", self.key())?,
        }
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_new() {
        let owner = Uuid::new_v4();
        let note = Note::new(owner, 2, 255, "Ayat al-Kursi");
        assert_eq!(note.owner_id, owner);
        assert_eq!(note.key(), AyahKey::new(2, 255));
        assert!(note.title.is_none());
    }

    #[test]
    fn test_note_row_uses_user_id_column() {
        let note = Note::new(Uuid::nil(), 1, 1, "text").with_title("Opening");
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["user_id"], Uuid::nil().to_string());
        assert_eq!(json["title"], "Opening");
        assert!(json.get("owner_id").is_none());
    }

    #[test]
    fn test_note_display() {
        let note = Note::new(Uuid::nil(), 1, 2, "Praise").with_title("Al-Fatiha 2");
        let output = format!("{}", note);
        assert!(output.contains("Al-Fatiha 2 (1:2)"));
        assert!(output.contains("Praise"));
    }
}
