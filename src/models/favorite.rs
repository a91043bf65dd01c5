use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::passage::AyahKey;

/// A starred ayah in the local bookmark store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Favorite {
    pub surah: u32,
    pub ayah: u32,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(surah: u32, ayah: u32) -> Self {
        Self::at(surah, ayah, Utc::now())
    }

    pub fn at(surah: u32, ayah: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            surah,
            ayah,
            created_at,
        }
    }

    pub fn key(&self) -> AyahKey {
        AyahKey::new(self.surah, self.ayah)
    }
}

/// A row of the remote `favourites` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub surah: u32,
    pub ayah: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FavoriteRow {
    /// Insert payload; the service assigns the id and timestamp.
    pub fn insert(user_id: Uuid, surah: u32, ayah: u32) -> Self {
        Self {
            id: None,
            user_id,
            surah,
            ayah,
            created_at: None,
        }
    }
}

/// A row of the remote `v_favourites_with_text` view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteViewRow {
    pub surah: u32,
    pub ayah: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub arabic_ayah_text: Option<String>,
    #[serde(default)]
    pub albanian_ayah_text: Option<String>,
}
