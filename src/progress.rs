//! Per-surah reading progress, stored locally only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::AyahKey;
use crate::storage::{DocType, LocalStorage};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ProgressDocument {
    #[serde(default)]
    highest: BTreeMap<u32, u32>,
    #[serde(default)]
    last_read: Option<AyahKey>,
}

/// Tracks the furthest ayah read in each surah and where reading stopped.
pub struct ReadingProgressStore {
    storage: LocalStorage,
    doc: ProgressDocument,
}

impl ReadingProgressStore {
    pub async fn load(storage: LocalStorage) -> Self {
        let doc = match storage.load::<ProgressDocument>(DocType::ReadingProgress).await {
            Ok(doc) => doc.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Ignoring reading progress: {}", e);
                ProgressDocument::default()
            }
        };
        Self { storage, doc }
    }

    pub fn highest_ayah_read(&self, surah: u32) -> u32 {
        self.doc.highest.get(&surah).copied().unwrap_or(0)
    }

    /// Fraction of the surah read, in `[0, 1]`. Zero for an empty surah.
    pub fn progress(&self, surah: u32, total_ayahs: u32) -> f64 {
        if total_ayahs == 0 {
            return 0.0;
        }
        let highest = self.highest_ayah_read(surah).min(total_ayahs);
        f64::from(highest) / f64::from(total_ayahs)
    }

    pub fn last_read(&self) -> Option<AyahKey> {
        self.doc.last_read
    }

    /// Records that `ayah` of `surah` was read.
    ///
    /// The last-read position always moves; the per-surah high-water mark is
    /// clamped to `total_ayahs` and never goes down.
    pub async fn mark_read(&mut self, surah: u32, ayah: u32, total_ayahs: u32) {
        let clamped = ayah.min(total_ayahs);
        let position = Some(AyahKey::new(surah, clamped));
        let raised = clamped > self.highest_ayah_read(surah);

        if !raised && self.doc.last_read == position {
            return;
        }
        if raised {
            self.doc.highest.insert(surah, clamped);
        }
        self.doc.last_read = position;
        self.persist().await;
    }

    /// Forgets all progress, including the last-read position.
    pub async fn reset(&mut self) {
        self.doc = ProgressDocument::default();
        self.persist().await;
    }

    async fn persist(&self) {
        if let Err(e) = self.storage.save(DocType::ReadingProgress, &self.doc).await {
            tracing::warn!("Failed to save reading progress: {}", e);
        }
    }
}
