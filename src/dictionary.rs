//! Arabic word lookup table.

use std::collections::HashMap;

use crate::error::SyncError;
use crate::gateway::{select_as, Query, RemoteGateway};
use crate::models::DictionaryEntry;
use crate::text::ATTACHED_PUNCTUATION;

const DICTIONARY_TABLE: &str = "arabic_dictionary";

/// Dictionary entries keyed by normalized word.
///
/// Built once (usually with [`ArabicDictionary::load`]) and passed by
/// reference to whatever needs lookups.
#[derive(Debug, Clone, Default)]
pub struct ArabicDictionary {
    entries: HashMap<String, DictionaryEntry>,
}

impl ArabicDictionary {
    /// Builds the table. Later entries win when two words normalize alike.
    pub fn new(entries: impl IntoIterator<Item = DictionaryEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (Self::normalize(&entry.word), entry))
            .collect();
        Self { entries }
    }

    /// Fetches every entry of the remote dictionary table.
    pub async fn load(gateway: &dyn RemoteGateway) -> Result<Self, SyncError> {
        let query = Query::new().order("word", true);
        let entries: Vec<DictionaryEntry> = select_as(gateway, DICTIONARY_TABLE, &query).await?;
        tracing::info!("Loaded {} dictionary entries", entries.len());
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up `word`, retrying once without surrounding punctuation.
    pub fn lookup(&self, word: &str) -> Option<&DictionaryEntry> {
        if let Some(entry) = self.entries.get(&Self::normalize(word)) {
            return Some(entry);
        }

        let trimmed = word.trim_matches(is_trimmable);
        if trimmed == word {
            return None;
        }
        self.entries.get(&Self::normalize(trimmed))
    }

    /// Strips harakat, Quranic annotation marks and the dagger alif, and folds
    /// alef variants to a bare alef.
    pub fn normalize(word: &str) -> String {
        word.chars()
            .filter(|c| !is_diacritic(*c))
            .map(|c| match c {
                'ٱ' | 'آ' | 'إ' | 'أ' => 'ا',
                other => other,
            })
            .collect()
    }
}

fn is_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}')
}

fn is_trimmable(c: char) -> bool {
    c.is_whitespace()
        || c.is_ascii_punctuation()
        || ATTACHED_PUNCTUATION.contains(&c)
        || matches!(c, '«' | '»' | '﴾' | '﴿' | '“' | '”')
}
