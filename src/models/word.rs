use serde::{Deserialize, Serialize};

use super::passage::AyahKey;

/// One word of an ayah as stored in the remote `translation` table.
///
/// Positions increase within an ayah; the Arabic and Albanian tokens at the
/// same position are aligned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordFragment {
    pub surah: u32,
    pub ayah: u32,
    pub position: u32,
    #[serde(default)]
    pub arabic_word: String,
    #[serde(default)]
    pub albanian_word: String,
}

impl WordFragment {
    pub fn new(
        surah: u32,
        ayah: u32,
        position: u32,
        arabic_word: impl Into<String>,
        albanian_word: impl Into<String>,
    ) -> Self {
        Self {
            surah,
            ayah,
            position,
            arabic_word: arabic_word.into(),
            albanian_word: albanian_word.into(),
        }
    }

    pub fn key(&self) -> AyahKey {
        AyahKey::new(self.surah, self.ayah)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_row_with_missing_translation() {
        let word: WordFragment = serde_json::from_str(
            r#"{"surah":1,"ayah":1,"position":1,"arabic_word":"بِسْمِ"}"#,
        )
        .unwrap();
        assert_eq!(word.arabic_word, "بِسْمِ");
        assert!(word.albanian_word.is_empty());
        assert_eq!(word.key(), AyahKey::new(1, 1));
    }
}
