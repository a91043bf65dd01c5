use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-level address of a passage: surah (collection) and ayah (sequence).
///
/// Orders by surah first, then ayah, which is the reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AyahKey {
    pub surah: u32,
    pub ayah: u32,
}

impl AyahKey {
    pub fn new(surah: u32, ayah: u32) -> Self {
        Self { surah, ayah }
    }
}

impl fmt::Display for AyahKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

/// A single ayah with its translation and, once fetched, its Arabic text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passage {
    pub surah: u32,
    pub number: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arabic_text: Option<String>,
}

impl Passage {
    pub fn new(surah: u32, number: u32, text: impl Into<String>) -> Self {
        Self {
            surah,
            number,
            text: text.into(),
            arabic_text: None,
        }
    }

    pub fn key(&self) -> AyahKey {
        AyahKey::new(self.surah, self.number)
    }
}

/// Surah metadata as served by the `surah_metadata` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Surah {
    pub number: u32,
    pub name: String,
    pub ayah_count: u32,
}

impl Surah {
    pub fn new(number: u32, name: impl Into<String>, ayah_count: u32) -> Self {
        Self {
            number,
            name: name.into(),
            ayah_count,
        }
    }

    /// Default note title for an ayah of this surah, e.g. "Al-Fatiha 3".
    pub fn ayah_title(&self, ayah: u32) -> String {
        format!("{} {}", self.name, ayah)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ayah_key_reading_order() {
        let mut keys = vec![AyahKey::new(2, 1), AyahKey::new(1, 7), AyahKey::new(1, 2)];
        keys.sort();
        assert_eq!(
            keys,
            vec![AyahKey::new(1, 2), AyahKey::new(1, 7), AyahKey::new(2, 1)]
        );
    }

    #[test]
    fn test_ayah_key_display() {
        assert_eq!(AyahKey::new(2, 255).to_string(), "2:255");
    }

    #[test]
    fn test_passage_without_arabic_omits_field() {
        let passage = Passage::new(1, 1, "Me emrin e Allahut");
        let json = serde_json::to_string(&passage).unwrap();
        assert!(!json.contains("arabic_text"));
        assert_eq!(passage.key(), AyahKey::new(1, 1));
    }

    #[test]
    fn test_surah_decodes_snake_case_row() {
        let surah: Surah =
            serde_json::from_str(r#"{"number":1,"name":"Al-Fatiha","ayah_count":7}"#).unwrap();
        assert_eq!(surah, Surah::new(1, "Al-Fatiha", 7));
        assert_eq!(surah.ayah_title(3), "Al-Fatiha 3");
    }
}
