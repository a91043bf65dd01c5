use serde::{Deserialize, Serialize};

/// A row of the remote `arabic_dictionary` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub id: String,
    pub word: String,
    pub transliteration: String,
    #[serde(default)]
    pub meanings: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
