//! Text cache for Arabic and translation text.
//!
//! Arabic text is not bundled with the app; it is rebuilt from the word
//! fragments of the remote `translation` table. Fetches are tracked by
//! [`Coverage`] so that a scope is requested from the service at most once.

mod aggregate;
mod cache;
mod coverage;

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

pub use aggregate::{aggregate_arabic, combine_words, ATTACHED_PUNCTUATION};
pub use cache::{TextCache, TextFetch};
pub use coverage::Coverage;

/// surah -> ayah -> text
pub type TextMap = BTreeMap<u32, BTreeMap<u32, String>>;

/// What part of the text a fetch asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextScope {
    /// Every surah.
    All,
    /// One whole surah.
    Surah(u32),
    /// An inclusive ayah range of one surah.
    Ayahs {
        surah: u32,
        range: RangeInclusive<u32>,
    },
}

impl TextScope {
    pub fn ayahs(surah: u32, range: RangeInclusive<u32>) -> Self {
        TextScope::Ayahs { surah, range }
    }
}
