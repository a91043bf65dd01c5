//! Rebuilding ayah text from word fragments.

use std::collections::BTreeMap;

use super::TextMap;
use crate::models::WordFragment;

/// Marks that attach to the preceding word: Latin sentence punctuation plus
/// the Arabic comma, Arabic semicolon and Arabic full stop.
pub const ATTACHED_PUNCTUATION: [char; 9] = [',', '.', ';', ':', '?', '!', '،', '؛', '۔'];

/// Joins word tokens into display text.
///
/// Tokens are joined with single spaces, any spaces in front of a mark in
/// [`ATTACHED_PUNCTUATION`] are dropped, runs of spaces collapse to one and
/// the result is trimmed. Applying it to its own output changes nothing.
pub fn combine_words<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = words.into_iter().collect::<Vec<_>>().join(" ");

    let mut out = String::with_capacity(joined.len());
    let mut pending_space = false;
    for c in joined.chars() {
        if c == ' ' {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() && !ATTACHED_PUNCTUATION.contains(&c) {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out.trim().to_string()
}

/// Groups fragments by surah and ayah and combines each ayah's Arabic words
/// in position order.
pub fn aggregate_arabic(words: &[WordFragment]) -> TextMap {
    let mut grouped: BTreeMap<u32, BTreeMap<u32, Vec<&WordFragment>>> = BTreeMap::new();
    for word in words {
        grouped
            .entry(word.surah)
            .or_default()
            .entry(word.ayah)
            .or_default()
            .push(word);
    }

    grouped
        .into_iter()
        .map(|(surah, ayahs)| {
            let texts = ayahs
                .into_iter()
                .map(|(ayah, mut fragments)| {
                    fragments.sort_by_key(|w| w.position);
                    let text = combine_words(fragments.iter().map(|w| w.arabic_word.as_str()));
                    (ayah, text)
                })
                .collect();
            (surah, texts)
        })
        .collect()
}
