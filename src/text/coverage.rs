//! Bookkeeping of which text scopes have already been fetched.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use super::{TextMap, TextScope};

/// Which surahs and ayah ranges are known to be loaded.
///
/// Once `all_loaded` is set the per-surah tracking is never consulted again.
/// Recorded ranges are kept sorted and merged, so checks walk intervals
/// rather than individual ayahs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coverage {
    all_loaded: bool,
    loaded_surahs: BTreeSet<u32>,
    loaded_ranges: BTreeMap<u32, Vec<RangeInclusive<u32>>>,
}

impl Coverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_all_loaded(&self) -> bool {
        self.all_loaded
    }

    pub fn is_surah_loaded(&self, surah: u32) -> bool {
        self.all_loaded || self.loaded_surahs.contains(&surah)
    }

    /// An ayah is covered when its surah is loaded, when its text is cached,
    /// or when an earlier range fetch spanning it came back without it.
    pub fn is_ayah_covered(&self, surah: u32, ayah: u32, text: &TextMap) -> bool {
        self.is_surah_loaded(surah)
            || text.get(&surah).is_some_and(|ayahs| ayahs.contains_key(&ayah))
            || self.ranges(surah).iter().any(|r| r.contains(&ayah))
    }

    fn ranges(&self, surah: u32) -> &[RangeInclusive<u32>] {
        self.loaded_ranges
            .get(&surah)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether every ayah of `range` lies in a recorded range or has cached text.
    fn is_range_covered(&self, surah: u32, range: &RangeInclusive<u32>, text: &TextMap) -> bool {
        if range.is_empty() || self.is_surah_loaded(surah) {
            return true;
        }
        let cached = text.get(&surah);
        let end = *range.end();
        let mut cursor = *range.start();

        for loaded in self.ranges(surah) {
            if *loaded.end() < cursor {
                continue;
            }
            if *loaded.start() > end {
                break;
            }
            if *loaded.start() > cursor && !all_cached(cached, cursor, *loaded.start() - 1) {
                return false;
            }
            match loaded.end().checked_add(1) {
                Some(next) if next <= end => cursor = next,
                _ => return true,
            }
        }
        all_cached(cached, cursor, end)
    }

    /// Whether `scope` requires a remote fetch given the cached `text`.
    pub fn needs_fetch(&self, scope: &TextScope, text: &TextMap) -> bool {
        if self.all_loaded {
            return false;
        }
        match scope {
            TextScope::All => true,
            TextScope::Surah(surah) => !self.loaded_surahs.contains(surah),
            TextScope::Ayahs { surah, range } => !self.is_range_covered(*surah, range, text),
        }
    }

    /// Records a completed fetch of `scope`. `text` is the cache after merging.
    pub fn record(&mut self, scope: &TextScope, text: &TextMap) {
        match scope {
            TextScope::All => {
                self.all_loaded = true;
                self.loaded_surahs.extend(text.keys().copied());
            }
            TextScope::Surah(surah) => {
                self.loaded_surahs.insert(*surah);
            }
            TextScope::Ayahs { surah, range } => {
                if !range.is_empty() {
                    merge_range(self.loaded_ranges.entry(*surah).or_default(), range.clone());
                }
            }
        }
    }
}

/// True when `text` holds every ayah in `start..=end`.
fn all_cached(text: Option<&BTreeMap<u32, String>>, start: u32, end: u32) -> bool {
    let Some(ayahs) = text else {
        return false;
    };
    let wanted = u64::from(end - start) + 1;
    ayahs.range(start..=end).count() as u64 == wanted
}

/// Inserts `range` keeping `ranges` sorted, with overlapping or adjacent
/// ranges joined.
fn merge_range(ranges: &mut Vec<RangeInclusive<u32>>, range: RangeInclusive<u32>) {
    ranges.push(range);
    ranges.sort_by_key(|r| *r.start());

    let mut merged: Vec<RangeInclusive<u32>> = Vec::with_capacity(ranges.len());
    for r in ranges.drain(..) {
        match merged.last_mut() {
            Some(last) if *r.start() <= last.end().saturating_add(1) => {
                if r.end() > last.end() {
                    *last = *last.start()..=*r.end();
                }
            }
            _ => merged.push(r),
        }
    }
    *ranges = merged;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_with(surah: u32, ayahs: &[u32]) -> TextMap {
        let mut text = TextMap::new();
        let entry = text.entry(surah).or_default();
        for ayah in ayahs {
            entry.insert(*ayah, format!("ayah {}", ayah));
        }
        text
    }

    #[test]
    fn test_all_scope_always_fetches_until_loaded() {
        let mut coverage = Coverage::new();
        let text = TextMap::new();
        assert!(coverage.needs_fetch(&TextScope::All, &text));

        coverage.record(&TextScope::All, &text);

        assert!(!coverage.needs_fetch(&TextScope::All, &text));
        assert!(!coverage.needs_fetch(&TextScope::Surah(9), &text));
        assert!(!coverage.needs_fetch(&TextScope::ayahs(9, 1..=3), &text));
    }

    #[test]
    fn test_all_scope_marks_cached_surahs() {
        let mut coverage = Coverage::new();
        let text = text_with(3, &[1]);
        coverage.record(&TextScope::All, &text);
        assert!(coverage.loaded_surahs.contains(&3));
    }

    #[test]
    fn test_surah_scope() {
        let mut coverage = Coverage::new();
        let text = TextMap::new();
        assert!(coverage.needs_fetch(&TextScope::Surah(1), &text));

        coverage.record(&TextScope::Surah(1), &text);

        assert!(!coverage.needs_fetch(&TextScope::Surah(1), &text));
        assert!(coverage.needs_fetch(&TextScope::Surah(2), &text));
        assert!(!coverage.needs_fetch(&TextScope::ayahs(1, 1..=500), &text));
    }

    #[test]
    fn test_range_scope_uses_cached_ayahs() {
        let coverage = Coverage::new();
        let text = text_with(2, &[1, 2, 3]);
        assert!(!coverage.needs_fetch(&TextScope::ayahs(2, 1..=3), &text));
        assert!(coverage.needs_fetch(&TextScope::ayahs(2, 2..=4), &text));
    }

    #[test]
    fn test_adjacent_ranges_merge() {
        let mut coverage = Coverage::new();
        let text = TextMap::new();
        coverage.record(&TextScope::ayahs(2, 6..=10), &text);
        coverage.record(&TextScope::ayahs(2, 1..=5), &text);
        coverage.record(&TextScope::ayahs(2, 3..=4), &text);

        assert_eq!(coverage.ranges(2).to_vec(), vec![1..=10]);
        assert!(!coverage.needs_fetch(&TextScope::ayahs(2, 3..=8), &text));
        assert!(coverage.needs_fetch(&TextScope::ayahs(2, 3..=11), &text));
    }

    #[test]
    fn test_gap_between_ranges_filled_by_cached_text() {
        let mut coverage = Coverage::new();
        let mut text = text_with(5, &[4]);
        coverage.record(&TextScope::ayahs(5, 1..=3), &text);
        coverage.record(&TextScope::ayahs(5, 6..=9), &text);

        assert!(coverage.needs_fetch(&TextScope::ayahs(5, 1..=9), &text));

        text.entry(5).or_default().insert(5, "ayah 5".to_string());
        assert!(!coverage.needs_fetch(&TextScope::ayahs(5, 1..=9), &text));
        assert!(!coverage.needs_fetch(&TextScope::ayahs(5, 4..=5), &text));
    }

    #[test]
    fn test_open_ended_range_checks_by_interval() {
        let mut coverage = Coverage::new();
        let text = text_with(2, &[1, 2]);
        assert!(coverage.needs_fetch(&TextScope::ayahs(2, 1..=u32::MAX), &text));

        coverage.record(&TextScope::ayahs(2, 1..=u32::MAX), &text);

        let started = std::time::Instant::now();
        assert!(!coverage.needs_fetch(&TextScope::ayahs(2, 1..=u32::MAX), &text));
        assert!(coverage.needs_fetch(&TextScope::ayahs(2, 0..=u32::MAX), &text));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_empty_range_needs_no_fetch() {
        let coverage = Coverage::new();
        #[allow(clippy::reversed_empty_ranges)]
        let scope = TextScope::ayahs(1, 5..=4);
        assert!(!coverage.needs_fetch(&scope, &TextMap::new()));
    }

    #[test]
    fn test_range_scope_never_marks_whole_surah() {
        let mut coverage = Coverage::new();
        let text = TextMap::new();
        coverage.record(&TextScope::ayahs(4, 10..=12), &text);

        assert!(!coverage.needs_fetch(&TextScope::ayahs(4, 10..=12), &text));
        assert!(!coverage.needs_fetch(&TextScope::ayahs(4, 11..=11), &text));
        assert!(coverage.needs_fetch(&TextScope::ayahs(4, 12..=13), &text));
        assert!(coverage.needs_fetch(&TextScope::Surah(4), &text));
    }
}
