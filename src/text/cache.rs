use std::collections::HashMap;
use std::sync::Arc;

use super::{aggregate_arabic, Coverage, TextMap, TextScope};
use crate::error::SyncError;
use crate::gateway::{select_as, Query, RemoteGateway};
use crate::models::{AyahKey, Passage, Surah, WordFragment};

const WORDS_TABLE: &str = "translation";
const SURAH_TABLE: &str = "surah_metadata";

/// Result of [`TextCache::fetch_text`].
#[derive(Debug)]
pub struct TextFetch<'a> {
    /// The whole aggregated cache after the fetch.
    pub text: &'a TextMap,
    /// Ayahs whose text arrived with this call, in reading order.
    pub fetched: Vec<AyahKey>,
}

/// Caches remote text so each scope is fetched once.
///
/// Remote failures propagate; there is no local fallback for text.
pub struct TextCache {
    gateway: Arc<dyn RemoteGateway>,
    arabic: TextMap,
    coverage: Coverage,
    surahs: Option<Vec<Surah>>,
    words: HashMap<AyahKey, Vec<WordFragment>>,
}

impl TextCache {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            arabic: TextMap::new(),
            coverage: Coverage::new(),
            surahs: None,
            words: HashMap::new(),
        }
    }

    /// The aggregated Arabic text cached so far.
    pub fn text(&self) -> &TextMap {
        &self.arabic
    }

    pub fn arabic_text(&self, surah: u32, ayah: u32) -> Option<&str> {
        self.arabic
            .get(&surah)
            .and_then(|ayahs| ayahs.get(&ayah))
            .map(String::as_str)
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// Returns Arabic text for `scope`, fetching from the remote service only
    /// what is not already covered.
    pub async fn fetch_text(&mut self, scope: TextScope) -> Result<TextFetch<'_>, SyncError> {
        if !self.coverage.needs_fetch(&scope, &self.arabic) {
            tracing::debug!(?scope, "Text cache hit");
            return Ok(TextFetch {
                text: &self.arabic,
                fetched: Vec::new(),
            });
        }

        let query = Self::words_query(&scope);
        let words: Vec<WordFragment> =
            select_as(self.gateway.as_ref(), WORDS_TABLE, &query).await?;
        tracing::debug!(?scope, "Fetched {} word(s)", words.len());

        let fresh = aggregate_arabic(&words);
        let mut fetched = Vec::new();
        for (surah, ayahs) in fresh {
            let cached = self.arabic.entry(surah).or_default();
            for (ayah, text) in ayahs {
                fetched.push(AyahKey::new(surah, ayah));
                cached.insert(ayah, text);
            }
        }

        self.coverage.record(&scope, &self.arabic);

        Ok(TextFetch {
            text: &self.arabic,
            fetched,
        })
    }

    fn words_query(scope: &TextScope) -> Query {
        let query = match scope {
            TextScope::All => Query::new(),
            TextScope::Surah(surah) => Query::new().eq("surah", *surah),
            TextScope::Ayahs { surah, range } => Query::new()
                .eq("surah", *surah)
                .gte("ayah", *range.start())
                .lte("ayah", *range.end()),
        };
        query
            .order("surah", true)
            .order("ayah", true)
            .order("position", true)
    }

    /// Word fragments of one ayah, sorted by position. Fetched once per ayah.
    pub async fn translation_words(
        &mut self,
        surah: u32,
        ayah: u32,
    ) -> Result<&[WordFragment], SyncError> {
        let key = AyahKey::new(surah, ayah);
        if !self.words.contains_key(&key) {
            let query = Query::new()
                .eq("surah", surah)
                .eq("ayah", ayah)
                .order("ayah", true)
                .order("position", true);
            let mut words: Vec<WordFragment> =
                select_as(self.gateway.as_ref(), WORDS_TABLE, &query).await?;
            words.sort_by_key(|w| w.position);
            self.words.insert(key, words);
        }
        Ok(self.words.get(&key).map(Vec::as_slice).unwrap_or_default())
    }

    /// Rebuilds an ayah's translation from its words' Albanian tokens.
    pub async fn rebuild_translation(&mut self, surah: u32, ayah: u32) -> Result<String, SyncError> {
        let words = self.translation_words(surah, ayah).await?;
        Ok(words
            .iter()
            .map(|w| w.albanian_word.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    /// Surah metadata ordered by number. Fetched on first call, then served
    /// from memory for the life of the cache.
    pub async fn surah_metadata(&mut self) -> Result<&[Surah], SyncError> {
        if self.surahs.is_none() {
            let query = Query::new().order("number", true);
            let surahs: Vec<Surah> =
                select_as(self.gateway.as_ref(), SURAH_TABLE, &query).await?;
            tracing::debug!("Loaded metadata for {} surah(s)", surahs.len());
            self.surahs = Some(surahs);
        }
        Ok(self.surahs.as_deref().unwrap_or_default())
    }

    /// Fills `passages` with cached Arabic text. Empty text never overwrites.
    pub fn apply_original_text(&self, passages: &mut [Passage]) {
        for passage in passages.iter_mut() {
            if let Some(text) = self.arabic_text(passage.surah, passage.number) {
                if !text.is_empty() {
                    passage.arabic_text = Some(text.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayOp, MemoryGateway};
    use serde_json::json;

    fn word(surah: u32, ayah: u32, position: u32, arabic: &str, albanian: &str) -> serde_json::Value {
        json!({
            "surah": surah,
            "ayah": ayah,
            "position": position,
            "arabic_word": arabic,
            "albanian_word": albanian,
        })
    }

    fn seeded_gateway() -> Arc<MemoryGateway> {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.seed(
            WORDS_TABLE,
            vec![
                word(1, 1, 2, "ٱللَّهِ", "emrin e Allahut"),
                word(1, 1, 1, "بِسْمِ", "Me"),
                word(1, 2, 1, "ٱلْحَمْدُ", "Falënderimi"),
                word(1, 2, 2, "لِلَّهِ", "i qoftë Allahut"),
                word(2, 1, 1, "الم", "Elif Lam Mim"),
                word(2, 2, 1, "ذَٰلِكَ", "Ky"),
            ],
        );
        gateway
    }

    #[tokio::test]
    async fn test_surah_fetch_aggregates_and_reports_fresh_ayahs() {
        let gateway = seeded_gateway();
        let mut cache = TextCache::new(gateway.clone());

        let result = cache.fetch_text(TextScope::Surah(1)).await.unwrap();

        assert_eq!(result.text[&1][&1], "بِسْمِ ٱللَّهِ");
        assert_eq!(result.fetched, vec![AyahKey::new(1, 1), AyahKey::new(1, 2)]);
        assert!(!result.text.contains_key(&2));
    }

    #[tokio::test]
    async fn test_repeated_fetch_makes_no_remote_call() {
        let gateway = seeded_gateway();
        let mut cache = TextCache::new(gateway.clone());

        let first = cache.fetch_text(TextScope::Surah(1)).await.unwrap().text.clone();
        let second = cache.fetch_text(TextScope::Surah(1)).await.unwrap();

        assert!(second.fetched.is_empty());
        assert_eq!(*second.text, first);
        assert_eq!(gateway.calls(GatewayOp::Select), 1);
    }

    #[tokio::test]
    async fn test_range_fetch_then_covered_subrange() {
        let gateway = seeded_gateway();
        let mut cache = TextCache::new(gateway.clone());

        cache.fetch_text(TextScope::ayahs(2, 1..=2)).await.unwrap();
        let again = cache.fetch_text(TextScope::ayahs(2, 2..=2)).await.unwrap();
        assert!(again.fetched.is_empty());
        assert_eq!(gateway.calls(GatewayOp::Select), 1);

        // A range fetch never marks the whole surah loaded.
        cache.fetch_text(TextScope::Surah(2)).await.unwrap();
        assert_eq!(gateway.calls(GatewayOp::Select), 2);
    }

    #[tokio::test]
    async fn test_merge_preserves_untouched_entries() {
        let gateway = seeded_gateway();
        let mut cache = TextCache::new(gateway.clone());

        cache.fetch_text(TextScope::Surah(1)).await.unwrap();
        let result = cache.fetch_text(TextScope::Surah(2)).await.unwrap();

        assert_eq!(result.text[&1].len(), 2);
        assert_eq!(result.text[&2][&1], "الم");
        assert_eq!(result.fetched, vec![AyahKey::new(2, 1), AyahKey::new(2, 2)]);
    }

    #[tokio::test]
    async fn test_empty_result_still_marks_scope_covered() {
        let gateway = seeded_gateway();
        let mut cache = TextCache::new(gateway.clone());

        let result = cache.fetch_text(TextScope::Surah(114)).await.unwrap();
        assert!(result.fetched.is_empty());
        cache.fetch_text(TextScope::Surah(114)).await.unwrap();
        cache.fetch_text(TextScope::ayahs(50, 1..=3)).await.unwrap();
        cache.fetch_text(TextScope::ayahs(50, 2..=3)).await.unwrap();

        assert_eq!(gateway.calls(GatewayOp::Select), 2);
    }

    #[tokio::test]
    async fn test_global_fetch_covers_everything() {
        let gateway = seeded_gateway();
        let mut cache = TextCache::new(gateway.clone());

        let result = cache.fetch_text(TextScope::All).await.unwrap();
        assert_eq!(result.fetched.len(), 4);
        assert!(cache.coverage().is_all_loaded());

        cache.fetch_text(TextScope::All).await.unwrap();
        cache.fetch_text(TextScope::Surah(77)).await.unwrap();
        cache.fetch_text(TextScope::ayahs(1, 1..=9)).await.unwrap();
        assert_eq!(gateway.calls(GatewayOp::Select), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_propagates_and_is_retried() {
        let gateway = seeded_gateway();
        gateway.fail_next(GatewayOp::Select, "network down");
        let mut cache = TextCache::new(gateway.clone());

        let err = cache.fetch_text(TextScope::Surah(1)).await.unwrap_err();
        assert!(matches!(err, SyncError::Remote(ref m) if m == "network down"));
        assert!(!cache.coverage().is_surah_loaded(1));

        let result = cache.fetch_text(TextScope::Surah(1)).await.unwrap();
        assert_eq!(result.fetched.len(), 2);
    }

    #[tokio::test]
    async fn test_translation_words_memoized() {
        let gateway = seeded_gateway();
        let mut cache = TextCache::new(gateway.clone());

        let positions: Vec<u32> = cache
            .translation_words(1, 1)
            .await
            .unwrap()
            .iter()
            .map(|w| w.position)
            .collect();
        assert_eq!(positions, vec![1, 2]);

        let rebuilt = cache.rebuild_translation(1, 1).await.unwrap();
        assert_eq!(rebuilt, "Me emrin e Allahut");
        assert_eq!(gateway.calls(GatewayOp::Select), 1);
    }

    #[tokio::test]
    async fn test_surah_metadata_memoized() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.seed(
            SURAH_TABLE,
            vec![
                json!({"number": 2, "name": "Al-Baqarah", "ayah_count": 286}),
                json!({"number": 1, "name": "Al-Fatiha", "ayah_count": 7}),
            ],
        );
        let mut cache = TextCache::new(gateway.clone());

        let names: Vec<String> = cache
            .surah_metadata()
            .await
            .unwrap()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(names, vec!["Al-Fatiha", "Al-Baqarah"]);

        cache.surah_metadata().await.unwrap();
        assert_eq!(gateway.calls(GatewayOp::Select), 1);
    }

    #[tokio::test]
    async fn test_apply_original_text() {
        let gateway = seeded_gateway();
        let mut cache = TextCache::new(gateway.clone());
        cache.fetch_text(TextScope::Surah(1)).await.unwrap();

        let mut passages = vec![
            Passage::new(1, 1, "Me emrin e Allahut"),
            Passage::new(1, 3, "Mëshiruesit"),
        ];
        cache.apply_original_text(&mut passages);

        assert_eq!(passages[0].arabic_text.as_deref(), Some("بِسْمِ ٱللَّهِ"));
        assert!(passages[1].arabic_text.is_none());
    }
}
