//! Insertion-ordered, first-writer-wins keyword map.

use std::collections::HashMap;

use kwr_core::{normalize_keyword, UnifiedKeyword};

/// Holds at most one [`UnifiedKeyword`] per normalized key.
///
/// Entries are never overwritten. Insertion order is kept so the final
/// stable sort breaks volume ties by arrival order.
#[derive(Debug, Default)]
pub(crate) struct DedupMap {
    index: HashMap<String, usize>,
    entries: Vec<UnifiedKeyword>,
    rejected: usize,
}

impl DedupMap {
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts `keyword` unless its normalized key is already present.
    /// Returns whether it was inserted.
    pub(crate) fn insert_if_absent(&mut self, keyword: UnifiedKeyword) -> bool {
        let key = normalize_keyword(&keyword.keyword);
        if self.index.contains_key(&key) {
            self.rejected += 1;
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(keyword);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of insertions refused because the key already existed.
    pub(crate) fn rejected(&self) -> usize {
        self.rejected
    }

    /// Consumes the map, returning entries by volume, highest first.
    /// Equal volumes keep insertion order.
    pub(crate) fn into_ranked(self) -> Vec<UnifiedKeyword> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.volume.total_cmp(&a.volume));
        entries
    }
}

#[cfg(test)]
mod tests {
    use kwr_core::KeywordSource;

    use super::*;

    fn kw(keyword: &str, volume: f64, source: KeywordSource) -> UnifiedKeyword {
        UnifiedKeyword {
            keyword: keyword.to_string(),
            volume,
            cpc: 0.0,
            competition: 0.0,
            source,
        }
    }

    #[test]
    fn first_writer_wins() {
        let mut map = DedupMap::default();
        assert!(map.insert_if_absent(kw("MIME Types", 500.0, KeywordSource::Primary)));
        assert!(!map.insert_if_absent(kw(" mime types ", 9_000.0, KeywordSource::Autosuggest)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.rejected(), 1);
        let ranked = map.into_ranked();
        assert_eq!(ranked[0].keyword, "MIME Types");
        assert_eq!(ranked[0].source, KeywordSource::Primary);
    }

    #[test]
    fn contains_uses_normalized_keys() {
        let mut map = DedupMap::default();
        map.insert_if_absent(kw("Mime Type", 1.0, KeywordSource::Primary));
        assert!(map.contains("mime type"));
        assert!(!map.contains("Mime Type"), "callers pass normalized keys");
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let mut map = DedupMap::default();
        map.insert_if_absent(kw("a", 10.0, KeywordSource::Primary));
        map.insert_if_absent(kw("b", 50.0, KeywordSource::Primary));
        map.insert_if_absent(kw("c", 10.0, KeywordSource::Autosuggest));
        map.insert_if_absent(kw("d", 10.0, KeywordSource::LlmExtracted));
        let order: Vec<String> = map.into_ranked().into_iter().map(|k| k.keyword).collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
    }
}
