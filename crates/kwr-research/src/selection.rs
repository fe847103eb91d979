//! Choosing which non-primary candidates are worth paying to enrich.

use std::collections::{HashMap, HashSet};

use kwr_core::{KeywordCandidate, KeywordSource};
use kwr_sources::MAX_ENRICHMENT_BATCH;

use crate::dedup::DedupMap;

/// Minimum confidence (inclusive) for a candidate to be sent to enrichment.
pub const ENRICHMENT_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Candidates from one source that passed the filter.
#[derive(Debug, Default)]
pub(crate) struct EnrichmentBatch {
    /// Keyword strings to send, in candidate order.
    pub keywords: Vec<String>,
    /// Normalized key to the source of the candidate that was selected.
    pub sources: HashMap<String, KeywordSource>,
    /// Candidates excluded for any reason.
    pub skipped: usize,
    /// The part of `skipped` whose key was already known or already selected.
    pub duplicates: usize,
}

impl EnrichmentBatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Keeps candidates with confidence at or above the threshold whose key is
/// neither in `known` nor already selected earlier in this batch.
///
/// Every other candidate counts as skipped. A key collision also counts as a
/// duplicate, whatever the candidate's confidence. A batch never exceeds the
/// provider's per-call limit; candidates past it are skipped too.
pub(crate) fn select_for_enrichment(
    candidates: &[KeywordCandidate],
    known: &DedupMap,
) -> EnrichmentBatch {
    let mut batch = EnrichmentBatch::default();
    let mut selected: HashSet<String> = HashSet::new();

    for candidate in candidates {
        let key = candidate.normalized_key();
        if key.is_empty() {
            batch.skipped += 1;
            continue;
        }
        if known.contains(&key) || selected.contains(&key) {
            batch.skipped += 1;
            batch.duplicates += 1;
            continue;
        }
        if candidate.effective_confidence() < ENRICHMENT_CONFIDENCE_THRESHOLD {
            batch.skipped += 1;
            continue;
        }
        if batch.keywords.len() >= MAX_ENRICHMENT_BATCH {
            tracing::warn!(
                keyword = %candidate.keyword,
                limit = MAX_ENRICHMENT_BATCH,
                "enrichment batch full, skipping candidate"
            );
            batch.skipped += 1;
            continue;
        }
        selected.insert(key.clone());
        batch.keywords.push(candidate.keyword.clone());
        batch.sources.insert(key, candidate.source);
    }
    batch
}

#[cfg(test)]
mod tests {
    use kwr_core::{KeywordMetrics, UnifiedKeyword};

    use super::*;

    fn candidate(keyword: &str, source: KeywordSource, confidence: Option<f64>) -> KeywordCandidate {
        let c = KeywordCandidate::new(keyword, source);
        match confidence {
            Some(v) => c.with_confidence(v),
            None => c,
        }
    }

    fn known(keywords: &[&str]) -> DedupMap {
        let mut map = DedupMap::default();
        for k in keywords {
            map.insert_if_absent(UnifiedKeyword::from_metrics(
                (*k).to_string(),
                KeywordSource::Primary,
                &KeywordMetrics::default(),
            ));
        }
        map
    }

    #[test]
    fn threshold_is_inclusive() {
        let candidates = vec![
            candidate("exact", KeywordSource::LlmExtracted, Some(0.8)),
            candidate("below", KeywordSource::LlmExtracted, Some(0.79)),
        ];
        let batch = select_for_enrichment(&candidates, &DedupMap::default());
        assert_eq!(batch.keywords, vec!["exact".to_string()]);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.duplicates, 0);
    }

    #[test]
    fn missing_confidence_is_untrusted() {
        let candidates = vec![candidate("mime type list", KeywordSource::RelatedSearch, None)];
        let batch = select_for_enrichment(&candidates, &DedupMap::default());
        assert!(batch.is_empty());
        assert_eq!(batch.skipped, 1);
    }

    #[test]
    fn known_keys_are_skipped() {
        let candidates = vec![candidate("MIME Types ", KeywordSource::Autosuggest, Some(1.0))];
        let batch = select_for_enrichment(&candidates, &known(&["mime types"]));
        assert!(batch.is_empty());
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.duplicates, 1);
    }

    #[test]
    fn low_confidence_repeat_of_known_key_is_a_duplicate() {
        let candidates = vec![
            candidate("Mime Types", KeywordSource::RelatedSearch, None),
            candidate("mime type list", KeywordSource::RelatedSearch, None),
        ];
        let batch = select_for_enrichment(&candidates, &known(&["mime types"]));
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.duplicates, 1);
    }

    #[test]
    fn batch_is_capped_at_provider_limit() {
        let candidates: Vec<KeywordCandidate> = (0..105)
            .map(|i| candidate(&format!("kw {i}"), KeywordSource::LlmExtracted, Some(0.95)))
            .collect();
        let batch = select_for_enrichment(&candidates, &DedupMap::default());
        assert_eq!(batch.keywords.len(), MAX_ENRICHMENT_BATCH);
        assert_eq!(batch.skipped, 5);
        assert_eq!(batch.duplicates, 0);
    }

    #[test]
    fn repeats_within_a_batch_are_skipped() {
        let candidates = vec![
            candidate("mime types explained", KeywordSource::Autosuggest, Some(1.0)),
            candidate("Mime Types Explained", KeywordSource::Autosuggest, Some(1.0)),
        ];
        let batch = select_for_enrichment(&candidates, &DedupMap::default());
        assert_eq!(batch.keywords, vec!["mime types explained".to_string()]);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.duplicates, 1);
        assert_eq!(
            batch.sources.get("mime types explained"),
            Some(&KeywordSource::Autosuggest)
        );
    }
}
