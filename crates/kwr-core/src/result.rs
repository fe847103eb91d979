//! Output types of an aggregation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keyword::{KeywordMetrics, KeywordSource};

/// The final merged record for one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedKeyword {
    /// Casing of whichever candidate won the merge.
    pub keyword: String,
    pub volume: f64,
    pub cpc: f64,
    pub competition: f64,
    /// Source of the candidate whose metrics won.
    pub source: KeywordSource,
}

impl UnifiedKeyword {
    #[must_use]
    pub fn from_metrics(keyword: String, source: KeywordSource, metrics: &KeywordMetrics) -> Self {
        Self {
            keyword,
            volume: metrics.volume,
            cpc: metrics.cpc,
            competition: metrics.competition,
            source,
        }
    }
}

/// Raw candidate counts per source, before any filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCounts {
    pub primary_keywords: usize,
    /// Related-search candidates only; LLM-extracted ones are counted separately.
    pub related_keywords: usize,
    pub llm_keywords: usize,
    pub autosuggest_keywords: usize,
    pub organic_results: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeduplicationReport {
    /// Every raw candidate seen from every source.
    pub total_candidates: usize,
    /// Candidates kept out of enrichment for low confidence or an already-known key.
    pub skipped_enrichment: usize,
    /// Candidates collapsed into a key seen earlier in the run, whether caught
    /// while seeding, before enrichment, or while merging.
    pub duplicates_removed: usize,
    pub unique_keywords: usize,
}

/// Paid-provider accounting across all enrichment calls of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentUsage {
    pub calls: usize,
    pub credits_consumed: f64,
    /// Last balance the provider reported; `None` when no call succeeded.
    pub credits_remaining: Option<f64>,
    pub skipped_keywords: Vec<String>,
}

/// A source fetch or enrichment call that failed and was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFailure {
    pub stage: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationMetadata {
    pub run_id: Uuid,
    pub input_term: String,
    pub generated_at: DateTime<Utc>,
    pub sources: SourceCounts,
    pub deduplication: DeduplicationReport,
    pub enrichment: EnrichmentUsage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_failures: Vec<SourceFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Sorted by volume, highest first.
    pub keywords: Vec<UnifiedKeyword>,
    pub metadata: AggregationMetadata,
}
