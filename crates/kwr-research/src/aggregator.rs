//! Keyword aggregation orchestration.

use chrono::Utc;
use uuid::Uuid;

use kwr_core::{
    normalize_keyword, AggregationMetadata, AggregationResult, AppConfig, DeduplicationReport,
    EnrichmentUsage, KeywordCandidate, KeywordSource, SourceCounts, SourceFailure, UnifiedKeyword,
};
use kwr_sources::{
    AutosuggestClient, EnrichmentClient, EnrichmentResult, PrimarySourceClient, SearchClient,
    SourceError,
};

use crate::dedup::DedupMap;
use crate::error::ResearchError;
use crate::selection::{select_for_enrichment, EnrichmentBatch};

/// Runs the three keyword sources and the enrichment provider as one
/// aggregation.
pub struct KeywordResearcher {
    primary: PrimarySourceClient,
    search: SearchClient,
    autosuggest: AutosuggestClient,
    enrichment: EnrichmentClient,
}

impl KeywordResearcher {
    #[must_use]
    pub fn new(
        primary: PrimarySourceClient,
        search: SearchClient,
        autosuggest: AutosuggestClient,
        enrichment: EnrichmentClient,
    ) -> Self {
        Self {
            primary,
            search,
            autosuggest,
            enrichment,
        }
    }

    /// Builds every client from application configuration.
    ///
    /// Missing credentials do not fail here; the affected source reports a
    /// configuration error at fetch time and the run degrades around it.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Setup`] if an HTTP client or a base URL is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, ResearchError> {
        Ok(Self::new(
            PrimarySourceClient::from_config(config)?,
            SearchClient::from_config(config)?,
            AutosuggestClient::from_config(config)?,
            EnrichmentClient::from_config(config)?,
        ))
    }

    /// Collects, deduplicates, enriches and ranks keywords for `input_term`.
    ///
    /// 1. Fan out to the primary, search and autosuggest sources concurrently
    ///    and wait for all of them.
    /// 2. Seed the dedup map with primary keywords.
    /// 3. Pick non-primary candidates with confidence ≥ 0.8 and an unknown key.
    /// 4. Enrich the search-derived and autosuggest-derived picks, one call
    ///    each, skipping empty picks.
    /// 5. Merge enriched keywords without overwriting existing keys.
    /// 6. Sort by volume, highest first.
    ///
    /// Failed sources and failed enrichment calls are left out of the result
    /// and listed in `metadata.source_failures`.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::InvalidInput`] if `input_term` is empty. No
    /// other failure aborts the run.
    pub async fn aggregate_keywords(
        &self,
        input_term: &str,
    ) -> Result<AggregationResult, ResearchError> {
        if input_term.trim().is_empty() {
            return Err(ResearchError::InvalidInput(
                "Input term is required".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, term = input_term, "starting keyword aggregation");

        let (primary, search, autosuggest) = tokio::join!(
            self.primary.fetch(input_term),
            self.search.fetch(input_term),
            self.autosuggest.fetch(input_term),
        );

        let mut failures = Vec::new();
        let primary = settle("primary", primary, &mut failures).unwrap_or_default();
        let search = settle("search", search, &mut failures).unwrap_or_default();
        let autosuggest = settle("autosuggest", autosuggest, &mut failures).unwrap_or_default();

        let sources = SourceCounts {
            primary_keywords: primary.len(),
            related_keywords: count_source(&search.keywords, KeywordSource::RelatedSearch),
            llm_keywords: count_source(&search.keywords, KeywordSource::LlmExtracted),
            autosuggest_keywords: autosuggest.len(),
            organic_results: search.organic.len(),
        };
        let total_candidates = primary.len() + search.keywords.len() + autosuggest.len();

        let mut map = DedupMap::default();
        for candidate in primary {
            let metrics = candidate.metrics.unwrap_or_default();
            map.insert_if_absent(UnifiedKeyword::from_metrics(
                candidate.keyword,
                candidate.source,
                &metrics,
            ));
        }
        tracing::debug!(%run_id, seeded = map.len(), "seeded dedup map from primary source");

        let search_batch = select_for_enrichment(&search.keywords, &map);
        let autosuggest_batch = select_for_enrichment(&autosuggest, &map);
        let skipped_enrichment = search_batch.skipped + autosuggest_batch.skipped;
        let unselected_duplicates = search_batch.duplicates + autosuggest_batch.duplicates;

        let (search_enriched, autosuggest_enriched) = tokio::join!(
            self.enrich_batch(&search_batch),
            self.enrich_batch(&autosuggest_batch),
        );

        let mut usage = EnrichmentUsage::default();
        for (stage, batch, outcome) in [
            ("enrichment:search", &search_batch, search_enriched),
            ("enrichment:autosuggest", &autosuggest_batch, autosuggest_enriched),
        ] {
            let Some(outcome) = outcome else { continue };
            if let Some(result) = settle(stage, outcome, &mut failures) {
                merge_enriched(&mut map, batch, result, &mut usage);
            }
        }

        let deduplication = DeduplicationReport {
            total_candidates,
            skipped_enrichment,
            // Seeding and merge rejections plus collisions caught before enrichment.
            duplicates_removed: map.rejected() + unselected_duplicates,
            unique_keywords: map.len(),
        };
        let keywords = map.into_ranked();

        tracing::info!(
            %run_id,
            term = input_term,
            keywords = keywords.len(),
            total_candidates,
            skipped_enrichment,
            duplicates_removed = deduplication.duplicates_removed,
            failures = failures.len(),
            "keyword aggregation finished"
        );

        Ok(AggregationResult {
            keywords,
            metadata: AggregationMetadata {
                run_id,
                input_term: input_term.to_string(),
                generated_at: Utc::now(),
                sources,
                deduplication,
                enrichment: usage,
                source_failures: failures,
            },
        })
    }

    /// `None` when the batch is empty and no call is made.
    async fn enrich_batch(
        &self,
        batch: &EnrichmentBatch,
    ) -> Option<Result<EnrichmentResult, SourceError>> {
        if batch.is_empty() {
            return None;
        }
        Some(self.enrichment.enrich(&batch.keywords).await)
    }
}

/// Unwraps a stage outcome, recording and logging a failure.
fn settle<T>(
    stage: &'static str,
    outcome: Result<T, SourceError>,
    failures: &mut Vec<SourceFailure>,
) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(stage, error = %e, "keyword stage failed; continuing without it");
            failures.push(SourceFailure {
                stage: stage.to_string(),
                message: e.to_string(),
            });
            None
        }
    }
}

fn count_source(candidates: &[KeywordCandidate], source: KeywordSource) -> usize {
    candidates.iter().filter(|c| c.source == source).count()
}

fn merge_enriched(
    map: &mut DedupMap,
    batch: &EnrichmentBatch,
    result: EnrichmentResult,
    usage: &mut EnrichmentUsage,
) {
    usage.calls += 1;
    usage.credits_consumed += result.metadata.credits_consumed;
    if result.metadata.credits_remaining.is_some() {
        usage.credits_remaining = result.metadata.credits_remaining;
    }
    usage.skipped_keywords.extend(result.skipped_keywords);

    for enriched in result.enriched {
        let Some(source) = batch.sources.get(&normalize_keyword(&enriched.keyword)) else {
            continue;
        };
        map.insert_if_absent(UnifiedKeyword::from_metrics(
            enriched.keyword,
            *source,
            &enriched.metrics,
        ));
    }
}
