//! Command handlers. Results go to stdout as JSON; logs go to stderr.

use anyhow::Context;
use serde::Serialize;

use kwr_core::AppConfig;
use kwr_research::KeywordResearcher;
use kwr_sources::EnrichmentClient;

/// Runs one aggregation and prints the result.
///
/// Degraded runs still succeed; their failed stages are listed in the
/// output metadata and logged at `warn`.
///
/// # Errors
///
/// Returns an error if the clients cannot be built or `term` is blank.
pub(crate) async fn run_research(
    config: &AppConfig,
    term: &str,
    compact: bool,
) -> anyhow::Result<()> {
    let researcher =
        KeywordResearcher::from_config(config).context("failed to build keyword sources")?;
    let result = researcher.aggregate_keywords(term).await?;

    if !result.metadata.source_failures.is_empty() {
        tracing::warn!(
            run_id = %result.metadata.run_id,
            failures = result.metadata.source_failures.len(),
            "aggregation completed with failed stages"
        );
    }
    print_json(&result, compact)
}

/// # Errors
///
/// Returns an error if the enrichment client cannot be built or the call fails.
pub(crate) async fn run_enrich(
    config: &AppConfig,
    keywords: &[String],
    compact: bool,
) -> anyhow::Result<()> {
    let client =
        EnrichmentClient::from_config(config).context("failed to build enrichment client")?;
    let result = client
        .enrich(keywords)
        .await
        .context("enrichment request failed")?;
    tracing::info!(
        enriched = result.metadata.enriched,
        skipped = result.metadata.skipped,
        credits_consumed = result.metadata.credits_consumed,
        "enrichment finished"
    );
    print_json(&result, compact)
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> anyhow::Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}
