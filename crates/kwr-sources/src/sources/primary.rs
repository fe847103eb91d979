//! Primary keyword-metrics source.
//!
//! Scrapes a keyword-metrics site whose result page ships its data as a JSON
//! blob inside a `<script>` tag. The blob is located by a marker token and
//! carries a `keywords` array with Google-Ads-style fields.

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use kwr_core::{AppConfig, KeywordCandidate, KeywordMetrics, KeywordSource};

use crate::embedded_json::extract_json_after_marker;
use crate::error::SourceError;
use crate::numeric::lenient_f64;
use crate::options::{require_term, send_for_text, ClientOptions};
use crate::retry::retry_with_backoff;

const SERVICE: &str = "primary metrics site";

/// Bids are reported in millionths of the currency unit.
const MICROS_PER_UNIT: f64 = 1_000_000.0;

/// JSON pointers tried, in order, to find the keyword rows in the payload.
const KEYWORD_POINTERS: [&str; 2] = ["/keywords", "/props/pageProps/keywords"];

#[derive(Debug, Deserialize)]
struct RawPrimaryKeyword {
    #[serde(alias = "text")]
    keyword: String,
    #[serde(
        default,
        alias = "avgMonthlySearches",
        deserialize_with = "lenient_f64"
    )]
    avg_monthly_searches: f64,
    #[serde(
        default,
        alias = "bid_micros",
        alias = "highTopOfPageBidMicros",
        alias = "high_top_of_page_bid_micros",
        deserialize_with = "lenient_f64"
    )]
    bid: f64,
    #[serde(default, alias = "competitionIndex", deserialize_with = "lenient_f64")]
    competition: f64,
}

impl RawPrimaryKeyword {
    fn into_candidate(self) -> Option<KeywordCandidate> {
        let keyword = self.keyword.trim();
        if keyword.is_empty() {
            return None;
        }
        let metrics = KeywordMetrics {
            volume: self.avg_monthly_searches.max(0.0),
            cpc: (self.bid / MICROS_PER_UNIT).max(0.0),
            competition: self.competition,
            trends: Vec::new(),
        };
        Some(
            KeywordCandidate::new(keyword, KeywordSource::Primary)
                .with_context("Keyword metrics")
                .with_metrics(metrics),
        )
    }
}

/// Client for the scraped primary keyword-metrics site.
pub struct PrimarySourceClient {
    client: Client,
    site_url: Option<String>,
    marker: String,
    country: String,
    options: ClientOptions,
}

impl PrimarySourceClient {
    /// Creates a client. `site_url = None` leaves the source unconfigured;
    /// every fetch then fails with [`SourceError::Configuration`].
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        site_url: Option<&str>,
        marker: &str,
        country: &str,
        options: ClientOptions,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: options.build_http_client()?,
            site_url: site_url.map(str::to_owned),
            marker: marker.to_owned(),
            country: country.to_owned(),
            options,
        })
    }

    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        Self::new(
            config.metrics_site_url.as_deref(),
            &config.metrics_marker,
            &config.country,
            ClientOptions::from_config(config),
        )
    }

    /// Fetches keyword metrics for `term`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`SourceError::InvalidInput`] if `term` is blank.
    /// - [`SourceError::Configuration`] if no site URL is configured.
    /// - [`SourceError::NoDataFound`] if the page lists zero keywords.
    /// - Upstream-class errors (status, network, parse) once retries run out.
    pub async fn fetch(&self, term: &str) -> Result<Vec<KeywordCandidate>, SourceError> {
        let term = require_term(term)?;
        let url = self.page_url(term)?;

        let candidates = retry_with_backoff(self.options.retry, SourceError::is_retriable, || {
            let url = url.clone();
            async move {
                let request = self
                    .client
                    .get(url)
                    .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
                    .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
                let html = send_for_text(request, SERVICE).await?;
                parse_primary_page(&html, &self.marker, term)
            }
        })
        .await?;

        tracing::debug!(
            source = "primary",
            term,
            count = candidates.len(),
            "fetched primary keywords"
        );
        Ok(candidates)
    }

    fn page_url(&self, term: &str) -> Result<Url, SourceError> {
        let base = self.site_url.as_deref().ok_or_else(|| {
            SourceError::Configuration("KWR_METRICS_SITE_URL is not set".to_string())
        })?;
        let mut url = Url::parse(base).map_err(|e| {
            SourceError::Configuration(format!("invalid metrics site URL '{base}': {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("keyword", term)
            .append_pair("country", &self.country);
        Ok(url)
    }
}

/// Parses a metrics page into primary candidates.
///
/// # Errors
///
/// - [`SourceError::Upstream`] if the marker, the JSON object, or the
///   `keywords` field is missing.
/// - [`SourceError::Deserialize`] if the blob or its rows are malformed.
/// - [`SourceError::NoDataFound`] if no usable rows remain.
pub fn parse_primary_page(
    html: &str,
    marker: &str,
    term: &str,
) -> Result<Vec<KeywordCandidate>, SourceError> {
    let blob = extract_json_after_marker(html, marker).ok_or_else(|| SourceError::Upstream {
        service: SERVICE,
        reason: format!("no JSON payload found after marker '{marker}'"),
    })?;

    let payload: Value = serde_json::from_str(blob).map_err(|e| SourceError::Deserialize {
        context: format!("embedded keyword payload for \"{term}\""),
        source: e,
    })?;

    let rows = KEYWORD_POINTERS
        .iter()
        .find_map(|p| payload.pointer(p))
        .ok_or_else(|| SourceError::Upstream {
            service: SERVICE,
            reason: "payload has no keywords field".to_string(),
        })?;

    let rows: Vec<RawPrimaryKeyword> =
        serde_json::from_value(rows.clone()).map_err(|e| SourceError::Deserialize {
            context: format!("keyword rows for \"{term}\""),
            source: e,
        })?;

    let candidates: Vec<KeywordCandidate> = rows
        .into_iter()
        .filter_map(RawPrimaryKeyword::into_candidate)
        .collect();

    if candidates.is_empty() {
        return Err(SourceError::NoDataFound {
            term: term.to_owned(),
        });
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "__KEYWORD_DATA__";

    fn page(payload: &str) -> String {
        format!(
            "<html><head><script>window.{MARKER} = {payload};</script></head><body></body></html>"
        )
    }

    #[test]
    fn converts_provider_fields() {
        let html = page(
            r#"{"keywords":[{"keyword":"mime types","avg_monthly_searches":500,"bid":"1200000","competition":0.3}]}"#,
        );
        let candidates = parse_primary_page(&html, MARKER, "mime types").unwrap();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.keyword, "mime types");
        assert_eq!(c.source, KeywordSource::Primary);
        assert_eq!(c.confidence, None);
        let m = c.metrics.as_ref().unwrap();
        assert!((m.volume - 500.0).abs() < f64::EPSILON);
        assert!((m.cpc - 1.2).abs() < 1e-9, "bid micros should become 1.20");
        assert!((m.competition - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn accepts_camel_case_and_nested_payloads() {
        let html = page(
            r#"{"props":{"pageProps":{"keywords":[{"text":"Mime Type","avgMonthlySearches":"90","highTopOfPageBidMicros":500000}]}}}"#,
        );
        let candidates = parse_primary_page(&html, MARKER, "mime").unwrap();
        assert_eq!(candidates[0].keyword, "Mime Type");
        let m = candidates[0].metrics.as_ref().unwrap();
        assert!((m.volume - 90.0).abs() < f64::EPSILON);
        assert!((m.cpc - 0.5).abs() < 1e-9);
    }

    #[test]
    fn string_values_with_braces_do_not_break_extraction() {
        let html = page(
            r#"{"title":"weird } title","keywords":[{"keyword":"a {b}","avg_monthly_searches":1}]}"#,
        );
        let candidates = parse_primary_page(&html, MARKER, "a").unwrap();
        assert_eq!(candidates[0].keyword, "a {b}");
    }

    #[test]
    fn empty_keyword_list_is_no_data() {
        let html = page(r#"{"keywords":[]}"#);
        let err = parse_primary_page(&html, MARKER, "nothing").unwrap_err();
        assert!(matches!(err, SourceError::NoDataFound { ref term } if term == "nothing"));
    }

    #[test]
    fn blank_rows_are_dropped() {
        let html = page(r#"{"keywords":[{"keyword":"  "}]}"#);
        assert!(matches!(
            parse_primary_page(&html, MARKER, "x"),
            Err(SourceError::NoDataFound { .. })
        ));
    }

    #[test]
    fn missing_marker_is_upstream_error() {
        let err = parse_primary_page("<html></html>", MARKER, "x").unwrap_err();
        assert!(matches!(err, SourceError::Upstream { .. }));
        assert!(err.is_retriable());
    }

    #[test]
    fn missing_keywords_field_is_upstream_error() {
        let html = page(r#"{"results":[]}"#);
        assert!(matches!(
            parse_primary_page(&html, MARKER, "x"),
            Err(SourceError::Upstream { .. })
        ));
    }

    #[test]
    fn malformed_rows_are_deserialize_errors() {
        let html = page(r#"{"keywords":[{"avg_monthly_searches":10}]}"#);
        assert!(matches!(
            parse_primary_page(&html, MARKER, "x"),
            Err(SourceError::Deserialize { .. })
        ));
    }
}
