//! Paid keyword-metrics enrichment.
//!
//! One call covers at most [`MAX_ENRICHMENT_BATCH`] keywords. Callers chunk;
//! this client never splits a batch itself. Calls are never retried; each
//! one spends provider credits.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use kwr_core::{AppConfig, KeywordMetrics, TrendPoint};

use crate::error::SourceError;
use crate::numeric::{lenient_f64, lenient_opt_f64, money_f64};
use crate::options::{join_url, parse_body, send_for_text, ClientOptions};

const SERVICE: &str = "enrichment API";

/// Provider limit on keywords per request.
pub const MAX_ENRICHMENT_BATCH: usize = 100;

#[derive(Debug, Deserialize)]
struct KeywordDataResponse {
    #[serde(default)]
    data: Vec<KeywordDataRow>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    credits: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    credits_consumed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    time: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct KeywordDataRow {
    keyword: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    vol: f64,
    #[serde(default, deserialize_with = "money_f64")]
    cpc: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    competition: f64,
    #[serde(default)]
    trend: Vec<RawTrend>,
}

#[derive(Debug, Deserialize)]
struct RawTrend {
    month: String,
    year: i32,
    #[serde(default, deserialize_with = "lenient_f64")]
    value: f64,
}

impl KeywordDataRow {
    fn metrics(&self) -> KeywordMetrics {
        KeywordMetrics {
            volume: self.vol.max(0.0),
            cpc: self.cpc.max(0.0),
            competition: self.competition,
            trends: self
                .trend
                .iter()
                .map(|t| TrendPoint {
                    month: t.month.clone(),
                    year: t.year,
                    value: t.value,
                })
                .collect(),
        }
    }
}

/// One keyword the provider had meaningful data for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedKeyword {
    /// The keyword exactly as it was passed in.
    pub keyword: String,
    pub metrics: KeywordMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentMetadata {
    pub processed: usize,
    pub enriched: usize,
    pub skipped: usize,
    pub credits_consumed: f64,
    pub credits_remaining: Option<f64>,
    /// Provider-reported processing time in seconds.
    pub processing_time_secs: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentResult {
    pub enriched: Vec<EnrichedKeyword>,
    /// Keywords with no provider row, or a row whose metrics are all zero.
    pub skipped_keywords: Vec<String>,
    pub metadata: EnrichmentMetadata,
}

/// Request parameters sent with every enrichment call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentParams {
    pub country: String,
    pub currency: String,
    pub data_source: String,
}

impl EnrichmentParams {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            country: config.country.clone(),
            currency: config.currency.clone(),
            data_source: config.data_source.clone(),
        }
    }
}

impl Default for EnrichmentParams {
    fn default() -> Self {
        Self {
            country: "us".to_string(),
            currency: "usd".to_string(),
            data_source: "gkp".to_string(),
        }
    }
}

/// Client for the paid keyword-metrics API (`POST /v1/get_keyword_data`).
pub struct EnrichmentClient {
    client: Client,
    api_key: Option<String>,
    endpoint: Url,
    params: EnrichmentParams,
}

impl EnrichmentClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built, or
    /// [`SourceError::Configuration`] if `base_url` is invalid.
    pub fn new(
        api_key: Option<&str>,
        base_url: &str,
        params: EnrichmentParams,
        options: &ClientOptions,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: options.build_http_client()?,
            api_key: api_key.map(str::to_owned),
            endpoint: join_url(base_url, "v1/get_keyword_data")?,
            params,
        })
    }

    /// # Errors
    ///
    /// Same as [`EnrichmentClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        Self::new(
            config.enrichment_api_key.as_deref(),
            &config.enrichment_base_url,
            EnrichmentParams::from_config(config),
            &ClientOptions::from_config(config),
        )
    }

    /// Fetches volume, CPC and competition for up to 100 keywords in one call.
    ///
    /// An empty slice returns an empty result without calling the provider.
    ///
    /// # Errors
    ///
    /// - [`SourceError::BatchTooLarge`] for more than 100 keywords. No request
    ///   is made.
    /// - [`SourceError::Configuration`] if no API key is configured.
    /// - Upstream-class errors on network failure, non-2xx, or a malformed body.
    pub async fn enrich(&self, keywords: &[String]) -> Result<EnrichmentResult, SourceError> {
        if keywords.len() > MAX_ENRICHMENT_BATCH {
            return Err(SourceError::BatchTooLarge {
                size: keywords.len(),
                max: MAX_ENRICHMENT_BATCH,
            });
        }
        if keywords.is_empty() {
            return Ok(build_result(keywords, KeywordDataResponse::empty()));
        }
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            SourceError::Configuration("KEYWORDS_EVERYWHERE_API_KEY is not set".to_string())
        })?;

        let mut form: Vec<(&str, &str)> = vec![
            ("country", self.params.country.as_str()),
            ("currency", self.params.currency.as_str()),
            ("dataSource", self.params.data_source.as_str()),
        ];
        form.extend(keywords.iter().map(|k| ("kw[]", k.as_str())));

        let request = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form);
        let text = send_for_text(request, SERVICE).await?;
        let response: KeywordDataResponse =
            parse_body(&text, format!("keyword data for {} keywords", keywords.len()))?;

        let result = build_result(keywords, response);
        tracing::debug!(
            processed = result.metadata.processed,
            enriched = result.metadata.enriched,
            skipped = result.metadata.skipped,
            credits_consumed = result.metadata.credits_consumed,
            "enrichment call finished"
        );
        Ok(result)
    }
}

impl KeywordDataResponse {
    fn empty() -> Self {
        Self {
            data: Vec::new(),
            credits: None,
            credits_consumed: None,
            time: None,
        }
    }
}

/// Matches provider rows back to the requested keywords.
///
/// Matching ignores case but is otherwise exact. The first row wins when the
/// provider repeats a keyword.
fn build_result(keywords: &[String], response: KeywordDataResponse) -> EnrichmentResult {
    let mut rows: HashMap<String, &KeywordDataRow> = HashMap::new();
    for row in &response.data {
        rows.entry(row.keyword.to_lowercase()).or_insert(row);
    }

    let mut enriched = Vec::new();
    let mut skipped_keywords = Vec::new();
    for keyword in keywords {
        match rows.get(&keyword.to_lowercase()).map(|row| row.metrics()) {
            Some(metrics) if !metrics.is_empty() => enriched.push(EnrichedKeyword {
                keyword: keyword.clone(),
                metrics,
            }),
            _ => skipped_keywords.push(keyword.clone()),
        }
    }

    let metadata = EnrichmentMetadata {
        processed: keywords.len(),
        enriched: enriched.len(),
        skipped: skipped_keywords.len(),
        credits_consumed: response.credits_consumed.unwrap_or(0.0),
        credits_remaining: response.credits,
        processing_time_secs: response.time,
        timestamp: Utc::now(),
    };

    EnrichmentResult {
        enriched,
        skipped_keywords,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> KeywordDataResponse {
        serde_json::from_str(json).expect("fixture should parse")
    }

    fn kws(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn matches_rows_case_insensitively() {
        let r = response(
            r#"{"data":[{"keyword":"MIME Type List","vol":320,"cpc":{"currency":"$","value":"0.80"},"competition":0.2}],"credits":990,"credits_consumed":1,"time":0.12}"#,
        );
        let result = build_result(&kws(&["mime type list"]), r);
        assert_eq!(result.enriched.len(), 1);
        assert_eq!(result.enriched[0].keyword, "mime type list");
        assert!((result.enriched[0].metrics.cpc - 0.8).abs() < 1e-9);
        assert_eq!(result.metadata.credits_remaining, Some(990.0));
        assert!((result.metadata.credits_consumed - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.metadata.processing_time_secs, Some(0.12));
    }

    #[test]
    fn all_zero_row_is_skipped() {
        let r = response(
            r#"{"data":[{"keyword":"zzzznoexist","vol":0,"cpc":{"currency":"$","value":"0"},"competition":0}]}"#,
        );
        let result = build_result(&kws(&["zzzznoexist"]), r);
        assert!(result.enriched.is_empty());
        assert_eq!(result.skipped_keywords, vec!["zzzznoexist".to_string()]);
        assert_eq!(result.metadata.skipped, 1);
    }

    #[test]
    fn missing_row_is_skipped() {
        let r = response(r#"{"data":[]}"#);
        let result = build_result(&kws(&["a", "b"]), r);
        assert_eq!(result.skipped_keywords, kws(&["a", "b"]));
        assert_eq!(result.metadata.processed, 2);
        assert_eq!(result.metadata.enriched, 0);
    }

    #[test]
    fn zero_volume_with_cpc_is_kept() {
        let r = response(r#"{"data":[{"keyword":"niche","vol":0,"cpc":"2.10","competition":0}]}"#);
        let result = build_result(&kws(&["niche"]), r);
        assert_eq!(result.enriched.len(), 1);
    }

    #[test]
    fn trends_are_carried_over() {
        let r = response(
            r#"{"data":[{"keyword":"a","vol":10,"cpc":"0.1","competition":0.5,"trend":[{"month":"January","year":2024,"value":8},{"month":"February","year":2024,"value":"12"}]}]}"#,
        );
        let result = build_result(&kws(&["a"]), r);
        let trends = &result.enriched[0].metrics.trends;
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[1].month, "February");
        assert!((trends[1].value - 12.0).abs() < f64::EPSILON);
    }
}
