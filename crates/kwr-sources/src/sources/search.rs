//! Search-results source: organic results, related searches, and
//! LLM-extracted phrases from one search API call.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;

use kwr_core::{AppConfig, KeywordCandidate, KeywordSource};

use crate::error::SourceError;
use crate::options::{
    join_url, parse_body, require_term, send_for_text, ClientOptions, Locale,
};
use crate::retry::retry_with_backoff;
use crate::sources::llm::LlmKeywordExtractor;

const SERVICE: &str = "search API";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganicResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    organic: Vec<OrganicResult>,
    #[serde(default)]
    related_searches: Vec<RelatedSearch>,
}

#[derive(Debug, Deserialize)]
struct RelatedSearch {
    query: String,
}

/// Output of one search: the organic hits and every keyword candidate
/// derived from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub organic: Vec<OrganicResult>,
    /// Related searches first, then LLM-extracted phrases.
    pub keywords: Vec<KeywordCandidate>,
}

/// Client for the search API (`POST /search`, `X-API-KEY` auth).
pub struct SearchClient {
    client: Client,
    api_key: Option<String>,
    endpoint: Url,
    locale: Locale,
    extractor: Option<LlmKeywordExtractor>,
    options: ClientOptions,
}

impl SearchClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built, or
    /// [`SourceError::Configuration`] if `base_url` is invalid.
    pub fn new(
        api_key: Option<&str>,
        base_url: &str,
        locale: Locale,
        extractor: Option<LlmKeywordExtractor>,
        options: ClientOptions,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: options.build_http_client()?,
            api_key: api_key.map(str::to_owned),
            endpoint: join_url(base_url, "search")?,
            locale,
            extractor,
            options,
        })
    }

    /// # Errors
    ///
    /// Same as [`SearchClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        Self::new(
            config.serper_api_key.as_deref(),
            &config.serper_base_url,
            Locale::from_config(config),
            LlmKeywordExtractor::from_config(config)?,
            ClientOptions::from_config(config),
        )
    }

    /// Searches for `term` and derives keyword candidates from the response.
    ///
    /// A missing or failing LLM pass does not fail the fetch: the related
    /// searches are still returned.
    ///
    /// # Errors
    ///
    /// - [`SourceError::InvalidInput`] if `term` is blank.
    /// - [`SourceError::Configuration`] if no API key is configured.
    /// - Upstream-class errors once retries run out.
    pub async fn fetch(&self, term: &str) -> Result<SearchResults, SourceError> {
        let term = require_term(term)?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::Configuration("SERPER_API_KEY is not set".to_string()))?;

        let body = json!({
            "q": term,
            "gl": self.locale.country,
            "hl": self.locale.language,
        });

        let response: SearchResponse =
            retry_with_backoff(self.options.retry, SourceError::is_retriable, || {
                let request = self
                    .client
                    .post(self.endpoint.clone())
                    .header("X-API-KEY", api_key)
                    .json(&body);
                async move {
                    let text = send_for_text(request, SERVICE).await?;
                    parse_body(&text, format!("search response for \"{term}\""))
                }
            })
            .await?;

        if response.organic.is_empty() {
            tracing::warn!(source = "search", term, "search returned no organic results");
        }

        let mut keywords: Vec<KeywordCandidate> = response
            .related_searches
            .into_iter()
            .filter_map(|r| {
                let query = r.query.trim();
                (!query.is_empty()).then(|| {
                    KeywordCandidate::new(query, KeywordSource::RelatedSearch)
                        .with_context("Related search")
                })
            })
            .collect();

        match &self.extractor {
            Some(extractor) => match extractor.extract(term, &response.organic).await {
                Ok(extracted) => {
                    tracing::debug!(
                        source = "llm_extracted",
                        term,
                        count = extracted.len(),
                        "extracted keywords from search results"
                    );
                    keywords.extend(extracted);
                }
                Err(e) => {
                    tracing::warn!(
                        source = "llm_extracted",
                        term,
                        error = %e,
                        "LLM keyword extraction failed"
                    );
                }
            },
            None => {
                tracing::debug!(term, "LLM extractor not configured; skipping extraction");
            }
        }

        tracing::debug!(
            source = "search",
            term,
            organic = response.organic.len(),
            keywords = keywords.len(),
            "fetched search results"
        );

        Ok(SearchResults {
            organic: response.organic,
            keywords,
        })
    }
}
