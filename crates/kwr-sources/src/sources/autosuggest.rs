//! Autosuggest source.

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use kwr_core::{AppConfig, KeywordCandidate, KeywordSource};

use crate::error::SourceError;
use crate::options::{
    join_url, parse_body, require_term, send_for_text, ClientOptions, Locale,
};
use crate::retry::retry_with_backoff;

const SERVICE: &str = "autosuggest API";

/// Suggestions come straight from the search engine being targeted.
const AUTOSUGGEST_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    value: String,
}

/// Client for the autocomplete API (`POST /autocomplete`, `X-API-KEY` auth).
pub struct AutosuggestClient {
    client: Client,
    api_key: Option<String>,
    endpoint: Url,
    locale: Locale,
    options: ClientOptions,
}

impl AutosuggestClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built, or
    /// [`SourceError::Configuration`] if `base_url` is invalid.
    pub fn new(
        api_key: Option<&str>,
        base_url: &str,
        locale: Locale,
        options: ClientOptions,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: options.build_http_client()?,
            api_key: api_key.map(str::to_owned),
            endpoint: join_url(base_url, "autocomplete")?,
            locale,
            options,
        })
    }

    /// # Errors
    ///
    /// Same as [`AutosuggestClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        Self::new(
            config.serper_api_key.as_deref(),
            &config.serper_base_url,
            Locale::from_config(config),
            ClientOptions::from_config(config),
        )
    }

    /// Fetches autocomplete suggestions for `term`.
    ///
    /// # Errors
    ///
    /// - [`SourceError::InvalidInput`] if `term` is blank.
    /// - [`SourceError::Configuration`] if no API key is configured.
    /// - Upstream-class errors once retries run out.
    pub async fn fetch(&self, term: &str) -> Result<Vec<KeywordCandidate>, SourceError> {
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

        let response: AutocompleteResponse =
            retry_with_backoff(self.options.retry, SourceError::is_retriable, || {
                let request = self
                    .client
                    .post(self.endpoint.clone())
                    .header("X-API-KEY", api_key)
                    .json(&body);
                async move {
                    let text = send_for_text(request, SERVICE).await?;
                    parse_body(&text, format!("autocomplete response for \"{term}\""))
                }
            })
            .await?;

        let candidates: Vec<KeywordCandidate> = response
            .suggestions
            .into_iter()
            .filter_map(|s| {
                let value = s.value.trim();
                (!value.is_empty()).then(|| {
                    KeywordCandidate::new(value, KeywordSource::Autosuggest)
                        .with_confidence(AUTOSUGGEST_CONFIDENCE)
                        .with_context("Direct autocomplete suggestion")
                })
            })
            .collect();

        tracing::debug!(
            source = "autosuggest",
            term,
            count = candidates.len(),
            "fetched autosuggest keywords"
        );
        Ok(candidates)
    }
}
