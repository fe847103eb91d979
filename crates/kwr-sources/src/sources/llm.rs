//! LLM pass that pulls keyword phrases out of organic search results.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint in JSON mode.
//! The model is asked for `{"keywords": [{"keyword", "confidence"}]}`.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use kwr_core::{AppConfig, KeywordCandidate, KeywordSource};

use crate::error::SourceError;
use crate::options::{join_url, parse_body, send_for_text, ClientOptions};
use crate::sources::search::OrganicResult;

const SERVICE: &str = "LLM extractor";

/// Organic results beyond this are not sent to the model.
const MAX_RESULTS_IN_PROMPT: usize = 10;
const MAX_SNIPPET_CHARS: usize = 300;

const SYSTEM_PROMPT: &str = "You extract search keyword phrases from web search results. \
Return JSON with a single key `keywords`: an array of objects with `keyword` (a lowercase \
phrase a person would type into a search engine) and `confidence` (0 to 1, how strongly the \
results show people search for it). Only include phrases related to the query.";

#[derive(Debug, Deserialize)]
struct ExtractedKeywords {
    #[serde(default)]
    keywords: Vec<ExtractedKeyword>,
}

#[derive(Debug, Deserialize)]
struct ExtractedKeyword {
    keyword: String,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Client for the keyword-extraction model.
pub struct LlmKeywordExtractor {
    client: Client,
    api_key: String,
    model: String,
    endpoint: reqwest::Url,
}

impl LlmKeywordExtractor {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built, or
    /// [`SourceError::Configuration`] if `base_url` is invalid.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        options: &ClientOptions,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: options.build_http_client()?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint: join_url(base_url, "chat/completions")?,
        })
    }

    /// Returns `None` when no LLM key is configured.
    ///
    /// # Errors
    ///
    /// Same as [`LlmKeywordExtractor::new`].
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, SourceError> {
        config
            .llm_api_key
            .as_deref()
            .map(|key| {
                Self::new(
                    key,
                    &config.llm_base_url,
                    &config.llm_model,
                    &ClientOptions::from_config(config),
                )
            })
            .transpose()
    }

    /// Asks the model for keyword phrases found in `results`.
    ///
    /// # Errors
    ///
    /// Upstream-class errors on network failure, non-2xx status, or a
    /// response that is not the expected JSON.
    pub async fn extract(
        &self,
        term: &str,
        results: &[OrganicResult],
    ) -> Result<Vec<KeywordCandidate>, SourceError> {
        if results.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_user_prompt(term, results) }
            ],
            "temperature": 0.1
        });

        let request = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body);
        let text = send_for_text(request, SERVICE).await?;
        let envelope: Value = parse_body(&text, "chat completion envelope")?;

        let content = envelope
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| SourceError::Upstream {
                service: SERVICE,
                reason: "completion has no message content".to_string(),
            })?;

        parse_extraction(content)
    }
}

fn build_user_prompt(term: &str, results: &[OrganicResult]) -> String {
    let mut prompt = format!("Query: {term}\n\nResults:\n");
    for (i, result) in results.iter().take(MAX_RESULTS_IN_PROMPT).enumerate() {
        let snippet: String = result
            .snippet
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(MAX_SNIPPET_CHARS)
            .collect();
        prompt.push_str(&format!("{}. {}\n   {}\n", i + 1, result.title, snippet));
    }
    prompt
}

/// Turns the model's JSON content into candidates, dropping blank phrases
/// and repeated ones.
pub(crate) fn parse_extraction(content: &str) -> Result<Vec<KeywordCandidate>, SourceError> {
    let parsed: ExtractedKeywords = parse_body(content, "LLM keyword extraction")?;
    let mut seen = std::collections::HashSet::new();
    Ok(parsed
        .keywords
        .into_iter()
        .filter_map(|k| {
            let keyword = k.keyword.trim().to_owned();
            if keyword.is_empty() || !seen.insert(kwr_core::normalize_keyword(&keyword)) {
                return None;
            }
            let candidate = KeywordCandidate::new(keyword, KeywordSource::LlmExtracted)
                .with_context("Search result");
            Some(match k.confidence {
                Some(c) => candidate.with_confidence(c),
                None => candidate,
            })
        })
        .collect())
}
