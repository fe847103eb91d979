//! Settings shared by every client in this crate.

use std::time::Duration;

use reqwest::{Client, Url};

use kwr_core::AppConfig;

use crate::error::SourceError;
use crate::retry::RetryPolicy;

/// HTTP and retry settings common to all clients.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl ClientOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            retry: RetryPolicy::new(config.source_max_attempts, config.retry_backoff_base_ms),
        }
    }

    /// Builds a `reqwest::Client` with the configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the client cannot be constructed.
    pub(crate) fn build_http_client(&self) -> Result<Client, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(self.user_agent.as_str())
            .build()?;
        Ok(client)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "kwr/0.1 (keyword-research)".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Country and language sent to search-style APIs as `gl` / `hl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub country: String,
    pub language: String,
}

impl Locale {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            country: config.country.clone(),
            language: config.language.clone(),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            country: "us".to_string(),
            language: "en".to_string(),
        }
    }
}

/// Joins `path` onto `base`, keeping any path prefix `base` already has.
///
/// # Errors
///
/// Returns [`SourceError::Configuration`] if the result is not a valid URL.
pub(crate) fn join_url(base: &str, path: &str) -> Result<Url, SourceError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined)
        .map_err(|e| SourceError::Configuration(format!("invalid URL '{joined}': {e}")))
}

/// Sends `request`, asserts a 2xx status, and returns the body text.
///
/// # Errors
///
/// Returns [`SourceError::Http`] on network failure and
/// [`SourceError::UnexpectedStatus`] on a non-2xx status.
pub(crate) async fn send_for_text(
    request: reqwest::RequestBuilder,
    service: &'static str,
) -> Result<String, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::UnexpectedStatus {
            service,
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

/// Parses a response body, tagging failures with `context`.
pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(
    body: &str,
    context: impl Into<String>,
) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Deserialize {
        context: context.into(),
        source: e,
    })
}

/// Rejects empty or whitespace-only terms.
pub(crate) fn require_term(term: &str) -> Result<&str, SourceError> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return Err(SourceError::InvalidInput(
            "search term is required".to_string(),
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(
            join_url("https://google.serper.dev/", "/search")
                .unwrap()
                .as_str(),
            "https://google.serper.dev/search"
        );
        assert_eq!(
            join_url("http://127.0.0.1:9000/mock", "v1/get_keyword_data")
                .unwrap()
                .as_str(),
            "http://127.0.0.1:9000/mock/v1/get_keyword_data"
        );
    }

    #[test]
    fn join_url_rejects_garbage() {
        assert!(matches!(
            join_url("not a url", "search"),
            Err(SourceError::Configuration(_))
        ));
    }

    #[test]
    fn require_term_trims_and_rejects_blank() {
        assert_eq!(require_term("  mime types ").unwrap(), "mime types");
        assert!(matches!(
            require_term("   "),
            Err(SourceError::InvalidInput(_))
        ));
        assert!(matches!(require_term(""), Err(SourceError::InvalidInput(_))));
    }
}
