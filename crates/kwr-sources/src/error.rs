use thiserror::Error;

/// Errors returned by the keyword source and enrichment clients.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A required string input was empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A credential or endpoint the client needs is not configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {service}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response arrived but did not contain what we expected.
    #[error("unusable response from {service}: {reason}")]
    Upstream {
        service: &'static str,
        reason: String,
    },

    /// The primary source parsed fine but returned no keywords.
    #[error("no keyword data found for \"{term}\"")]
    NoDataFound { term: String },

    /// More keywords than the enrichment provider accepts in one call.
    #[error("batch of {size} keywords exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
}

impl SourceError {
    /// `true` for the upstream class of failures: the remote service was
    /// reached (or should have been) and did not give us usable data.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            SourceError::Http(_)
                | SourceError::UnexpectedStatus { .. }
                | SourceError::Deserialize { .. }
                | SourceError::Upstream { .. }
        )
    }

    /// Returns `true` for errors that are worth retrying after a back-off delay.
    ///
    /// **Retriable:**
    /// - Network-level failures (anything but a request-builder error).
    /// - HTTP 429 and 5xx.
    /// - Shape and parse failures.
    ///
    /// **Not retriable (hard stop):**
    /// - [`SourceError::InvalidInput`], [`SourceError::Configuration`] and
    ///   [`SourceError::BatchTooLarge`]: caller or deployment bugs.
    /// - [`SourceError::NoDataFound`]: the page parsed and was empty.
    /// - Other 4xx statuses: the request itself is wrong.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            SourceError::Http(e) => !e.is_builder(),
            SourceError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            SourceError::Deserialize { .. } | SourceError::Upstream { .. } => true,
            SourceError::InvalidInput(_)
            | SourceError::Configuration(_)
            | SourceError::NoDataFound { .. }
            | SourceError::BatchTooLarge { .. } => false,
        }
    }
}
