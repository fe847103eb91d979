use serde::{Deserialize, Serialize};

/// Where a keyword candidate came from. Never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSource {
    /// The scraped keyword-metrics site. Always seeds the dedup map.
    Primary,
    /// The search API's own "related searches" block.
    RelatedSearch,
    /// Autocomplete suggestions for the input term.
    Autosuggest,
    /// Phrases an LLM pulled out of the organic search results.
    LlmExtracted,
}

impl std::fmt::Display for KeywordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeywordSource::Primary => write!(f, "primary"),
            KeywordSource::RelatedSearch => write!(f, "related_search"),
            KeywordSource::Autosuggest => write!(f, "autosuggest"),
            KeywordSource::LlmExtracted => write!(f, "llm_extracted"),
        }
    }
}

/// One point of a monthly search-volume trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: String,
    pub year: i32,
    pub value: f64,
}

/// Monetizable metadata for a keyword.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetrics {
    /// Searches per month.
    pub volume: f64,
    /// Cost per click in currency units.
    pub cpc: f64,
    /// Provider-defined competition scale.
    pub competition: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trends: Vec<TrendPoint>,
}

impl KeywordMetrics {
    /// `true` when volume, CPC and competition are all exactly zero, which
    /// means "no data" rather than a real zero-volume keyword.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_empty(&self) -> bool {
        self.volume == 0.0 && self.cpc == 0.0 && self.competition == 0.0
    }
}

/// A single keyword suggestion from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCandidate {
    pub keyword: String,
    pub source: KeywordSource,
    /// How much the producing source trusts this candidate, in `[0, 1]`.
    /// `None` is treated as untrusted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Only the primary source ships metrics with its candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<KeywordMetrics>,
}

impl KeywordCandidate {
    #[must_use]
    pub fn new(keyword: impl Into<String>, source: KeywordSource) -> Self {
        Self {
            keyword: keyword.into(),
            source,
            confidence: None,
            context: None,
            metrics: None,
        }
    }

    /// Sets the confidence, clamped to `[0, 1]`. Non-finite values become `None`.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.is_finite().then(|| confidence.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: KeywordMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The dedup key for this candidate. See [`normalize_keyword`].
    #[must_use]
    pub fn normalized_key(&self) -> String {
        normalize_keyword(&self.keyword)
    }

    /// Confidence used for filtering; missing confidence counts as zero.
    #[must_use]
    pub fn effective_confidence(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }
}

/// Trims surrounding whitespace and lowercases.
///
/// Two keywords are the same keyword exactly when their normalized keys are
/// equal. Inner whitespace is left alone.
#[must_use]
pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}
