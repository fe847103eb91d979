#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Keyword-metrics site scraped for primary candidates.
    pub metrics_site_url: Option<String>,
    /// Token that precedes the embedded keyword JSON on the metrics site.
    pub metrics_marker: String,
    pub serper_api_key: Option<String>,
    pub serper_base_url: String,
    pub enrichment_api_key: Option<String>,
    pub enrichment_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub country: String,
    pub language: String,
    pub currency: String,
    pub data_source: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub source_max_attempts: u32,
    pub retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("metrics_site_url", &self.metrics_site_url)
            .field("metrics_marker", &self.metrics_marker)
            .field(
                "serper_api_key",
                &self.serper_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("serper_base_url", &self.serper_base_url)
            .field(
                "enrichment_api_key",
                &self.enrichment_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("enrichment_base_url", &self.enrichment_base_url)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("country", &self.country)
            .field("language", &self.language)
            .field("currency", &self.currency)
            .field("data_source", &self.data_source)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("source_max_attempts", &self.source_max_attempts)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}
