use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every credential is optional here. A missing key only disables the source
/// that needs it, and that source reports the problem when it is called.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("KWR_ENV", "development"))?;
    let log_level = or_default("KWR_LOG_LEVEL", "info");

    let metrics_site_url = optional("KWR_METRICS_SITE_URL");
    let metrics_marker = or_default("KWR_METRICS_MARKER", "__KEYWORD_DATA__");

    let serper_api_key = optional("SERPER_API_KEY");
    let serper_base_url = or_default("KWR_SERPER_BASE_URL", "https://google.serper.dev");

    let enrichment_api_key = optional("KEYWORDS_EVERYWHERE_API_KEY");
    let enrichment_base_url = or_default(
        "KWR_ENRICHMENT_BASE_URL",
        "https://api.keywordseverywhere.com",
    );

    let llm_api_key = optional("OPENAI_API_KEY");
    let llm_base_url = or_default("KWR_LLM_BASE_URL", "https://api.openai.com/v1");
    let llm_model = or_default("KWR_LLM_MODEL", "gpt-4o-mini");

    let country = or_default("KWR_COUNTRY", "us");
    let language = or_default("KWR_LANGUAGE", "en");
    let currency = or_default("KWR_CURRENCY", "usd");
    let data_source = or_default("KWR_DATA_SOURCE", "gkp");

    let request_timeout_secs = parse_u64("KWR_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("KWR_USER_AGENT", "kwr/0.1 (keyword-research)");

    let source_max_attempts = parse_u32("KWR_SOURCE_MAX_ATTEMPTS", "3")?;
    if source_max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "KWR_SOURCE_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let retry_backoff_base_ms = parse_u64("KWR_RETRY_BACKOFF_BASE_MS", "1000")?;

    Ok(AppConfig {
        env,
        log_level,
        metrics_site_url,
        metrics_marker,
        serper_api_key,
        serper_base_url,
        enrichment_api_key,
        enrichment_base_url,
        llm_api_key,
        llm_base_url,
        llm_model,
        country,
        language,
        currency,
        data_source,
        request_timeout_secs,
        user_agent,
        source_max_attempts,
        retry_backoff_base_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KWR_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
