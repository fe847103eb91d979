//! Shared domain types and configuration for keyword research.

pub mod app_config;
pub mod config;
pub mod keyword;
pub mod result;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use keyword::{normalize_keyword, KeywordCandidate, KeywordMetrics, KeywordSource, TrendPoint};
pub use result::{
    AggregationMetadata, AggregationResult, DeduplicationReport, EnrichmentUsage, SourceCounts,
    SourceFailure, UnifiedKeyword,
};

use thiserror::Error;

/// Every setting has a default, so only a present but unusable value fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
