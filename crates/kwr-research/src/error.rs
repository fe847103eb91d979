use thiserror::Error;

use kwr_sources::SourceError;

/// Errors that abort an aggregation run.
///
/// Source and enrichment failures never show up here: they are absorbed and
/// reported in the result metadata instead.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A client could not be built from configuration.
    #[error("failed to set up keyword sources: {0}")]
    Setup(#[from] SourceError),
}
