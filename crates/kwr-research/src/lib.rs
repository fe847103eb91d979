//! Aggregates keyword candidates from every source into one ranked,
//! deduplicated list.
//!
//! Primary-site keywords always seed the result. Confident candidates from
//! search and autosuggest are enriched with paid metrics and merged in
//! without ever replacing an existing keyword.

pub mod aggregator;
pub mod error;
pub mod selection;

mod dedup;

pub use aggregator::KeywordResearcher;
pub use error::ResearchError;
pub use selection::ENRICHMENT_CONFIDENCE_THRESHOLD;
