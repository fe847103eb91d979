//! HTTP clients that produce keyword candidates and enrich them.
//!
//! Three independent sources (a scraped metrics site, a search API with an
//! LLM extraction pass, and an autocomplete API) plus one paid enrichment
//! API. Every client validates its own input, takes its base URL in `new` so
//! tests can point it at a mock server, and reports failures as
//! [`SourceError`].

pub mod enrichment;
pub mod error;
pub mod options;
pub mod retry;
pub mod sources;

mod embedded_json;
mod numeric;

pub use enrichment::{
    EnrichedKeyword, EnrichmentClient, EnrichmentMetadata, EnrichmentParams, EnrichmentResult,
    MAX_ENRICHMENT_BATCH,
};
pub use error::SourceError;
pub use options::{ClientOptions, Locale};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use sources::{
    parse_primary_page, AutosuggestClient, LlmKeywordExtractor, OrganicResult,
    PrimarySourceClient, SearchClient, SearchResults,
};
