//! Keyword candidate sources.

mod autosuggest;
mod llm;
mod primary;
mod search;

pub use autosuggest::AutosuggestClient;
pub use llm::LlmKeywordExtractor;
pub use primary::{parse_primary_page, PrimarySourceClient};
pub use search::{OrganicResult, SearchClient, SearchResults};
