//! Film search core: analyzer, generation-based index store, boolean query
//! evaluation with TF-IDF ranking, title autocomplete and spelling suggestions.

pub mod autocomplete;
pub mod config;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod record;
pub mod search;
pub mod spelling;
pub mod store;
pub mod tokenizer;

pub type DocId = u32;

pub use config::SearchConfig;
pub use error::{FieldParseError, IngestError};
pub use index::{Generation, GenerationStats, Posting, RangeIndex};
pub use query::{build_query, Clause, Query, SearchRequest};
pub use record::{RawRecord, Record};
pub use search::{SearchHit, SearchResults};
pub use store::IndexStore;
