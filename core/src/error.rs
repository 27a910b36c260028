use thiserror::Error;

/// Why a rebuild was refused. The previously installed generation stays current.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("no valid records to index ({skipped} skipped)")]
    NoValidRecords { skipped: usize },
    #[error("too many records for one generation: {count}")]
    TooManyRecords { count: usize },
}

/// A single optional field of a single record that could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("record {record}: cannot parse {field} from {value:?}: {reason}")]
pub struct FieldParseError {
    pub record: String,
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}
