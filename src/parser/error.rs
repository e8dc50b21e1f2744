// ==========================================
// Cut-List Import Pipeline - parse errors
// ==========================================

use thiserror::Error;

/// Failures that make a whole file (or a single value) unparseable.
/// Per-row data problems are NOT errors; they land in
/// `ParsedDocument::row_issues` and the file still imports.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid order number: {0:?}")]
    InvalidOrderNumber(String),

    #[error("invalid article number: {0:?}")]
    InvalidArticleNumber(String),

    #[error("no order number found in file")]
    MissingOrderNumber,

    #[error("file contains no usable requirement rows")]
    EmptyDocument,
}

pub type ParseResult<T> = Result<T, ParseError>;
