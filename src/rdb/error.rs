use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RdbError {
    #[error("RDB response has no header row")]
    MissingHeader,

    #[error("RDB response has no column-format row after the header")]
    MissingTypeRow,

    #[error("RDB column-format row has {found} fields but the header has {expected}")]
    TypeRowMismatch { expected: usize, found: usize },

    #[error("RDB data row {line} has {found} fields but the header has {expected}")]
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Failed to assemble RDB table")]
    Frame(#[from] PolarsError),
}
