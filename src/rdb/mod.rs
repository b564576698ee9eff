mod error;
mod parser;

pub use error::RdbError;

pub(crate) use parser::{parse_rdb, rating_tokens, RdbTable};
