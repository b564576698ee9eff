mod error;
mod parser;

pub use error::WaterMlError;

pub(crate) use parser::{parse_waterml, WaterMlTable};
