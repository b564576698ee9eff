use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaterMlError {
    #[error("Response is not well-formed markup")]
    Xml(#[from] quick_xml::Error),

    #[error("Response has a malformed attribute")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("Response is not a WaterML time-series document (root element '{0}')")]
    UnexpectedRoot(String),

    #[error("Missing required element '{0}' in WaterML response")]
    MissingElement(&'static str),

    #[error("Cannot parse observation timestamp '{0}'")]
    InvalidDateTime(String),

    #[error("Cannot interpret timezone offset '{0}'")]
    InvalidOffset(String),

    #[error("Failed to assemble observation table")]
    Frame(#[from] PolarsError),
}
