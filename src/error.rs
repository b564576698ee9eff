use crate::rdb::RdbError;
use crate::types::service::Service;
use crate::waterml::WaterMlError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NwisError {
    #[error(transparent)]
    WaterMl(#[from] WaterMlError),

    #[error(transparent)]
    Rdb(#[from] RdbError),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("At least one site number is required")]
    NoSitesProvided,

    #[error("The {0} service accepts a single site number per request")]
    SingleSiteService(Service),

    #[error("Failed to construct request URL")]
    UrlConstruction(#[from] url::ParseError),

    #[error("Column '{column}' contains a value that cannot be parsed as a number: '{value}'")]
    NumericCoercion { column: String, value: String },

    #[error("Failed processing result table")]
    Polars(#[from] PolarsError),
}
