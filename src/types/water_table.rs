//! The result wrapper returned by every reader.

use chrono::{DateTime, Utc};
use polars::frame::DataFrame;

/// An observation table plus the out-of-band metadata NWIS attaches to it.
///
/// The observation rows live in [`data`](Self::data); everything else
/// describes where the rows came from. Which metadata fields are populated
/// depends on the representation the service was queried in: WaterML
/// responses carry structured site/variable/statistic blocks, RDB responses
/// carry a free-text comment header instead.
///
/// A `WaterTable` is built fresh per call and never mutated after return.
#[derive(Debug, Clone)]
pub struct WaterTable {
    /// Observation rows. Leading columns are `agency_cd`, `site_no`,
    /// `datetime` and `tz_cd`, followed by one (`..._cd`, value) column pair
    /// per (parameter, statistic) combination present in the response.
    pub data: DataFrame,
    /// The exact URL the data was requested from.
    pub url: String,
    /// One row per distinct site in the response (WaterML-backed readers only).
    pub site_info: Option<DataFrame>,
    /// One row per distinct parameter in the response (WaterML-backed readers only).
    pub variable_info: Option<DataFrame>,
    /// One row per distinct statistic in the response (WaterML-backed readers only).
    pub statistic_info: Option<DataFrame>,
    /// When the query was made.
    pub query_time: DateTime<Utc>,
    /// The leading `#` comment block of an RDB response, verbatim.
    pub comment: Option<String>,
    /// Tokens of the `//RATING` declaration (rating reader, base table only).
    pub rating: Option<Vec<String>>,
}

impl WaterTable {
    /// Number of observation rows.
    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// True when the response was well-formed but matched zero observations.
    ///
    /// Empty results are never an error; callers check this instead of
    /// catching anything.
    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }
}
