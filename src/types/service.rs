//! Enumerations describing the NWIS web services this crate can query and
//! the response representations they offer.

use std::fmt;

/// Identifies one of the NWIS dataset services.
///
/// Each service has its own base URL and query-parameter convention; the
/// request builder in [`crate::request`] owns those details. The service also
/// determines which response representation ([`Format`]) is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Instantaneous (unit) values, e.g. 15-minute discharge readings.
    InstantaneousValues,
    /// Annual peak-flow events.
    PeakFlow,
    /// Stage-discharge rating tables.
    RatingCurve,
    /// Surface-water field measurements made by hydrographers.
    FieldMeasurements,
    /// Groundwater level records.
    GroundwaterLevels,
}

impl Service {
    /// The response representation this service is queried in.
    ///
    /// Peak flow, ratings and field measurements are only published as RDB
    /// tables; the other two services are queried as WaterML.
    pub(crate) fn format(&self) -> Format {
        match self {
            Service::InstantaneousValues | Service::GroundwaterLevels => Format::WaterMl,
            Service::PeakFlow | Service::RatingCurve | Service::FieldMeasurements => Format::Rdb,
        }
    }

    /// Whether the service endpoint accepts a comma-joined list of sites.
    ///
    /// The waterdata RDB endpoints take exactly one `site_no` per request.
    pub(crate) fn allows_multiple_sites(&self) -> bool {
        matches!(
            self,
            Service::InstantaneousValues | Service::GroundwaterLevels
        )
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Service::InstantaneousValues => "instantaneous-values",
            Service::PeakFlow => "peak-flow",
            Service::RatingCurve => "rating-curve",
            Service::FieldMeasurements => "field-measurements",
            Service::GroundwaterLevels => "groundwater-levels",
        }
    }
}

/// Allows formatting a `Service` variant using its service name.
///
/// # Examples
///
/// ```
/// use nwis::Service;
///
/// assert_eq!(format!("{}", Service::PeakFlow), "peak-flow");
/// assert_eq!(Service::InstantaneousValues.to_string(), "instantaneous-values");
/// ```
impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The two response representations offered by the NWIS services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// WaterML 1.1 time-series markup.
    WaterMl,
    /// Tab-delimited RDB table with a leading comment block.
    Rdb,
}

/// Selects which rating table the rating service returns.
///
/// Only meaningful for [`Service::RatingCurve`]; the default is [`RatingType::Base`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RatingType {
    /// The base rating table. The response's comment block carries a
    /// `//RATING` declaration that is extracted into
    /// [`crate::WaterTable::rating`].
    #[default]
    Base,
    /// The base table with shift corrections applied.
    Corrected,
    /// The expanded stage-discharge table.
    StageDischarge,
}

impl RatingType {
    /// The `file_type` token the rating endpoint expects.
    pub(crate) fn file_type(&self) -> &'static str {
        match self {
            RatingType::Base => "base",
            RatingType::Corrected => "corr",
            RatingType::StageDischarge => "exsa",
        }
    }
}
