//! Query-URL construction for the NWIS web services.
//!
//! Every reader funnels through [`build_url`]; the per-service base paths
//! and parameter names are owned here and nowhere else.

use crate::error::NwisError;
use crate::types::service::{Format, RatingType, Service};
use url::Url;

const WATERSERVICES_IV: &str = "https://waterservices.usgs.gov/nwis/iv/";
const WATERSERVICES_GWLEVELS: &str = "https://waterservices.usgs.gov/nwis/gwlevels/";
const WATERDATA_PEAK: &str = "https://nwis.waterdata.usgs.gov/usa/nwis/peak/";
const WATERDATA_RATINGS: &str = "https://nwis.waterdata.usgs.gov/nwisweb/get_ratings/";
const WATERDATA_MEASUREMENTS: &str = "https://waterdata.usgs.gov/nwis/measurements/";

/// Builds the query URL for one request against an NWIS service.
///
/// Sites are comma-joined for the waterservices endpoints; the waterdata RDB
/// endpoints accept exactly one site. An absent parameter code omits the
/// query pair entirely rather than sending an empty value. Date bounds are
/// passed through unmodified; an empty bound is omitted and the service
/// applies its default range. `rating_type` is honored only by the rating
/// service.
pub(crate) fn build_url(
    sites: &[String],
    parameter_cd: Option<&str>,
    start_date: &str,
    end_date: &str,
    service: Service,
    rating_type: RatingType,
) -> Result<Url, NwisError> {
    if sites.is_empty() || sites.iter().all(|s| s.trim().is_empty()) {
        return Err(NwisError::NoSitesProvided);
    }
    if sites.len() > 1 && !service.allows_multiple_sites() {
        return Err(NwisError::SingleSiteService(service));
    }

    let base = match service {
        Service::InstantaneousValues => WATERSERVICES_IV,
        Service::GroundwaterLevels => WATERSERVICES_GWLEVELS,
        Service::PeakFlow => WATERDATA_PEAK,
        Service::RatingCurve => WATERDATA_RATINGS,
        Service::FieldMeasurements => WATERDATA_MEASUREMENTS,
    };
    let mut url = Url::parse(base)?;

    {
        let mut query = url.query_pairs_mut();
        match service.format() {
            Format::WaterMl => {
                query.append_pair("sites", &sites.join(","));
                let format = if service == Service::InstantaneousValues {
                    "waterml,1.1"
                } else {
                    "waterml"
                };
                query.append_pair("format", format);
                if let Some(parameter_cd) = parameter_cd.filter(|p| !p.is_empty()) {
                    query.append_pair("parameterCd", parameter_cd);
                }
                if !start_date.is_empty() {
                    query.append_pair("startDT", start_date);
                }
                if !end_date.is_empty() {
                    query.append_pair("endDT", end_date);
                }
            }
            Format::Rdb if service == Service::RatingCurve => {
                query.append_pair("site_no", &sites[0]);
                query.append_pair("file_type", rating_type.file_type());
            }
            Format::Rdb => {
                query.append_pair("site_no", &sites[0]);
                query.append_pair("range_selection", "date_range");
                if !start_date.is_empty() {
                    query.append_pair("begin_date", start_date);
                }
                if !end_date.is_empty() {
                    query.append_pair("end_date", end_date);
                }
                let format = if service == Service::PeakFlow {
                    "rdb"
                } else {
                    "rdb_expanded"
                };
                query.append_pair("format", format);
            }
        }
    }

    Ok(url)
}
