//! This module provides the main entry point for querying USGS NWIS water
//! data. Each reader composes the same pipeline: build the service URL,
//! fetch the response, parse it, and apply the dataset's post-processing.

use crate::error::NwisError;
use crate::rdb::{parse_rdb, rating_tokens, RdbTable};
use crate::request::build_url;
use crate::types::service::{RatingType, Service};
use crate::types::water_table::WaterTable;
use crate::waterml::{parse_waterml, WaterMlTable};
use bon::bon;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::{info, warn};
use polars::prelude::*;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Seconds before an in-flight request is abandoned. These are research
/// dataset queries, not latency-sensitive calls.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// The client struct for retrieving NWIS water data.
///
/// Each reader method issues a single blocking-equivalent GET and returns a
/// fresh [`WaterTable`]; the client holds no state beyond the HTTP
/// connection pool, so one instance can serve any number of independent
/// calls.
///
/// # Examples
///
/// ```no_run
/// # use nwis::{Nwis, NwisError};
/// # async fn run() -> Result<(), NwisError> {
/// let client = Nwis::new()?;
/// let discharge = client
///     .instantaneous_values()
///     .sites(vec!["05114000".to_string()])
///     .parameter_cd("00060")
///     .start_date("2014-10-10")
///     .end_date("2014-10-10")
///     .call()
///     .await?;
/// println!("{} observations from {}", discharge.height(), discharge.url);
/// # Ok(())
/// # }
/// ```
pub struct Nwis {
    http: Client,
}

#[bon]
impl Nwis {
    /// Creates a new `Nwis` client.
    ///
    /// # Errors
    ///
    /// Returns [`NwisError::ClientBuild`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new() -> Result<Self, NwisError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("nwis-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(NwisError::ClientBuild)?;
        Ok(Self { http })
    }

    /// Fetches instantaneous (unit) values for one or more sites.
    ///
    /// Queries the instantaneous-values service as WaterML. The `datetime`
    /// column comes back as a UTC-normalized timestamp: each observation's
    /// own reported offset is honored unless `tz` overrides it, so sites in
    /// different zones are normalized independently.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.sites(Vec<String>)`: **Required.** One or more site numbers.
    /// * `.parameter_cd(&str)`: **Required.** The parameter code (e.g. "00060" for discharge).
    /// * `.start_date(&str)` / `.end_date(&str)`: Optional ISO dates; omitted bounds fall back to the service's default range.
    /// * `.tz(Tz)`: Optional named zone overriding each site's reported offset.
    ///
    /// # Errors
    ///
    /// Returns [`NwisError::NetworkRequest`] / [`NwisError::HttpStatus`] for
    /// fetch failures and [`NwisError::WaterMl`] if the response is not
    /// well-formed WaterML. A response with zero matching observations is an
    /// empty table, not an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use nwis::{Nwis, NwisError};
    /// # async fn run() -> Result<(), NwisError> {
    /// let client = Nwis::new()?;
    /// let table = client
    ///     .instantaneous_values()
    ///     .sites(vec!["05114000".to_string(), "09423350".to_string()])
    ///     .parameter_cd("00060")
    ///     .start_date("2014-10-10")
    ///     .end_date("2014-10-10")
    ///     .call()
    ///     .await?;
    /// println!("{}", table.data);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn instantaneous_values(
        &self,
        sites: Vec<String>,
        parameter_cd: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        tz: Option<Tz>,
    ) -> Result<WaterTable, NwisError> {
        let url = build_url(
            &sites,
            Some(parameter_cd),
            start_date.unwrap_or(""),
            end_date.unwrap_or(""),
            Service::InstantaneousValues,
            RatingType::default(),
        )?;
        let body = self.fetch_text(&url).await?;
        let parsed = parse_waterml(&body, true, tz)?;
        Ok(waterml_table(parsed, url))
    }

    /// Fetches annual peak-flow events for a site.
    ///
    /// The peak-flow service has no markup representation, so the RDB table
    /// is used. Peak dates stay raw strings: historical records contain
    /// partial dates (e.g. `1919-06-00` when only the month is known) that
    /// cannot be represented as timestamps.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use nwis::{Nwis, NwisError};
    /// # async fn run() -> Result<(), NwisError> {
    /// let client = Nwis::new()?;
    /// let peaks = client.peak_flow().site("01594440").call().await?;
    /// println!("{} peak events", peaks.height());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn peak_flow(
        &self,
        site: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<WaterTable, NwisError> {
        let url = build_url(
            &[site.to_string()],
            None,
            start_date.unwrap_or(""),
            end_date.unwrap_or(""),
            Service::PeakFlow,
            RatingType::default(),
        )?;
        let body = self.fetch_text(&url).await?;
        Ok(rdb_table(parse_rdb(&body)?, url))
    }

    /// Fetches a rating table for a site.
    ///
    /// Defaults to the base table ([`RatingType::Base`]). For the base table
    /// the response's comment block carries a `//RATING` declaration; its
    /// whitespace-separated tokens are attached as [`WaterTable::rating`].
    /// A response without the declaration yields an empty token list, never
    /// an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use nwis::{Nwis, NwisError, RatingType};
    /// # async fn run() -> Result<(), NwisError> {
    /// let client = Nwis::new()?;
    /// let base = client.rating_curve().site("01594440").call().await?;
    /// println!("rating declaration: {:?}", base.rating);
    ///
    /// let expanded = client
    ///     .rating_curve()
    ///     .site("01594440")
    ///     .rating_type(RatingType::StageDischarge)
    ///     .call()
    ///     .await?;
    /// println!("{} stage-discharge rows", expanded.height());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn rating_curve(
        &self,
        site: &str,
        rating_type: Option<RatingType>,
    ) -> Result<WaterTable, NwisError> {
        let rating_type = rating_type.unwrap_or_default();
        let url = build_url(
            &[site.to_string()],
            None,
            "",
            "",
            Service::RatingCurve,
            rating_type,
        )?;
        let body = self.fetch_text(&url).await?;
        let mut table = rdb_table(parse_rdb(&body)?, url);
        if rating_type == RatingType::Base {
            let tokens = table
                .comment
                .as_deref()
                .map(rating_tokens)
                .unwrap_or_default();
            table.rating = Some(tokens);
        }
        Ok(table)
    }

    /// Fetches surface-water field measurements for a site.
    ///
    /// Uses the expanded RDB representation. Two post-processing steps are
    /// applied: the `diff_from_rating_pc` column, which the service encodes
    /// in a way that defeats automatic numeric inference, is coerced to
    /// floats (failing loudly on genuinely non-numeric cells); and a
    /// UTC-normalized `measurement_dateTime` column is derived from
    /// `measurement_dt` plus each row's reported zone code, using `tz` as
    /// the zone when given. Rows whose timestamp cannot be resolved get a
    /// null there, the raw text column is left untouched.
    #[builder]
    pub async fn field_measurements(
        &self,
        site: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        tz: Option<Tz>,
    ) -> Result<WaterTable, NwisError> {
        let url = build_url(
            &[site.to_string()],
            None,
            start_date.unwrap_or(""),
            end_date.unwrap_or(""),
            Service::FieldMeasurements,
            RatingType::default(),
        )?;
        let body = self.fetch_text(&url).await?;
        let mut table = rdb_table(parse_rdb(&body)?, url);
        coerce_numeric(&mut table.data, "diff_from_rating_pc")?;
        attach_measurement_datetime(&mut table.data, tz)?;
        Ok(table)
    }

    /// Fetches groundwater level records for one or more sites.
    ///
    /// Queries the groundwater-levels service as WaterML, but deliberately
    /// leaves the `datetime` column as raw text: historical groundwater
    /// records mix date-only and date-time granularity across years, so
    /// uniform timestamp parsing is unsafe. Callers wanting parsed
    /// timestamps must handle that granularity themselves downstream.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use nwis::{Nwis, NwisError};
    /// # async fn run() -> Result<(), NwisError> {
    /// let client = Nwis::new()?;
    /// let levels = client
    ///     .groundwater_levels()
    ///     .sites(vec!["434400121275801".to_string()])
    ///     .call()
    ///     .await?;
    /// println!("{}", levels.data);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn groundwater_levels(
        &self,
        sites: Vec<String>,
        parameter_cd: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<WaterTable, NwisError> {
        let url = build_url(
            &sites,
            parameter_cd,
            start_date.unwrap_or(""),
            end_date.unwrap_or(""),
            Service::GroundwaterLevels,
            RatingType::default(),
        )?;
        let body = self.fetch_text(&url).await?;
        let parsed = parse_waterml(&body, false, None)?;
        Ok(waterml_table(parsed, url))
    }
}

impl Nwis {
    async fn fetch_text(&self, url: &Url) -> Result<String, NwisError> {
        info!("Requesting {}", url);
        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| NwisError::NetworkRequest(url.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(match e.status() {
                    Some(status) => NwisError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => NwisError::NetworkRequest(url.to_string(), e),
                });
            }
        };
        response
            .text()
            .await
            .map_err(|e| NwisError::NetworkRequest(url.to_string(), e))
    }
}

fn waterml_table(parsed: WaterMlTable, url: Url) -> WaterTable {
    WaterTable {
        data: parsed.data,
        url: url.into(),
        site_info: Some(parsed.site_info),
        variable_info: Some(parsed.variable_info),
        statistic_info: Some(parsed.statistic_info),
        query_time: Utc::now(),
        comment: None,
        rating: None,
    }
}

fn rdb_table(parsed: RdbTable, url: Url) -> WaterTable {
    WaterTable {
        data: parsed.data,
        url: url.into(),
        site_info: None,
        variable_info: None,
        statistic_info: None,
        query_time: Utc::now(),
        comment: Some(parsed.comment),
        rating: None,
    }
}

/// Coerces a string column to floats in place.
///
/// A missing column is tolerated (not every site reports the field), as is
/// a column the RDB parser already inferred as numeric. Empty cells become
/// nulls; any other unparseable cell is an error.
fn coerce_numeric(df: &mut DataFrame, column: &str) -> Result<(), NwisError> {
    let values: Vec<Option<f64>> = {
        let Ok(col) = df.column(column) else {
            return Ok(());
        };
        if col.dtype().is_float() {
            return Ok(());
        }
        let ca = col.str()?;
        let mut out = Vec::with_capacity(ca.len());
        for value in ca.into_iter() {
            match value {
                None => out.push(None),
                Some(text) if text.trim().is_empty() => out.push(None),
                Some(text) => match text.trim().parse::<f64>() {
                    Ok(number) => out.push(Some(number)),
                    Err(_) => {
                        return Err(NwisError::NumericCoercion {
                            column: column.to_string(),
                            value: text.to_string(),
                        })
                    }
                },
            }
        }
        out
    };
    df.with_column(Column::new(column.into(), values))?;
    Ok(())
}

/// Derives a UTC `measurement_dateTime` column from the raw `measurement_dt`
/// text plus each row's reported zone code. Rows that cannot be resolved get
/// a null; the raw column is left untouched.
fn attach_measurement_datetime(df: &mut DataFrame, tz: Option<Tz>) -> Result<(), NwisError> {
    let millis: Vec<Option<i64>> = {
        let Ok(dt_col) = df.column("measurement_dt") else {
            return Ok(());
        };
        let Ok(dt_ca) = dt_col.str() else {
            return Ok(());
        };
        let zone_ca = df
            .column("tz_cd")
            .ok()
            .and_then(|col| col.str().ok())
            .cloned();
        dt_ca
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let zone_cd = zone_ca
                    .as_ref()
                    .and_then(|ca| ca.get(idx))
                    .unwrap_or_default();
                resolve_measurement_datetime(raw?, zone_cd, tz)
            })
            .collect()
    };
    let datetime = Column::new("measurement_dateTime".into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into())))?;
    df.with_column(datetime)?;
    Ok(())
}

fn resolve_measurement_datetime(raw: &str, zone_cd: &str, tz: Option<Tz>) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(Default::default())))
        .ok()?;
    let utc = match tz {
        Some(tz) => tz.from_local_datetime(&naive).earliest()?.with_timezone(&Utc),
        None => {
            let offset = zone_offset(zone_cd)?;
            offset
                .from_local_datetime(&naive)
                .earliest()?
                .with_timezone(&Utc)
        }
    };
    Some(utc.timestamp_millis())
}

/// Fixed offsets for the zone codes NWIS reports on measurement rows.
fn zone_offset(zone_cd: &str) -> Option<FixedOffset> {
    let hours = match zone_cd {
        "UTC" | "GMT" => 0,
        "AST" | "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" | "AKDT" => -8,
        "AKST" | "HDT" => -9,
        "HST" | "HAST" => -10,
        _ => return None,
    };
    FixedOffset::east_opt(hours * 3600)
}
