//! Parser for the WaterML 1.1 time-series markup representation.
//!
//! A WaterML response carries one `timeSeries` element per (site, parameter,
//! statistic) combination. Each element holds a `sourceInfo` block (site
//! identity and default timezone), a `variable` block (parameter identity,
//! unit, statistic option, no-data sentinel) and a `values` block with one
//! `value` element per observation. The document is streamed with
//! `quick-xml` and assembled into a wide table: one row per (site, datetime)
//! and one qualifier/value column pair per (parameter, statistic)
//! combination, named through [`ColumnKey`].

use crate::types::column::ColumnKey;
use crate::waterml::error::WaterMlError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use polars::prelude::*;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{HashMap, HashSet};

/// The pieces a WaterML response decomposes into.
#[derive(Debug)]
pub(crate) struct WaterMlTable {
    pub data: DataFrame,
    pub site_info: DataFrame,
    pub variable_info: DataFrame,
    pub statistic_info: DataFrame,
}

#[derive(Debug, Default, Clone)]
struct SiteRecord {
    agency_cd: String,
    site_no: String,
    station_nm: String,
    dec_lat_va: Option<f64>,
    dec_lon_va: Option<f64>,
    tz_cd: String,
    tz_offset: String,
}

#[derive(Debug, Default, Clone)]
struct VariableRecord {
    parameter_cd: String,
    parameter_nm: String,
    parameter_desc: String,
    unit: String,
    no_data_value: Option<f64>,
    stat_cd: String,
    stat_nm: String,
}

impl VariableRecord {
    fn column_key(&self) -> ColumnKey {
        // Parameter names read like "Streamflow, ft³/s"; the short
        // description is the part before the first comma.
        let description = self.parameter_nm.split(',').next().unwrap_or("").trim();
        ColumnKey::new(description, &self.parameter_cd, &self.stat_cd)
    }
}

#[derive(Debug, Default, Clone)]
struct ObservationRecord {
    datetime: String,
    qualifiers: Option<String>,
    value: Option<String>,
}

struct TimeSeriesBlock {
    site: SiteRecord,
    variable: VariableRecord,
    values: Vec<ObservationRecord>,
}

/// Parses a WaterML 1.1 response body.
///
/// With `as_datetime` the `datetime` column becomes a UTC-normalized polars
/// `Datetime`; each observation's own embedded offset is honored, and
/// offset-less timestamps are interpreted in `tz` when given, else in the
/// site's reported default zone. Without it the raw timestamp text is
/// preserved, which is what the groundwater reader relies on for its
/// mixed-granularity records. Zero matching observations yield an empty
/// table, never an error.
pub(crate) fn parse_waterml(
    body: &str,
    as_datetime: bool,
    tz: Option<Tz>,
) -> Result<WaterMlTable, WaterMlError> {
    let blocks = read_blocks(body)?;
    assemble(blocks, as_datetime, tz)
}

fn read_blocks(body: &str) -> Result<Vec<TimeSeriesBlock>, WaterMlError> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);
    let mut blocks = Vec::new();
    let mut saw_root = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if !saw_root {
                    if e.local_name().as_ref() != b"timeSeriesResponse" {
                        return Err(WaterMlError::UnexpectedRoot(
                            String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                        ));
                    }
                    saw_root = true;
                } else if e.local_name().as_ref() == b"timeSeries" {
                    blocks.push(read_time_series(&mut reader)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !saw_root {
        return Err(WaterMlError::MissingElement("timeSeriesResponse"));
    }
    Ok(blocks)
}

fn read_time_series(reader: &mut Reader<&[u8]>) -> Result<TimeSeriesBlock, WaterMlError> {
    let mut site: Option<SiteRecord> = None;
    let mut variable: Option<VariableRecord> = None;
    let mut values = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sourceInfo" => site = Some(read_source_info(reader)?),
                b"variable" => variable = Some(read_variable(reader)?),
                b"values" => values.extend(read_values(reader)?),
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"timeSeries" => break,
            Event::Eof => return Err(WaterMlError::MissingElement("timeSeries")),
            _ => {}
        }
    }
    Ok(TimeSeriesBlock {
        site: site.ok_or(WaterMlError::MissingElement("sourceInfo"))?,
        variable: variable.ok_or(WaterMlError::MissingElement("variable"))?,
        values,
    })
}

fn attr_value(e: &BytesStart, name: &[u8]) -> Result<Option<String>, WaterMlError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn read_source_info(reader: &mut Reader<&[u8]>) -> Result<SiteRecord, WaterMlError> {
    let mut rec = SiteRecord::default();
    let mut current: Vec<u8> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                current = e.local_name().as_ref().to_vec();
                if current == b"siteCode" {
                    if let Some(agency) = attr_value(&e, b"agencyCode")? {
                        rec.agency_cd = agency;
                    }
                } else if current == b"defaultTimeZone" {
                    read_zone_attrs(&e, &mut rec)?;
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"defaultTimeZone" {
                    read_zone_attrs(&e, &mut rec)?;
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                match current.as_slice() {
                    b"siteName" => rec.station_nm = text,
                    b"siteCode" => rec.site_no = text,
                    b"latitude" => rec.dec_lat_va = text.trim().parse().ok(),
                    b"longitude" => rec.dec_lon_va = text.trim().parse().ok(),
                    _ => {}
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"sourceInfo" => break,
            Event::Eof => return Err(WaterMlError::MissingElement("sourceInfo")),
            _ => {}
        }
    }
    Ok(rec)
}

fn read_zone_attrs(e: &BytesStart, rec: &mut SiteRecord) -> Result<(), WaterMlError> {
    if let Some(offset) = attr_value(e, b"zoneOffset")? {
        rec.tz_offset = offset;
    }
    if let Some(abbrev) = attr_value(e, b"zoneAbbreviation")? {
        rec.tz_cd = abbrev;
    }
    Ok(())
}

fn read_variable(reader: &mut Reader<&[u8]>) -> Result<VariableRecord, WaterMlError> {
    let mut rec = VariableRecord::default();
    let mut current: Vec<u8> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                current = e.local_name().as_ref().to_vec();
                if current == b"option" {
                    // Only the Statistic option matters here; other options
                    // are not part of the column convention.
                    let is_statistic = attr_value(&e, b"name")?
                        .map(|name| name.eq_ignore_ascii_case("statistic"))
                        .unwrap_or(false);
                    if is_statistic {
                        if let Some(code) = attr_value(&e, b"optionCode")? {
                            rec.stat_cd = code;
                        }
                    } else {
                        current.clear();
                    }
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                match current.as_slice() {
                    b"variableCode" => rec.parameter_cd = text,
                    b"variableName" => rec.parameter_nm = text,
                    b"variableDescription" => rec.parameter_desc = text,
                    b"unitCode" => rec.unit = text,
                    b"noDataValue" => rec.no_data_value = text.trim().parse().ok(),
                    b"option" => rec.stat_nm = text,
                    _ => {}
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"variable" => break,
            Event::Eof => return Err(WaterMlError::MissingElement("variable")),
            _ => {}
        }
    }
    Ok(rec)
}

fn read_values(reader: &mut Reader<&[u8]>) -> Result<Vec<ObservationRecord>, WaterMlError> {
    let mut out = Vec::new();
    let mut pending: Option<ObservationRecord> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"value" => {
                let mut obs = ObservationRecord::default();
                if let Some(datetime) = attr_value(&e, b"dateTime")? {
                    obs.datetime = datetime;
                }
                obs.qualifiers = attr_value(&e, b"qualifiers")?;
                pending = Some(obs);
            }
            Event::Text(t) => {
                if let Some(obs) = pending.as_mut() {
                    obs.value = Some(t.unescape()?.into_owned());
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"value" => {
                    if let Some(obs) = pending.take() {
                        out.push(obs);
                    }
                }
                b"values" => break,
                _ => {}
            },
            Event::Eof => return Err(WaterMlError::MissingElement("values")),
            _ => {}
        }
    }
    Ok(out)
}

fn assemble(
    blocks: Vec<TimeSeriesBlock>,
    as_datetime: bool,
    tz: Option<Tz>,
) -> Result<WaterMlTable, WaterMlError> {
    // Row index over (agency, site, timestamp), in first-seen order.
    let mut row_keys: Vec<(String, String, String)> = Vec::new();
    let mut row_lookup: HashMap<(String, String, String), usize> = HashMap::new();
    let mut row_tz: Vec<String> = Vec::new();
    let mut row_offset: Vec<String> = Vec::new();
    for block in &blocks {
        for obs in &block.values {
            let key = (
                block.site.agency_cd.clone(),
                block.site.site_no.clone(),
                obs.datetime.clone(),
            );
            if !row_lookup.contains_key(&key) {
                row_lookup.insert(key.clone(), row_keys.len());
                row_keys.push(key);
                row_tz.push(match tz {
                    Some(tz) => tz.name().to_string(),
                    None => block.site.tz_cd.clone(),
                });
                row_offset.push(block.site.tz_offset.clone());
            }
        }
    }
    let n_rows = row_keys.len();

    // One qualifier/value column pair per (parameter, statistic), filled by
    // row index so sites sharing a timestamp land on the same row.
    type Pair = (Vec<Option<String>>, Vec<Option<f64>>);
    let mut pair_order: Vec<ColumnKey> = Vec::new();
    let mut pairs: HashMap<ColumnKey, Pair> = HashMap::new();
    for block in &blocks {
        let key = block.variable.column_key();
        if !pairs.contains_key(&key) {
            pair_order.push(key.clone());
        }
        let no_data = block.variable.no_data_value;
        let (qualifiers, values) = pairs
            .entry(key)
            .or_insert_with(|| (vec![None; n_rows], vec![None; n_rows]));
        for obs in &block.values {
            let row_key = (
                block.site.agency_cd.clone(),
                block.site.site_no.clone(),
                obs.datetime.clone(),
            );
            if let Some(&idx) = row_lookup.get(&row_key) {
                qualifiers[idx] = obs.qualifiers.clone();
                values[idx] = convert_value(obs.value.as_deref(), no_data);
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(4 + 2 * pair_order.len());
    columns.push(Column::new(
        "agency_cd".into(),
        row_keys.iter().map(|k| k.0.clone()).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        "site_no".into(),
        row_keys.iter().map(|k| k.1.clone()).collect::<Vec<_>>(),
    ));
    columns.push(datetime_column(&row_keys, &row_offset, as_datetime, tz)?);
    columns.push(Column::new("tz_cd".into(), row_tz));
    for key in &pair_order {
        if let Some((qualifiers, values)) = pairs.remove(key) {
            columns.push(Column::new(key.qualifier_name().into(), qualifiers));
            columns.push(Column::new(key.value_name().into(), values));
        }
    }

    Ok(WaterMlTable {
        data: DataFrame::new(columns)?,
        site_info: site_info_frame(&blocks)?,
        variable_info: variable_info_frame(&blocks)?,
        statistic_info: statistic_info_frame(&blocks)?,
    })
}

fn convert_value(value: Option<&str>, no_data: Option<f64>) -> Option<f64> {
    let parsed: f64 = value?.trim().parse().ok()?;
    match no_data {
        Some(sentinel) if parsed == sentinel => None,
        _ => Some(parsed),
    }
}

fn datetime_column(
    row_keys: &[(String, String, String)],
    row_offset: &[String],
    as_datetime: bool,
    tz: Option<Tz>,
) -> Result<Column, WaterMlError> {
    if !as_datetime {
        return Ok(Column::new(
            "datetime".into(),
            row_keys.iter().map(|k| k.2.clone()).collect::<Vec<_>>(),
        ));
    }
    let mut millis: Vec<Option<i64>> = Vec::with_capacity(row_keys.len());
    for (key, offset) in row_keys.iter().zip(row_offset) {
        millis.push(parse_datetime_utc(&key.2, offset, tz)?.map(|dt| dt.timestamp_millis()));
    }
    Ok(Column::new("datetime".into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into())))?)
}

/// Resolves one observation timestamp to UTC.
///
/// An offset embedded in the text wins; a bare timestamp is interpreted in
/// the override zone when given, else in the site's default offset, else UTC.
fn parse_datetime_utc(
    raw: &str,
    default_offset: &str,
    tz: Option<Tz>,
) -> Result<Option<DateTime<Utc>>, WaterMlError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| {
                d.and_hms_opt(0, 0, 0)
                    .unwrap_or_else(|| NaiveDateTime::MIN)
            })
        })
        .map_err(|_| WaterMlError::InvalidDateTime(raw.to_string()))?;
    if let Some(tz) = tz {
        return tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .ok_or_else(|| WaterMlError::InvalidDateTime(raw.to_string()));
    }
    if default_offset.is_empty() {
        return Ok(Some(Utc.from_utc_datetime(&naive)));
    }
    let offset: FixedOffset = default_offset
        .parse()
        .map_err(|_| WaterMlError::InvalidOffset(default_offset.to_string()))?;
    offset
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .ok_or_else(|| WaterMlError::InvalidDateTime(raw.to_string()))
}

fn site_info_frame(blocks: &[TimeSeriesBlock]) -> Result<DataFrame, PolarsError> {
    let mut seen = HashSet::new();
    let mut agency = Vec::new();
    let mut site_no = Vec::new();
    let mut station_nm = Vec::new();
    let mut lat = Vec::new();
    let mut lon = Vec::new();
    let mut tz_cd = Vec::new();
    for block in blocks {
        let site = &block.site;
        if seen.insert(site.site_no.clone()) {
            agency.push(site.agency_cd.clone());
            site_no.push(site.site_no.clone());
            station_nm.push(site.station_nm.clone());
            lat.push(site.dec_lat_va);
            lon.push(site.dec_lon_va);
            tz_cd.push(site.tz_cd.clone());
        }
    }
    DataFrame::new(vec![
        Column::new("agency_cd".into(), agency),
        Column::new("site_no".into(), site_no),
        Column::new("station_nm".into(), station_nm),
        Column::new("dec_lat_va".into(), lat),
        Column::new("dec_lon_va".into(), lon),
        Column::new("tz_cd".into(), tz_cd),
    ])
}

fn variable_info_frame(blocks: &[TimeSeriesBlock]) -> Result<DataFrame, PolarsError> {
    let mut seen = HashSet::new();
    let mut parameter_cd = Vec::new();
    let mut parameter_nm = Vec::new();
    let mut parameter_desc = Vec::new();
    let mut unit = Vec::new();
    let mut no_data = Vec::new();
    for block in blocks {
        let variable = &block.variable;
        if seen.insert(variable.parameter_cd.clone()) {
            parameter_cd.push(variable.parameter_cd.clone());
            parameter_nm.push(variable.parameter_nm.clone());
            parameter_desc.push(variable.parameter_desc.clone());
            unit.push(variable.unit.clone());
            no_data.push(variable.no_data_value);
        }
    }
    DataFrame::new(vec![
        Column::new("parameter_cd".into(), parameter_cd),
        Column::new("parameter_nm".into(), parameter_nm),
        Column::new("parameter_desc".into(), parameter_desc),
        Column::new("unit".into(), unit),
        Column::new("no_data_value".into(), no_data),
    ])
}

fn statistic_info_frame(blocks: &[TimeSeriesBlock]) -> Result<DataFrame, PolarsError> {
    let mut seen = HashSet::new();
    let mut stat_cd = Vec::new();
    let mut stat_nm = Vec::new();
    for block in blocks {
        let variable = &block.variable;
        if variable.stat_cd.is_empty() && variable.stat_nm.is_empty() {
            continue;
        }
        if seen.insert(variable.stat_cd.clone()) {
            stat_cd.push(variable.stat_cd.clone());
            stat_nm.push(variable.stat_nm.clone());
        }
    }
    DataFrame::new(vec![
        Column::new("stat_cd".into(), stat_cd),
        Column::new("stat_nm".into(), stat_nm),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn discharge_response() -> String {
        let series_a = time_series(
            "USGS",
            "05114000",
            "SOURIS RIVER NR SHERWOOD, ND",
            "-06:00",
            "CST",
            &[
                ("2014-10-10T00:00:00.000-05:00", "P", "125"),
                ("2014-10-10T00:15:00.000-05:00", "P", "-999999"),
            ],
        );
        let series_b = time_series(
            "USGS",
            "09423350",
            "CARUTHERS C NR IVANPAH, CA",
            "-08:00",
            "PST",
            &[("2014-10-10T00:00:00.000-08:00", "A e", "130")],
        );
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ns1:timeSeriesResponse xmlns:ns1=\"http://www.cuahsi.org/waterML/1.1/\">\
             <ns1:queryInfo><ns1:creationTime>2014-10-11T00:00:00Z</ns1:creationTime></ns1:queryInfo>\
             {series_a}{series_b}\
             </ns1:timeSeriesResponse>"
        )
    }

    fn time_series(
        agency: &str,
        site: &str,
        name: &str,
        offset: &str,
        abbrev: &str,
        values: &[(&str, &str, &str)],
    ) -> String {
        let values_xml: String = values
            .iter()
            .map(|(dt, qual, val)| {
                format!(
                    "<ns1:value dateTime=\"{dt}\" qualifiers=\"{qual}\">{val}</ns1:value>"
                )
            })
            .collect();
        format!(
            "<ns1:timeSeries>\
             <ns1:sourceInfo>\
             <ns1:siteName>{name}</ns1:siteName>\
             <ns1:siteCode network=\"NWIS\" agencyCode=\"{agency}\">{site}</ns1:siteCode>\
             <ns1:timeZoneInfo siteUsesDaylightSavingsTime=\"true\">\
             <ns1:defaultTimeZone zoneOffset=\"{offset}\" zoneAbbreviation=\"{abbrev}\"/>\
             </ns1:timeZoneInfo>\
             <ns1:geoLocation><ns1:geogLocation>\
             <ns1:latitude>48.99</ns1:latitude><ns1:longitude>-101.96</ns1:longitude>\
             </ns1:geogLocation></ns1:geoLocation>\
             </ns1:sourceInfo>\
             <ns1:variable>\
             <ns1:variableCode vocabulary=\"NWIS\">00060</ns1:variableCode>\
             <ns1:variableName>Streamflow, ft&#179;/s</ns1:variableName>\
             <ns1:variableDescription>Discharge, cubic feet per second</ns1:variableDescription>\
             <ns1:unit><ns1:unitCode>ft3/s</ns1:unitCode></ns1:unit>\
             <ns1:options>\
             <ns1:option name=\"Statistic\" optionCode=\"00000\">Instantaneous</ns1:option>\
             </ns1:options>\
             <ns1:noDataValue>-999999.0</ns1:noDataValue>\
             </ns1:variable>\
             <ns1:values>{values_xml}</ns1:values>\
             </ns1:timeSeries>"
        )
    }

    #[test]
    fn one_row_per_observation() {
        let table = parse_waterml(&discharge_response(), true, None).unwrap();
        assert_eq!(table.data.height(), 3);
        assert_eq!(
            table.data.get_column_names(),
            [
                "agency_cd",
                "site_no",
                "datetime",
                "tz_cd",
                "X_Streamflow_00060_00000_cd",
                "X_Streamflow_00060_00000",
            ]
        );
    }

    #[test]
    fn embedded_offsets_are_normalized_to_utc() {
        let table = parse_waterml(&discharge_response(), true, None).unwrap();
        let datetime = table.data.column("datetime").unwrap().datetime().unwrap();
        // 2014-10-10T00:00:00-05:00 == 05:00Z
        assert_eq!(
            datetime.get(0),
            Some(
                Utc.with_ymd_and_hms(2014, 10, 10, 5, 0, 0)
                    .unwrap()
                    .timestamp_millis()
            )
        );
        // The second site reports -08:00; its offset is honored independently.
        assert_eq!(
            datetime.get(2),
            Some(
                Utc.with_ymd_and_hms(2014, 10, 10, 8, 0, 0)
                    .unwrap()
                    .timestamp_millis()
            )
        );
    }

    #[test]
    fn no_data_sentinel_becomes_null() {
        let table = parse_waterml(&discharge_response(), true, None).unwrap();
        let values = table
            .data
            .column("X_Streamflow_00060_00000")
            .unwrap()
            .f64()
            .unwrap();
        assert_eq!(values.get(0), Some(125.0));
        assert_eq!(values.get(1), None);
        assert_eq!(values.get(2), Some(130.0));
    }

    #[test]
    fn qualifiers_land_in_the_cd_column() {
        let table = parse_waterml(&discharge_response(), true, None).unwrap();
        let qualifiers = table
            .data
            .column("X_Streamflow_00060_00000_cd")
            .unwrap()
            .str()
            .unwrap();
        assert_eq!(qualifiers.get(0), Some("P"));
        assert_eq!(qualifiers.get(2), Some("A e"));
    }

    #[test]
    fn rows_carry_their_site_identity() {
        let table = parse_waterml(&discharge_response(), true, None).unwrap();
        let site_no = table.data.column("site_no").unwrap().str().unwrap();
        assert_eq!(site_no.get(0), Some("05114000"));
        assert_eq!(site_no.get(2), Some("09423350"));
    }

    #[test]
    fn side_tables_describe_sites_and_variables() {
        let table = parse_waterml(&discharge_response(), true, None).unwrap();
        assert_eq!(table.site_info.height(), 2);
        let names = table.site_info.column("station_nm").unwrap();
        assert_eq!(
            names.str().unwrap().get(0),
            Some("SOURIS RIVER NR SHERWOOD, ND")
        );
        assert_eq!(table.variable_info.height(), 1);
        assert_eq!(
            table
                .variable_info
                .column("parameter_cd")
                .unwrap()
                .str()
                .unwrap()
                .get(0),
            Some("00060")
        );
        assert_eq!(table.statistic_info.height(), 1);
        assert_eq!(
            table
                .statistic_info
                .column("stat_nm")
                .unwrap()
                .str()
                .unwrap()
                .get(0),
            Some("Instantaneous")
        );
    }

    #[test]
    fn raw_text_preserved_when_not_parsing_datetimes() {
        // Groundwater records mix date-only and full-timestamp granularity
        // across years; they must come back untouched.
        let body = format!(
            "<ns1:timeSeriesResponse xmlns:ns1=\"http://www.cuahsi.org/waterML/1.1/\">{}\
             </ns1:timeSeriesResponse>",
            time_series(
                "USGS",
                "434400121275801",
                "EXAMPLE WELL",
                "-06:00",
                "CST",
                &[
                    ("2010-05-01", "", "5.2"),
                    ("2015-06-01T12:00:00", "", "6.1"),
                ],
            )
        );
        let table = parse_waterml(&body, false, None).unwrap();
        let datetime = table.data.column("datetime").unwrap().str().unwrap();
        assert_eq!(datetime.get(0), Some("2010-05-01"));
        assert_eq!(datetime.get(1), Some("2015-06-01T12:00:00"));
    }

    #[test]
    fn bare_timestamps_use_the_override_zone() {
        let body = format!(
            "<ns1:timeSeriesResponse xmlns:ns1=\"http://www.cuahsi.org/waterML/1.1/\">{}\
             </ns1:timeSeriesResponse>",
            time_series(
                "USGS",
                "05114000",
                "EXAMPLE",
                "-06:00",
                "CST",
                &[("2014-01-15T12:00:00", "P", "10")],
            )
        );
        let tz: Tz = "America/New_York".parse().unwrap();
        let table = parse_waterml(&body, true, Some(tz)).unwrap();
        let datetime = table.data.column("datetime").unwrap().datetime().unwrap();
        // Noon Eastern in January is 17:00Z.
        assert_eq!(
            datetime.get(0),
            Some(
                Utc.with_ymd_and_hms(2014, 1, 15, 17, 0, 0)
                    .unwrap()
                    .timestamp_millis()
            )
        );
        let tz_cd = table.data.column("tz_cd").unwrap().str().unwrap();
        assert_eq!(tz_cd.get(0), Some("America/New_York"));
    }

    #[test]
    fn bare_timestamps_fall_back_to_the_site_offset() {
        let body = format!(
            "<ns1:timeSeriesResponse xmlns:ns1=\"http://www.cuahsi.org/waterML/1.1/\">{}\
             </ns1:timeSeriesResponse>",
            time_series(
                "USGS",
                "05114000",
                "EXAMPLE",
                "-06:00",
                "CST",
                &[("2014-01-15T12:00:00", "P", "10")],
            )
        );
        let table = parse_waterml(&body, true, None).unwrap();
        let datetime = table.data.column("datetime").unwrap().datetime().unwrap();
        assert_eq!(
            datetime.get(0),
            Some(
                Utc.with_ymd_and_hms(2014, 1, 15, 18, 0, 0)
                    .unwrap()
                    .timestamp_millis()
            )
        );
    }

    #[test]
    fn zero_observations_is_a_valid_empty_table() {
        let body = "<ns1:timeSeriesResponse \
                    xmlns:ns1=\"http://www.cuahsi.org/waterML/1.1/\">\
                    <ns1:queryInfo/></ns1:timeSeriesResponse>";
        let table = parse_waterml(body, true, None).unwrap();
        assert_eq!(table.data.height(), 0);
        assert_eq!(table.site_info.height(), 0);
    }

    #[test]
    fn non_waterml_root_is_an_error() {
        let err = parse_waterml("<html><body>Oops</body></html>", true, None).unwrap_err();
        assert!(matches!(err, WaterMlError::UnexpectedRoot(root) if root == "html"));
    }

    #[test]
    fn malformed_markup_is_an_error() {
        let body = "<ns1:timeSeriesResponse><ns1:timeSeries><ns1:sourceInfo>";
        assert!(parse_waterml(body, true, None).is_err());
    }

    #[test]
    fn parsing_is_idempotent() {
        let body = discharge_response();
        let first = parse_waterml(&body, true, None).unwrap();
        let second = parse_waterml(&body, true, None).unwrap();
        assert!(first.data.equals_missing(&second.data));
        assert!(first.site_info.equals_missing(&second.site_info));
    }
}
