//! Parser for the NWIS RDB delimited-table representation.
//!
//! An RDB response is a block of `#`-prefixed comment lines, a tab-delimited
//! header row, a column-format row (codes like `5s`, `14n`, `10d` whose
//! trailing letter declares the column type), then one data row per record.
//! The comment block is retained verbatim; it is the only place the RDB
//! representation carries provenance, and the rating reader later scans it
//! for the `//RATING` declaration.

use crate::rdb::error::RdbError;
use polars::prelude::*;

/// A parsed RDB table: the data rows plus the retained comment block.
#[derive(Debug)]
pub(crate) struct RdbTable {
    pub comment: String,
    pub data: DataFrame,
}

/// Parses one RDB response body.
///
/// Columns declared numeric (`n`) become `Float64` with empty cells as
/// nulls; if any non-empty cell fails to parse, the whole column falls back
/// to strings, since several services ship free-text codes in nominally
/// numeric columns. Date (`d`) and string (`s`) columns stay raw text. A
/// well-formed response with zero data rows yields an empty table, not an
/// error.
pub(crate) fn parse_rdb(body: &str) -> Result<RdbTable, RdbError> {
    let mut comment_lines: Vec<&str> = Vec::new();
    let mut lines = body.lines().enumerate();

    let header: Vec<String> = loop {
        match lines.next() {
            Some((_, line)) if line.starts_with('#') => comment_lines.push(line),
            Some((_, line)) if line.trim().is_empty() => {}
            Some((_, line)) => break line.split('\t').map(str::to_string).collect(),
            None => return Err(RdbError::MissingHeader),
        }
    };

    let type_codes: Vec<char> = loop {
        match lines.next() {
            Some((_, line)) if line.starts_with('#') => comment_lines.push(line),
            Some((_, line)) => break parse_type_row(line, header.len())?,
            None => return Err(RdbError::MissingTypeRow),
        }
    };

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); header.len()];
    for (idx, line) in lines {
        if line.starts_with('#') {
            comment_lines.push(line);
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() > header.len() {
            return Err(RdbError::ColumnCountMismatch {
                line: idx + 1,
                expected: header.len(),
                found: fields.len(),
            });
        }
        // Rows may come up short when trailing tabs were trimmed in transit.
        for (col, cell) in cells.iter_mut().enumerate() {
            let field = fields.get(col).copied().unwrap_or("");
            cell.push(if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            });
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(header.len());
    for ((name, type_code), values) in header.iter().zip(&type_codes).zip(cells) {
        columns.push(build_column(name, *type_code, values));
    }

    Ok(RdbTable {
        comment: comment_lines.join("\n"),
        data: DataFrame::new(columns)?,
    })
}

/// Extracts the tokens of a `//RATING` declaration from an RDB comment block.
///
/// Returns an empty list when no such line exists; the marker is optional in
/// the wild and its absence is not a defect in the response.
pub(crate) fn rating_tokens(comment: &str) -> Vec<String> {
    comment
        .lines()
        .filter_map(|line| {
            line.trim_start_matches('#')
                .trim_start()
                .strip_prefix("//RATING ")
        })
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}

fn parse_type_row(line: &str, expected: usize) -> Result<Vec<char>, RdbError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != expected {
        return Err(RdbError::TypeRowMismatch {
            expected,
            found: fields.len(),
        });
    }
    let mut codes = Vec::with_capacity(fields.len());
    for field in fields {
        let field = field.trim();
        let valid = !field.is_empty()
            && field
                .chars()
                .rev()
                .skip(1)
                .all(|c| c.is_ascii_digit());
        let code = field.chars().last().filter(|c| c.is_ascii_alphabetic());
        match (valid, code) {
            (true, Some(code)) => codes.push(code.to_ascii_lowercase()),
            _ => return Err(RdbError::MissingTypeRow),
        }
    }
    Ok(codes)
}

fn build_column(name: &str, type_code: char, values: Vec<Option<String>>) -> Column {
    if type_code == 'n' {
        let parsed: Option<Vec<Option<f64>>> = values
            .iter()
            .map(|v| match v {
                None => Some(None),
                Some(text) => text.trim().parse::<f64>().ok().map(Some),
            })
            .collect();
        // Unparseable non-empty cell: automatic inference gives up, keep text.
        if let Some(numbers) = parsed {
            return Column::new(name.into(), numbers);
        }
    }
    Column::new(name.into(), values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEAK_RDB: &str = "\
#\n\
# U.S. Geological Survey\n\
# National Water Information System\n\
#\n\
agency_cd\tsite_no\tpeak_dt\tpeak_tm\tpeak_va\tpeak_cd\n\
5s\t15s\t10d\t6s\t8n\t27s\n\
USGS\t01594440\t1969-08-04\t\t1330\t\n\
USGS\t01594440\t1970-07-13\t\t3020\t1\n\
USGS\t01594440\t1919-06-00\t\t2050\t2\n";

    #[test]
    fn parses_header_types_and_rows() {
        let table = parse_rdb(PEAK_RDB).unwrap();
        assert_eq!(table.data.shape(), (3, 6));
        assert_eq!(
            table.data.get_column_names(),
            ["agency_cd", "site_no", "peak_dt", "peak_tm", "peak_va", "peak_cd"]
        );
        assert_eq!(table.data.column("peak_va").unwrap().dtype(), &DataType::Float64);
        // Date columns stay raw text; partial dates like 1919-06-00 survive.
        assert_eq!(table.data.column("peak_dt").unwrap().dtype(), &DataType::String);
        assert_eq!(
            table.data.column("peak_dt").unwrap().str().unwrap().get(2),
            Some("1919-06-00")
        );
    }

    #[test]
    fn comment_block_is_retained_verbatim() {
        let table = parse_rdb(PEAK_RDB).unwrap();
        assert!(table.comment.contains("# U.S. Geological Survey"));
        assert!(table.comment.starts_with('#'));
        assert!(!table.comment.contains("agency_cd"));
    }

    #[test]
    fn empty_cells_become_nulls() {
        let table = parse_rdb(PEAK_RDB).unwrap();
        let peak_cd = table.data.column("peak_cd").unwrap();
        assert_eq!(peak_cd.str().unwrap().get(0), None);
        assert_eq!(peak_cd.str().unwrap().get(1), Some("1"));
    }

    #[test]
    fn numeric_column_with_stray_text_falls_back_to_string() {
        let body = "\
#\n\
site_no\tvalue\n\
15s\t8n\n\
01594440\t12.5\n\
01594440\t***\n";
        let table = parse_rdb(body).unwrap();
        assert_eq!(table.data.column("value").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn zero_data_rows_is_a_valid_empty_table() {
        let body = "\
# no data today\n\
agency_cd\tsite_no\n\
5s\t15s\n";
        let table = parse_rdb(body).unwrap();
        assert_eq!(table.data.shape(), (0, 2));
    }

    #[test]
    fn missing_header_is_an_error() {
        let err = parse_rdb("# only comments\n# nothing else\n").unwrap_err();
        assert!(matches!(err, RdbError::MissingHeader));
    }

    #[test]
    fn data_where_type_row_should_be_is_an_error() {
        let body = "\
agency_cd\tsite_no\n\
USGS\t01594440\n";
        let err = parse_rdb(body).unwrap_err();
        assert!(matches!(err, RdbError::MissingTypeRow));
    }

    #[test]
    fn overlong_row_is_an_error() {
        let body = "\
agency_cd\tsite_no\n\
5s\t15s\n\
USGS\t01594440\textra\n";
        let err = parse_rdb(body).unwrap_err();
        assert!(matches!(
            err,
            RdbError::ColumnCountMismatch {
                line: 3,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn rating_tokens_extracted_from_comment() {
        let comment = "# some text\n# //RATING  EXSA  CORR\n# more";
        assert_eq!(rating_tokens(comment), ["EXSA", "CORR"]);
    }

    #[test]
    fn missing_rating_marker_yields_empty_tokens() {
        assert!(rating_tokens("# nothing here\n# at all").is_empty());
    }
}
