//! The structured key behind the wide-table column naming convention.
//!
//! NWIS responses carry one value series per (parameter, statistic)
//! combination. The observation table names each series pair with an encoded
//! string (`X_<description>_<parameter code>_<statistic code>` plus a `_cd`
//! qualifier column). The key is kept structured internally; the encoded
//! names are generated only when the DataFrame columns are created, so
//! nothing downstream ever has to parse the convention back apart.

/// Identifies one (parameter, statistic) value series in a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    /// Short human-readable parameter description (e.g. "Streamflow").
    pub description: String,
    /// NWIS parameter code (e.g. "00060" for discharge).
    pub parameter_cd: String,
    /// NWIS statistic code (e.g. "00003" for mean). Empty when the series
    /// carries no statistic, as for instantaneous readings of some services.
    pub stat_cd: String,
}

impl ColumnKey {
    pub fn new(
        description: impl Into<String>,
        parameter_cd: impl Into<String>,
        stat_cd: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            parameter_cd: parameter_cd.into(),
            stat_cd: stat_cd.into(),
        }
    }

    /// Name of the value column, e.g. `X_Streamflow_00060_00003`.
    ///
    /// Empty parts are skipped, so a key without a statistic code encodes as
    /// `X_Streamflow_00060`.
    pub fn value_name(&self) -> String {
        let mut name = String::from("X");
        for part in [
            sanitize(&self.description),
            self.parameter_cd.clone(),
            self.stat_cd.clone(),
        ] {
            if !part.is_empty() {
                name.push('_');
                name.push_str(&part);
            }
        }
        name
    }

    /// Name of the qualifying-code column paired with [`value_name`](Self::value_name).
    pub fn qualifier_name(&self) -> String {
        format!("{}_cd", self.value_name())
    }
}

/// Reduces a free-text description to an identifier-safe token.
fn sanitize(description: &str) -> String {
    let mut out = String::with_capacity(description.len());
    let mut last_was_sep = true;
    for c in description.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
