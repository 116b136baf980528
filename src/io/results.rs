use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// A named flow series, one value per index row
#[derive(Debug, Clone, PartialEq)]
pub struct FlowColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl FlowColumn {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        FlowColumn {
            name: name.into(),
            values,
        }
    }
}

impl AsRef<[f64]> for FlowColumn {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

// Time-indexed flow table; the index is kept verbatim so output preserves its formatting
#[derive(Debug, Clone, PartialEq)]
pub struct FlowTable {
    pub index_name: String,
    pub index: Vec<String>,
    pub columns: Vec<FlowColumn>,
}

impl FlowTable {
    pub fn new(index_name: impl Into<String>, index: Vec<String>) -> Self {
        FlowTable {
            index_name: index_name.into(),
            index,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn push_column(&mut self, column: FlowColumn) -> Result<()> {
        if column.values.len() != self.len() {
            bail!(
                "Column `{}` has {} values but the index has {} rows",
                column.name,
                column.values.len(),
                self.len()
            );
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&FlowColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Infer the routing time step from the spacing of the index.
    ///
    /// Fails when the index has fewer than two rows, a timestamp cannot be
    /// parsed, or the spacing is not uniform and increasing.
    pub fn infer_time_step(&self) -> Result<TimeDelta> {
        if self.len() < 2 {
            bail!("At least two index rows are needed to infer the time step");
        }

        let mut previous = parse_timestamp(&self.index[0])?;
        let mut step: Option<TimeDelta> = None;
        for (row, raw) in self.index.iter().enumerate().skip(1) {
            let current = parse_timestamp(raw)?;
            let delta = current - previous;
            match step {
                None if delta <= TimeDelta::zero() => {
                    bail!("Index is not increasing at row {}: {} -> {}", row, previous, current)
                }
                None => step = Some(delta),
                Some(expected) if delta != expected => bail!(
                    "Index spacing is not uniform at row {}: expected {}s, got {}s",
                    row,
                    expected.num_seconds(),
                    delta.num_seconds()
                ),
                Some(_) => {}
            }
            previous = current;
        }

        // `len() >= 2` guarantees at least one delta was seen
        step.ok_or_else(|| anyhow::anyhow!("Index has no spacing"))
    }
}

/// Parse an index timestamp in one of the common ISO-like layouts.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.naive_utc());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight);
    }
    bail!("Unrecognised timestamp `{}`", raw)
}
