use anyhow::{Context, Result, anyhow};
use chrono::TimeDelta;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

// Configuration structure for column name mapping
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    /// Time index column; the first column when unset.
    pub index: Option<String>,
    /// Flow columns to route; every non-index column when empty.
    #[serde(default)]
    pub flows: Vec<String>,
}

impl ColumnConfig {
    pub fn new() -> Self {
        ColumnConfig::default()
    }

    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: ColumnConfig) -> Self {
        ColumnConfig {
            index: self.index.or(fallback.index),
            flows: if self.flows.is_empty() {
                fallback.flows
            } else {
                self.flows
            },
        }
    }
}

// Output format configuration
#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Csv(PathBuf),
    Stdout,
}

impl OutputFormat {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) if path.as_os_str() != "-" => OutputFormat::Csv(path),
            _ => OutputFormat::Stdout,
        }
    }
}

// Reach settings as read from a config file or the command line; any may be unset
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReachConfig {
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub k: Option<TimeDelta>,
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub time_step: Option<TimeDelta>,
    pub sub_reaches: Option<usize>,
    pub initial_outflow: Option<f64>,
}

impl ReachConfig {
    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: ReachConfig) -> Self {
        ReachConfig {
            k: self.k.or(fallback.k),
            x: self.x.or(fallback.x),
            time_step: self.time_step.or(fallback.time_step),
            sub_reaches: self.sub_reaches.or(fallback.sub_reaches),
            initial_outflow: self.initial_outflow.or(fallback.initial_outflow),
        }
    }
}

// TOML run configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub reach: ReachConfig,
    #[serde(default)]
    pub columns: ColumnConfig,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML run configuration")
    }

    /// Overlay command-line values on top of this configuration.
    pub fn with_overrides(self, reach: ReachConfig, columns: ColumnConfig) -> Self {
        RunConfig {
            reach: reach.or(self.reach),
            columns: columns.or(self.columns),
        }
    }

    /// Check that the settings the router cannot default are present.
    pub fn resolve(self) -> Result<RunSettings> {
        let k = self
            .reach
            .k
            .ok_or_else(|| anyhow!("Storage constant `k` is required (use --k or [reach] k)"))?;
        let x = self
            .reach
            .x
            .ok_or_else(|| anyhow!("Weighting factor `x` is required (use --x or [reach] x)"))?;

        Ok(RunSettings {
            k,
            x,
            time_step: self.reach.time_step,
            sub_reaches: self.reach.sub_reaches.unwrap_or(1),
            initial_outflow: self.reach.initial_outflow,
            columns: self.columns,
        })
    }
}

// Fully resolved settings for one run; a missing time step is inferred from the data
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub k: TimeDelta,
    pub x: f64,
    pub time_step: Option<TimeDelta>,
    pub sub_reaches: usize,
    pub initial_outflow: Option<f64>,
    pub columns: ColumnConfig,
}

/// Parse a duration such as `1h`, `15min`, `900s`, `250ms`, `2d` or bare
/// seconds (`900`, `1.5`).
pub fn parse_duration(text: &str) -> Result<TimeDelta, String> {
    let text = text.trim();
    // Unit is the trailing alphabetic suffix, so `1e3` stays a number
    let split = text
        .rfind(|c: char| !c.is_ascii_alphabetic())
        .map_or(0, |pos| pos + 1);
    let (number, unit) = text.split_at(split);

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration `{text}`: expected <number><unit>"))?;
    if !value.is_finite() {
        return Err(format!("invalid duration `{text}`: not a finite number"));
    }

    let millis_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" => 1.0,
        "" | "s" | "sec" | "secs" => 1_000.0,
        "m" | "min" | "mins" => 60_000.0,
        "h" | "hr" | "hrs" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        other => return Err(format!("invalid duration `{text}`: unknown unit `{other}`")),
    };

    millis_to_duration(value * millis_per_unit)
        .ok_or_else(|| format!("invalid duration `{text}`: out of range"))
}

fn millis_to_duration(millis: f64) -> Option<TimeDelta> {
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis.round() as i64)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(f64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<TimeDelta>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDuration>::deserialize(deserializer)?;
    raw.map(|raw| match raw {
        RawDuration::Seconds(seconds) => millis_to_duration(seconds * 1_000.0)
            .ok_or_else(|| format!("duration of {seconds}s is out of range")),
        RawDuration::Text(text) => parse_duration(&text),
    })
    .transpose()
    .map_err(serde::de::Error::custom)
}
