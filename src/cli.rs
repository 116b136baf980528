use chrono::TimeDelta;
use clap::Parser;
use muskingum_rs::config::{ColumnConfig, OutputFormat, ReachConfig, parse_duration};
use std::path::PathBuf;

/// Route an inflow hydrograph through a river reach with the Muskingum method
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// CSV file with a time index column and one or more flow columns
    pub input: PathBuf,

    /// Output CSV path; `-` or omitted writes to stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML run configuration; command-line values take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Storage time constant K (e.g. `1h`, `90min`, `3600`)
    #[arg(short, long, value_parser = parse_duration)]
    pub k: Option<TimeDelta>,

    /// Weighting factor X in [0, 0.5]
    #[arg(short, long, allow_hyphen_values = true)]
    pub x: Option<f64>,

    /// Time step of the inflow series; inferred from the index when omitted
    #[arg(short, long, value_parser = parse_duration)]
    pub time_step: Option<TimeDelta>,

    /// Number of sub-reaches the reach is split into
    #[arg(short = 'n', long)]
    pub sub_reaches: Option<usize>,

    /// Outflow before the first sample; defaults to the first inflow
    #[arg(long, allow_hyphen_values = true)]
    pub initial_outflow: Option<f64>,

    /// Name of the time index column (default: first column)
    #[arg(long)]
    pub index_column: Option<String>,

    /// Flow column to route; repeat for several (default: all non-index columns)
    #[arg(long = "flow-column")]
    pub flow_columns: Vec<String>,

    /// Worker threads used to route columns in parallel (default: CPU count)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,
}

impl Args {
    pub fn reach_config(&self) -> ReachConfig {
        ReachConfig {
            k: self.k,
            x: self.x,
            time_step: self.time_step,
            sub_reaches: self.sub_reaches,
            initial_outflow: self.initial_outflow,
        }
    }

    pub fn column_config(&self) -> ColumnConfig {
        ColumnConfig {
            index: self.index_column.clone(),
            flows: self.flow_columns.clone(),
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_path(self.output.clone())
    }

    pub fn threads(&self) -> usize {
        self.threads.filter(|&n| n > 0).unwrap_or_else(num_cpus::get)
    }
}

pub fn get_args() -> Args {
    Args::parse()
}
