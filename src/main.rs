use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use muskingum_rs::ReachParams;
use muskingum_rs::config::RunConfig;
use muskingum_rs::io::csv::{load_flow_table, save_flow_table};
use muskingum_rs::params::seconds;
use muskingum_rs::run::route_table;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod cli;

use cli::get_args;

fn main() -> Result<()> {
    let args = get_args();
    init_logging(&args.log_level)?;

    // Configuration: file first, command line on top
    let file_config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let settings = file_config
        .with_overrides(args.reach_config(), args.column_config())
        .resolve()?;

    let table = load_flow_table(&args.input, &settings.columns)?;

    let time_step = match settings.time_step {
        Some(time_step) => time_step,
        None => {
            let inferred = table
                .infer_time_step()
                .context("No time step given and it could not be inferred from the index")?;
            info!("Inferred time step of {}s from the index", seconds(inferred));
            inferred
        }
    };
    let reach = ReachParams::new(settings.k, settings.x, time_step);
    let threads = args.threads();

    info!("Routing configuration:");
    info!("  Rows: {} ({} to {})", table.len(), table.index[0], table.index[table.len() - 1]);
    info!("  K: {}s, X: {}", reach.k_seconds(), reach.x);
    info!("  Time step: {}s", reach.time_step_seconds());
    info!("  Sub-reaches: {}", settings.sub_reaches);
    info!("  Flow columns: {}", table.columns.len());
    info!("  Worker threads: {}", threads);

    let pb = ProgressBar::new(table.columns.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} columns ({eta})")?
            .progress_chars("#>-"),
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to build routing thread pool")?;
    let routed = pool.install(|| {
        route_table(
            &table,
            &reach,
            settings.sub_reaches,
            settings.initial_outflow,
            &pb,
        )
    })?;
    pb.finish_and_clear();

    save_flow_table(&args.output_format(), &routed)?;
    info!("Routing complete");
    Ok(())
}

fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => bail!("Unknown log level `{}`", other),
    };

    // Logs go to stderr so routed CSV on stdout stays clean
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
