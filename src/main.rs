use std::{path::PathBuf, time::Duration};

use aid_points::{convert, Config};
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Converts the aid point spreadsheet into a geolocated JSON catalog.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// CSV export to read
    #[arg(long, default_value = "data1.csv")]
    input: PathBuf,
    /// JSON catalog to write
    #[arg(long, default_value = "data1.json")]
    output: PathBuf,
    /// Country appended to addresses that don't mention it
    #[arg(long, default_value = "Chile")]
    country: String,
    /// Minimum milliseconds between geocoding requests
    #[arg(long, default_value_t = 1100)]
    rate: u64,
    /// Geocoding request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
    /// Rows processed concurrently; requests still go out one at a time
    #[arg(long, default_value_t = 1)]
    workers: usize,
    /// Leave every record without coordinates
    #[arg(long)]
    skip_geocode: bool,
    #[arg(long, default_value = aid_points::nominatim::ENDPOINT)]
    endpoint: String,
    /// Identifies this tool to the geocoding provider
    #[arg(long, default_value = aid_points::nominatim::USER_AGENT)]
    user_agent: String,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let config = Config {
        country: cli.country,
        rate: Duration::from_millis(cli.rate),
        timeout: Duration::from_secs(cli.timeout),
        workers: cli.workers,
        skip_geocoding: cli.skip_geocode,
        endpoint: cli.endpoint,
        user_agent: cli.user_agent,
    };
    info!(?config, "converting {} -> {}", cli.input.display(), cli.output.display());

    let summary = convert::run(&cli.input, &cli.output, &config)?;
    info!(
        not_found = summary.not_found,
        failed = summary.failed,
        skipped = summary.skipped,
        "coordinates obtained: {summary} ({:.1}%)",
        summary.success_rate()
    );

    Ok(())
}
