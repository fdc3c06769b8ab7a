//! Livelab - test results query client
//!
//! Queries bandwidth, jitter, latency and ping runs collected from the field
//! devices, filtered by device, upload time and metric value.

mod analysis;
mod config;
mod fetch;
mod output;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use config::OutputFormat;
use fetch::HttpFetcher;
use protocol::{PingResult, TestType, ValidationError};
use session::QueryRunner;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "livelab")]
#[command(version)]
#[command(about = "Query network performance test results from field devices", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "client.conf")]
    config: PathBuf,

    /// Test type: bandwidth, jitter, latency or ping
    #[arg(short = 't', long = "type", default_value = "bandwidth")]
    test_type: TestType,

    /// API username (overrides the config file)
    #[arg(short, long)]
    username: Option<String>,

    /// API password (overrides the config file)
    #[arg(short, long)]
    password: Option<String>,

    /// Filter as KEY=VALUE, e.g. device_id=np-7, month_gt=3, bandwidth_lt=50
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Ping result: any, up or down
    #[arg(long)]
    ping_result: Option<PingResult>,

    /// Output format (overrides the config file)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Export results as CSV, optionally to the given file
    #[arg(long, num_args = 0..=1)]
    export: Option<Option<PathBuf>>,

    /// Show per-device statistics instead of individual records
    #[arg(long)]
    summary: bool,

    /// List the filters available for the test type and exit
    #[arg(long)]
    list_fields: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = config::Config::load_or_default(&args.config)?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Livelab v{} - test results query", env!("CARGO_PKG_VERSION"));
    if !args.config.exists() {
        warn!("Config file {:?} not found, using defaults", args.config);
    }

    let output = output::OutputManager::new(config.output.clone());

    if args.list_fields {
        output.print_fields(args.test_type);
        return Ok(());
    }

    let fetcher = HttpFetcher::new(&config.service)?;
    let mut runner = QueryRunner::new(fetcher);

    // Build the filter while logged out so only the final query is fetched
    runner.select_test_type(args.test_type);
    for filter in &args.filters {
        let (key, value) = filter
            .split_once('=')
            .ok_or_else(|| ValidationError::MalformedFilter(filter.clone()))?;
        let (field, operator) = protocol::parse_parameter_key(args.test_type, key)
            .with_context(|| format!("Invalid filter {:?}", filter))?;
        runner.set_constraint(field, operator, value)?;
    }
    if let Some(result) = args.ping_result {
        runner.set_ping_result(result)?;
    }

    for conflict in protocol::range_conflicts(runner.session().constraints()) {
        warn!(
            field = %conflict.field,
            greater_than = conflict.greater_than,
            less_than = conflict.less_than,
            "Range can never match"
        );
    }

    let username = args.username.unwrap_or(config.credentials.username);
    let password = args.password.unwrap_or(config.credentials.password);
    if username.is_empty() {
        warn!("No username given, staying logged out; nothing was requested");
        return Ok(());
    }

    info!(
        "Querying {} results with {} filter(s)",
        args.test_type,
        runner.session().query().len()
    );
    runner.set_credentials(username, password);
    runner.settle().await;

    let session = runner.session();
    let format = args.format.unwrap_or(config.output.format);
    if args.summary {
        output.render_summary(session, format)?;
    } else {
        output.render(session, format)?;
    }

    if let Some(err) = session.last_error() {
        anyhow::bail!("Query failed: {}", err);
    }

    if let Some(path) = args.export {
        let path = path.unwrap_or_else(|| output.export_path(args.test_type));
        output::export_csv(session.results(), &path)?;
        info!("Exported {} record(s) to {:?}", session.results().len(), path);
    }

    Ok(())
}
