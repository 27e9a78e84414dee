use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livecheck::config::Config;
use livecheck::input::read_endpoints;
use livecheck::report::ReportWriter;
use livecheck::runner::shutdown::ShutdownSignal;
use livecheck::runner::ProbeRunner;

#[derive(Parser)]
#[command(
    name = "livecheck",
    version,
    about = "Probe endpoints for liveness and classify them by HTTP status",
    long_about = None
)]
struct Cli {
    /// File containing the endpoint list (stdin when omitted)
    #[arg(short = 'l', long = "list")]
    list: Option<PathBuf>,

    /// Base name for output files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Probe admissions per second
    #[arg(short = 'd', long)]
    rate: Option<u32>,

    /// Maximum concurrent in-flight probes
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Comma-separated status class selectors (e.g. 2xx,3xx)
    #[arg(long)]
    only: Option<String>,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose per-probe logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<String>,
}

impl Cli {
    /// Build the run configuration: file/env defaults, CLI flags on top
    fn into_config(self) -> Result<(Config, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env()?,
        };

        if let Some(rate) = self.rate {
            config.probe.rate_limit = rate;
        }
        if let Some(concurrency) = self.concurrency {
            config.probe.max_concurrent = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.probe.request_timeout_secs = timeout;
        }
        if let Some(only) = self.only {
            config.probe.only = Some(only);
        }
        if let Some(output) = self.output {
            config.output.base = output;
        }
        if self.verbose {
            config.logging.level = String::from("debug");
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }

        Ok((config, self.list))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, list) = cli.into_config()?;

    setup_tracing(&config.logging.format, &config.logging.level)?;

    config.validate().context("Invalid configuration")?;
    let filter = config.status_filter()?;

    let endpoints = read_endpoints(list.as_deref()).await?;
    if endpoints.is_empty() {
        anyhow::bail!(
            "No endpoints provided. Usage: livecheck [-l <file>] [-o <output>] [-d <rate>] [-v] [--only <classes>]"
        );
    }

    tracing::info!(
        total = endpoints.len(),
        rate = config.probe.rate_limit,
        max_concurrent = config.probe.max_concurrent,
        "livecheck starting"
    );

    let runner = ProbeRunner::new(&config)?;

    // First Ctrl+C stops admissions; in-flight probes drain into the report.
    let shutdown = ShutdownSignal::new();
    shutdown.trigger_on_ctrl_c();

    let buckets = runner.run(endpoints, &shutdown).await?;

    if shutdown.is_triggered() {
        println!("\nReceived interrupt, saving current progress...");
    }

    let writer = ReportWriter::new(&config.output.base);
    let artifacts = writer
        .write(&buckets, filter.as_ref())
        .await
        .context("Failed to write report")?;

    for artifact in &artifacts {
        match (&artifact.class, &config.probe.only) {
            (Some(class), _) => println!(
                "Found {} endpoints with {} status. Saved to {} (rate: {} req/s)",
                artifact.count,
                class,
                artifact.path.display(),
                config.probe.rate_limit
            ),
            (None, Some(only)) => println!(
                "Found {} endpoints matching {}. Results saved to {} (rate: {} req/s)",
                artifact.count,
                only,
                artifact.path.display(),
                config.probe.rate_limit
            ),
            (None, None) => {}
        }
    }

    let stats = runner.stats();
    if stats.responded == 0 {
        println!(
            "No endpoints responded ({} probed, rate: {} req/s)",
            stats.completed, config.probe.rate_limit
        );
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("livecheck={level},warn")));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
