use anyhow::{Context, Result};
use clap::Parser;
use proxy_sweep::{config, CheckerConfig, Config, CrawlerConfig, ExportFormat, Exporter, Harvester};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Harvest, check and deduplicate public proxy lists
#[derive(Parser)]
#[command(name = "proxy-sweep")]
#[command(about = "Harvest, check and deduplicate public proxy lists")]
struct Cli {
    /// JSON array of sources: [{"method":"LIST","category":"HTTP","url":"...","is_checked":true}]
    #[arg(long, env = "PROXY_RESOURCES", hide_env_values = true)]
    sources: Option<String>,

    /// File holding the same JSON array, used when --sources is absent
    #[arg(long, env = "PROXY_RESOURCES_FILE")]
    sources_file: Option<PathBuf>,

    /// Directory the proxy lists are written to
    #[arg(short, long, env = "PROXY_OUTPUT_DIR", default_value = "storage")]
    output_dir: PathBuf,

    /// Export formats besides plain text (json, csv, xml, yaml)
    #[arg(short, long = "format", value_delimiter = ',', default_values_t = ExportFormat::ALL)]
    formats: Vec<ExportFormat>,

    /// Probe timeout in seconds
    #[arg(long, env = "PROXY_CHECK_TIMEOUT", default_value = "60")]
    timeout: u64,

    /// Maximum number of probes in flight
    #[arg(short = 'n', long, env = "PROXY_CHECK_CONCURRENCY", default_value = "500")]
    concurrency: usize,

    /// Timeout in seconds for fetching a source
    #[arg(long, default_value = "30")]
    fetch_timeout: u64,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn raw_sources(&self) -> Result<Option<String>> {
        if self.sources.is_some() {
            return Ok(self.sources.clone());
        }
        match &self.sources_file {
            Some(path) => std::fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("reading sources from {:?}", path)),
            None => Ok(None),
        }
    }

    fn config(&self) -> Config {
        Config {
            output_dir: self.output_dir.clone(),
            formats: self.formats.clone(),
            checker: CheckerConfig::new()
                .with_timeout(Duration::from_secs(self.timeout))
                .with_concurrency(self.concurrency),
            crawler: CrawlerConfig::new().with_timeout(Duration::from_secs(self.fetch_timeout)),
        }
    }
}

/// Load `KEY=value` pairs into the environment without overriding what is
/// already set. A missing file is not an error.
fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).with_context(|| format!("loading {:?}", path)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file(Path::new(".env"))?;
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let raw = cli.raw_sources()?;
    let sources = config::load_sources(raw.as_deref())?;
    info!(sources = sources.len(), "loaded sources");

    let config = cli.config();
    let harvester = Harvester::with_config(&config)?;
    let summary = harvester.run(&sources).await;

    let exporter = Exporter::new(&config.output_dir, config.formats.clone());
    exporter.export(harvester.store())?;

    info!("Number of proxies     : {}", summary.aggregates);
    info!("Time-consuming process: {:?}", summary.elapsed);

    Ok(())
}
