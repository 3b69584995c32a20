use anyhow::Result;
use clap::Parser;
use fronius_exporter::{config::Config, server};
use secrecy::SecretString;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Base URL of the Fronius Symo device (overrides config)
    #[arg(short = 'u', long, env = "FRONIUS_SYMO_URL")]
    symo_url: Option<String>,

    /// "key=value" header sent to the device, repeatable (overrides config)
    #[arg(long, env = "FRONIUS_SYMO_HEADER", value_delimiter = ',')]
    symo_header: Vec<String>,

    /// Timeout in seconds per device request; keep it below the scrape interval
    #[arg(long, env = "FRONIUS_SYMO_TIMEOUT")]
    symo_timeout: Option<u64>,

    /// Value of the `site` label, defaults to the host in the device URL
    #[arg(short = 's', long, env = "FRONIUS_SYMO_SITE")]
    symo_site: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,

    /// Log level, ignored when RUST_LOG is set
    #[arg(long, env = "EXPORTER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Shortcut for --log-level=debug
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose {
        "debug".to_string()
    } else {
        args.log_level.clone()
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Fronius Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(url) = args.symo_url {
        config.symo.url = url;
    }
    if !args.symo_header.is_empty() {
        config.symo.headers = args
            .symo_header
            .into_iter()
            .map(|header| header.trim().to_string())
            .filter(|header| !header.is_empty())
            .map(|header| SecretString::new(header.into()))
            .collect();
    }
    if let Some(timeout) = args.symo_timeout {
        config.symo.timeout_seconds = timeout;
    }
    if let Some(site) = args.symo_site {
        config.symo.site = Some(site);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("Configuration loaded successfully");
    info!("Fronius device: {}", config.symo.url);
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    // Start the metrics server
    if let Err(e) = server::start(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
