use anyhow::Result;
use clap::Parser;
use docker_volume_exporter::config::{
    parse_nonzero_or, parse_port, socket_from_docker_host, Config,
    DEFAULT_VOLUME_COMPUTATION_LIMIT_MS, DEFAULT_VOLUME_CONCURRENCY,
};
use docker_volume_exporter::server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Prefix prepended to volume mount points (host root filesystem)
    #[arg(long, env = "ROOTFS_DIRECTORY")]
    rootfs_directory: Option<String>,

    /// Maximum number of concurrent size probes
    #[arg(long, env = "VOLUME_CONCURRENCY")]
    volume_concurrency: Option<String>,

    /// Collection cost budget per window, in milliseconds
    #[arg(long, env = "VOLUME_COMPUTATION_LIMIT")]
    volume_computation_limit: Option<String>,

    /// Docker daemon socket (unix:// only)
    #[arg(long, env = "DOCKER_HOST")]
    docker_host: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "PORT")]
    port: Option<String>,

    /// Address to bind to
    #[arg(short, long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Docker volume exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments / environment if provided
    if let Some(rootfs) = args.rootfs_directory {
        config.collection.rootfs_directory = rootfs;
    }
    if let Some(raw) = args.volume_concurrency {
        config.collection.volume_concurrency =
            parse_nonzero_or("VOLUME_CONCURRENCY", &raw, DEFAULT_VOLUME_CONCURRENCY);
    }
    if let Some(raw) = args.volume_computation_limit {
        config.collection.volume_computation_limit_ms = parse_nonzero_or(
            "VOLUME_COMPUTATION_LIMIT",
            &raw,
            DEFAULT_VOLUME_COMPUTATION_LIMIT_MS,
        );
    }
    if let Some(host) = args.docker_host.filter(|host| !host.trim().is_empty()) {
        config.docker.socket_path = socket_from_docker_host(&host)?;
    }
    if let Some(raw) = args.port {
        match parse_port(&raw) {
            Ok(Some(port)) => config.server.port = port,
            Ok(None) => {}
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    config.collection.normalize();

    info!("Configuration loaded successfully");
    info!("Root filesystem: {}", config.collection.rootfs_directory);
    info!("Docker socket: {}", config.docker.socket_path);
    info!(
        "Volume concurrency: {}, computation limit: {} ms per {} s",
        config.collection.volume_concurrency,
        config.collection.volume_computation_limit_ms,
        config.collection.window_seconds
    );

    // Start the metrics server
    if let Err(e) = server::start(config).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
