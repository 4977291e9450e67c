use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use lshfind_api::RestApi;
use lshfind_core::{IndexParams, IndexRegistry};
use lshfind_corpus::{default_methods, Catalog, CatalogConfig, NormalizeConfig};

/// Similar product lookup over MinHash LSH indexes
#[derive(Parser, Debug)]
#[command(name = "lshfind")]
#[command(about = "Find similar products with MinHash LSH", long_about = None)]
struct Args {
    /// Product catalog, JSON Lines or a JSON array
    #[arg(short, long, default_value = "../data/meta_Appliances.json")]
    data_file: PathBuf,

    /// Address to bind the HTTP API to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP API port
    #[arg(long, default_value_t = 5000)]
    http_port: u16,

    /// MinHash functions per signature
    #[arg(long, default_value_t = 30)]
    num_hashes: usize,

    /// LSH bands; must divide num_hashes
    #[arg(long, default_value_t = 15)]
    bands: usize,

    /// Shingle length in characters
    #[arg(long, default_value_t = 3)]
    k_shingle: usize,

    /// Seed for the hash family
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Title repetitions in the hybrid field
    #[arg(long, default_value_t = 5)]
    title_weight: usize,

    /// Strip HTML tags before normalizing text
    #[arg(long)]
    strip_tags: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting lshfind v{}", env!("CARGO_PKG_VERSION"));
    info!("Catalog: {:?}", args.data_file);

    let params = IndexParams {
        num_hashes: args.num_hashes,
        bands: args.bands,
        k_shingle: args.k_shingle,
        seed: args.seed,
    };
    params.validate()?;

    let catalog_config = CatalogConfig {
        title_weight: args.title_weight,
        normalize: NormalizeConfig {
            strip_tags: args.strip_tags,
        },
        ..CatalogConfig::default()
    };
    let catalog = Arc::new(Catalog::load(&args.data_file, &catalog_config)?);

    let start = Instant::now();
    let registry = Arc::new(IndexRegistry::build_all(
        catalog.documents(),
        &default_methods(),
        &params,
    )?);
    info!(
        "Built {} indexes over {} products in {:.2}s",
        registry.len(),
        catalog.len(),
        start.elapsed().as_secs_f64()
    );

    let http_port = args.http_port;
    let host = args.host.clone();
    let registry_http = registry.clone();
    let catalog_http = catalog.clone();
    let http_handle = std::thread::spawn(move || {
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(registry_http, catalog_http, host, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("lshfind started successfully");
    info!("HTTP API: http://{}:{}/", args.host, args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
