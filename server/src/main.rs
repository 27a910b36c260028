use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use filmsearch_core::persist::IndexPaths;
use filmsearch_core::{IndexStore, RawRecord, SearchConfig};
use server::build_app;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory holding the index snapshot; in-memory only when omitted
    #[arg(long)]
    index: Option<String>,
    /// JSON array of records to index at startup
    #[arg(long)]
    seed: Option<String>,
    /// JSON file with search settings
    #[arg(long)]
    config: Option<String>,
    /// Override the result window
    #[arg(long)]
    result_window: Option<usize>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn load_config(args: &Args) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            SearchConfig::from_json(&json)?
        }
        None => SearchConfig::default(),
    };
    if let Some(window) = args.result_window {
        config.result_window = window;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = load_config(&args)?;

    let store = match &args.index {
        Some(dir) => IndexStore::open(config, IndexPaths::new(dir))?,
        None => IndexStore::new(config),
    };
    if let Some(seed) = &args.seed {
        let file = std::fs::File::open(seed).with_context(|| format!("opening {seed}"))?;
        let records: Vec<RawRecord> = serde_json::from_reader(std::io::BufReader::new(file))?;
        let gen = store.rebuild_raw(records)?;
        tracing::info!(seed, num_docs = gen.num_docs(), "seeded index");
    }

    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app: Router = build_app(Arc::new(store), admin_token);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
