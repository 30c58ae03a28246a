//! Binary entrypoint for the Pivtree API server.
use pivtree_api::run;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Default listen address can be overridden with PIVTREE_ADDR
    let addr = std::env::var("PIVTREE_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());
    run(&addr).await
}
