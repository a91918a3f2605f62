//! CLI entry point for the importer.

use osm_edit_history::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize tracing with INFO level by default, respecting RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
