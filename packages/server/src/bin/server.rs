//! Code duel room server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin codeduel-server
//! cargo run --bin codeduel-server -- --host 0.0.0.0 --port 3000 --credentials tokens.json
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use codeduel_server::{
    config::ServerConfig,
    domain::CredentialVerifier,
    infrastructure::{auth::StaticCredentialVerifier, problem::BuiltinProblemCatalog},
    ui::Server,
};
use codeduel_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "codeduel-server")]
#[command(about = "Real-time coding duel room server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Length of one game minute, in seconds
    #[arg(long, default_value = "60")]
    game_tick_secs: u64,

    /// Interval between orphaned room sweeps, in seconds
    #[arg(long, default_value = "3600")]
    cleanup_interval_secs: u64,

    /// JSON file mapping credential tokens to identities
    #[arg(long)]
    credentials: Option<PathBuf>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            game_tick: Duration::from_secs(args.game_tick_secs.max(1)),
            cleanup_interval: Duration::from_secs(args.cleanup_interval_secs.max(1)),
            credentials: args.credentials,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::from(Args::parse());

    // 1. Credential verifier
    let verifier = match &config.credentials {
        Some(path) => match StaticCredentialVerifier::from_json_file(path) {
            Ok(verifier) => {
                tracing::info!("Loaded {} credentials from {}", verifier.len(), path.display());
                verifier
            }
            Err(e) => {
                tracing::error!("Failed to load credentials: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("No credentials file given, every authorization will be rejected");
            StaticCredentialVerifier::default()
        }
    };
    let verifier: Arc<dyn CredentialVerifier> = Arc::new(verifier);

    // 2. Problem catalog
    let catalog = Arc::new(BuiltinProblemCatalog::new());

    // 3. Create and run the server
    let server = Server::new(&config, verifier, catalog);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
