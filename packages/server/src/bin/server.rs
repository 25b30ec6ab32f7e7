//! Kakurega anonymous chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kakurega-server
//! cargo run --bin kakurega-server -- --host 0.0.0.0 --port 3000 --search-timeout-secs 60
//! ```

use clap::Parser;
use kakurega_server::{
    config::{DEFAULT_PORT, DEFAULT_SESSION_TTL_SECS, DEFAULT_SWEEP_INTERVAL_SECS, ServerConfig},
    ui::Server,
};
use kakurega_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kakurega-server")]
#[command(about = "Anonymous chat server with random matchmaking", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Session lifetime in seconds (0 keeps sessions forever)
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL_SECS)]
    session_ttl_secs: u64,

    /// Random-match search timeout in seconds (0 waits forever)
    #[arg(long, default_value_t = 0)]
    search_timeout_secs: u64,

    /// Interval between expired-session sweeps in seconds
    #[arg(long, default_value_t = DEFAULT_SWEEP_INTERVAL_SECS)]
    sweep_interval_secs: u64,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig::from_secs(
            args.host,
            args.port,
            args.session_ttl_secs,
            args.search_timeout_secs,
            args.sweep_interval_secs,
        )
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = ServerConfig::from(args);
    tracing::debug!("Starting with {:?}", config);

    let server = Server::from_config(&config);
    if let Err(e) = server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
