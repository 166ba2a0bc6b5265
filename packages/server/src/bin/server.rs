//! Realtime classroom polling server.
//!
//! One teacher broadcasts timed multiple-choice polls; students vote
//! once each and chat alongside.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin pollroom-server
//! cargo run --bin pollroom-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use pollroom_server::{
    config::{AllowedOrigins, resolve_port},
    infrastructure::WebSocketMessagePusher,
    ui::Server,
    usecase::SessionCoordinator,
};
use pollroom_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "pollroom-server")]
#[command(about = "Realtime classroom polling server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to (falls back to $PORT, then 8080)
    #[arg(short = 'p', long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let port = resolve_port(args.port);
    let allowed_origins = AllowedOrigins::from_env();

    // Initialize dependencies in order:
    // 1. MessagePusher
    // 2. SessionCoordinator
    // 3. Server

    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let coordinator = SessionCoordinator::new(message_pusher, Arc::new(SystemClock));

    let server = Server::new(coordinator, allowed_origins);
    if let Err(e) = server.run(args.host, port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
