//! Hiroba chat relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server -- --port 8080
//! ```

use clap::Parser;
use hiroba_server::ServerArgs;
use hiroba_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();

    // Initialize tracing
    let level = if args.dev { "debug" } else { "info" };
    setup_logger(env!("CARGO_BIN_NAME"), level);

    // Run the server
    if let Err(e) = hiroba_server::run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
