//! Bridge mode - background process relaying action messages
//!
//! The runner spawns the same binary with the hidden `bridge` subcommand.
//! Test code and the app under test both connect to it; whatever one side
//! sends, the other receives.

mod server;

pub use server::BridgeServer;

use crate::common::signal::shutdown_signal;
use crate::common::Result;

/// Run in bridge mode until SIGINT/SIGTERM
pub async fn run(port: u16) -> Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "Starting bridge"
    );

    let server = BridgeServer::bind(&format!("127.0.0.1:{}", port)).await?;

    tokio::select! {
        result = server.serve() => result,
        signal = shutdown_signal() => {
            tracing::info!("Bridge shutting down on {}", signal);
            Ok(())
        }
    }
}
