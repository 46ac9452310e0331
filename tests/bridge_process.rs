//! Tests for the bridge as a real child process
//!
//! These spawn the compiled `owl` binary through `ProcessBridgeLauncher`,
//! the same way `owl run` does, and check that terminating it frees the port.

use std::path::PathBuf;

use owl::protocol::{MessageChannel, WebSocketChannel};
use owl::run::collaborators::{BridgeHandle, BridgeLauncher, ProcessBridgeLauncher};
use owl::Error;

/// Find a port nothing is listening on
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("No local address").port()
}

#[tokio::test]
async fn test_bridge_process_starts_and_stops() {
    let port = free_port();
    let addr = format!("127.0.0.1:{}", port);
    let launcher = ProcessBridgeLauncher::new(PathBuf::from(env!("CARGO_BIN_EXE_owl")), port);

    let mut bridge = launcher.start(false).await.expect("Bridge failed to start");

    let mut channel = WebSocketChannel::connect(&addr)
        .await
        .expect("Client could not connect to the bridge");
    channel.close().await.expect("Failed to close channel");

    bridge.kill().await.expect("Failed to stop bridge");

    match WebSocketChannel::connect(&addr).await {
        Err(Error::Channel(_)) => {}
        Err(other) => panic!("Expected Channel error, got {:?}", other),
        Ok(_) => panic!("Bridge still accepting connections after kill"),
    }
}

#[tokio::test]
async fn test_kill_twice_is_harmless() {
    let port = free_port();
    let launcher = ProcessBridgeLauncher::new(PathBuf::from(env!("CARGO_BIN_EXE_owl")), port);

    let mut bridge = launcher.start(true).await.expect("Bridge failed to start");

    bridge.kill().await.expect("Failed to stop bridge");
    bridge.kill().await.expect("Second kill should see the exited child");
}

#[cfg(unix)]
#[tokio::test]
async fn test_child_exiting_during_startup_is_bridge_start_error() {
    // `false` ignores the bridge arguments and exits with status 1
    let launcher = ProcessBridgeLauncher::new(PathBuf::from("false"), free_port());

    match launcher.start(false).await {
        Err(Error::BridgeStart(message)) => {
            assert!(message.contains("exited during startup"), "{}", message)
        }
        Err(other) => panic!("Expected BridgeStart, got {:?}", other),
        Ok(_) => panic!("Expected startup to fail"),
    }
}
