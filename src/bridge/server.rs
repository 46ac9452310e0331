//! Bridge server - WebSocket relay between test code and the app

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;

use crate::common::Result;

/// Messages a slow peer may fall behind by before it starts losing them
const RELAY_CAPACITY: usize = 256;

/// A text message tagged with the peer it came from
#[derive(Debug, Clone)]
struct Relayed {
    from: u64,
    text: String,
}

/// Relay server forwarding every message to all other connected peers
pub struct BridgeServer {
    listener: TcpListener,
    relay: broadcast::Sender<Relayed>,
    next_peer: u64,
}

impl BridgeServer {
    /// Bind the relay to `addr` (`host:port`, port 0 picks a free one)
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let (relay, _) = broadcast::channel(RELAY_CAPACITY);

        Ok(Self {
            listener,
            relay,
            next_peer: 1,
        })
    }

    /// Address the relay is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept peers until the task is dropped
    pub async fn serve(mut self) -> Result<()> {
        tracing::info!("Bridge listening on {}", self.local_addr()?);

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                    continue;
                }
            };
            let peer = self.next_peer;
            self.next_peer += 1;
            // Subscribe before the handshake completes so a peer never misses
            // a message sent right after it connected.
            let inbox = self.relay.subscribe();
            let relay = self.relay.clone();

            tokio::spawn(handle_peer(stream, addr, peer, relay, inbox));
        }
    }
}

/// Pump messages between one peer and the relay
async fn handle_peer(
    stream: TcpStream,
    addr: SocketAddr,
    peer: u64,
    relay: broadcast::Sender<Relayed>,
    mut inbox: broadcast::Receiver<Relayed>,
) {
    // Readiness probes connect and hang up without a handshake
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            tracing::debug!("Peer {} handshake failed: {}", peer, e);
            return;
        }
    };
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    tracing::debug!("Peer {} connected from {}", peer, addr);

    loop {
        tokio::select! {
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Peer {} >>> {}", peer, text);
                        // No receivers just means nobody else is connected yet
                        let _ = relay.send(Relayed { from: peer, text });
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("Peer {} receive error: {}", peer, e);
                        break;
                    }
                }
            }
            relayed = inbox.recv() => {
                match relayed {
                    Ok(message) if message.from != peer => {
                        if ws_tx.send(Message::Text(message.text)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Peer {} dropped {} relayed messages", peer, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("Peer {} disconnected", peer);
}
