//! Duplex message channel between test code and the app under test
//!
//! The protocol only needs to send a text message, wait for the next inbound
//! one, and close. [`WebSocketChannel`] provides that over the bridge.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::common::{Error, Result};

/// A bidirectional text-message connection
#[async_trait]
pub trait MessageChannel: Send {
    /// Send one text message
    async fn send(&mut self, text: String) -> Result<()>;

    /// Wait for the next inbound text message
    async fn next_message(&mut self) -> Result<String>;

    /// Close the connection
    async fn close(&mut self) -> Result<()>;
}

/// Opens a fresh [`MessageChannel`] for every action
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    type Channel: MessageChannel;

    async fn open(&self) -> Result<Self::Channel>;
}

/// Channel to the bridge process over a WebSocket
pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketChannel {
    /// Connect to a bridge listening at `addr` (`host:port`)
    pub async fn connect(addr: &str) -> Result<Self> {
        let url = format!("ws://{}", addr);
        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::Channel(format!("Failed to connect to {}: {}", url, e)))?;

        tracing::debug!("Connected to bridge at {}", url);
        Ok(Self { stream })
    }
}

#[async_trait]
impl MessageChannel for WebSocketChannel {
    async fn send(&mut self, text: String) -> Result<()> {
        tracing::debug!("Bridge >>> {}", text);
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| Error::Channel(e.to_string()))
    }

    async fn next_message(&mut self) -> Result<String> {
        while let Some(message) = self.stream.next().await {
            match message.map_err(|e| Error::Channel(e.to_string()))? {
                Message::Text(text) => {
                    tracing::debug!("Bridge <<< {}", text);
                    return Ok(text);
                }
                Message::Binary(data) => {
                    return String::from_utf8(data)
                        .map_err(|e| Error::MalformedOutcome(e.to_string()));
                }
                Message::Close(_) => return Err(Error::ChannelClosed),
                // Ping/pong are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
        Err(Error::ChannelClosed)
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(Error::Channel(e.to_string())),
        }
    }
}

/// Connects a new [`WebSocketChannel`] to a fixed bridge address
#[derive(Debug, Clone)]
pub struct WebSocketFactory {
    addr: String,
}

impl WebSocketFactory {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl ChannelFactory for WebSocketFactory {
    type Channel = WebSocketChannel;

    async fn open(&self) -> Result<WebSocketChannel> {
        WebSocketChannel::connect(&self.addr).await
    }
}
