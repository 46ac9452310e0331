//! Awaitable actions against the app under test
//!
//! Every action opens its own channel, sends one message, and treats the next
//! inbound message as its outcome. There are no correlation ids, so a channel
//! must never carry more than one pending action.

use std::time::Duration;

use crate::common::{Error, Result, ENV_BRIDGE_ADDR};

use super::channel::{ChannelFactory, MessageChannel, WebSocketFactory};
use super::types::{Action, ActionOutcome, ScrollPosition};

/// Bridge address used when `OWL_BRIDGE_ADDR` is not set
pub const DEFAULT_BRIDGE_ADDR: &str = "127.0.0.1:8123";

/// Client used by test code to drive the app
pub struct ActionClient<F: ChannelFactory> {
    factory: F,
    /// Deadline for the outcome; `None` waits forever
    timeout: Option<Duration>,
}

impl ActionClient<WebSocketFactory> {
    /// Client for the bridge announced by the runner's environment
    pub fn from_env() -> Self {
        let addr =
            std::env::var(ENV_BRIDGE_ADDR).unwrap_or_else(|_| DEFAULT_BRIDGE_ADDR.to_string());
        Self::new(WebSocketFactory::new(addr))
    }
}

impl<F: ChannelFactory> ActionClient<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            timeout: None,
        }
    }

    /// Fail actions whose outcome takes longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn press(&self, test_id: &str) -> Result<()> {
        self.perform_action(Action::press(test_id)).await
    }

    pub async fn long_press(&self, test_id: &str) -> Result<()> {
        self.perform_action(Action::long_press(test_id)).await
    }

    pub async fn enter_text(&self, test_id: &str, text: &str) -> Result<()> {
        self.perform_action(Action::enter_text(test_id, text)).await
    }

    pub async fn call(&self, test_id: &str, callback_key: &str) -> Result<()> {
        self.perform_action(Action::call(test_id, callback_key)).await
    }

    pub async fn scroll_to(&self, test_id: &str, position: ScrollPosition) -> Result<()> {
        self.perform_action(Action::scroll_to(test_id, position)).await
    }

    pub async fn scroll_to_end(&self, test_id: &str) -> Result<()> {
        self.perform_action(Action::scroll_to_end(test_id)).await
    }

    /// Send `action` on a fresh channel and wait for its outcome
    ///
    /// The channel is closed exactly once whatever the exchange returns. A
    /// failure to close is logged and never replaces the outcome.
    pub async fn perform_action(&self, action: Action) -> Result<()> {
        let mut channel = self.factory.open().await?;

        let result = self.exchange(&mut channel, &action).await;

        if let Err(e) = channel.close().await {
            tracing::warn!(test_id = action.test_id(), "Failed to close channel: {}", e);
        }

        result
    }

    async fn exchange(&self, channel: &mut F::Channel, action: &Action) -> Result<()> {
        let message = action.to_message().to_json()?;
        tracing::debug!(kind = ?action.kind(), test_id = action.test_id(), "Sending action");
        channel.send(message).await?;

        let reply = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, channel.next_message())
                .await
                .map_err(|_| Error::ActionTimeout {
                    test_id: action.test_id().to_string(),
                    millis: limit.as_millis(),
                })??,
            None => channel.next_message().await?,
        };

        ActionOutcome::parse(&reply)?.into_result(action.test_id())
    }
}
