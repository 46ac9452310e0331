//! Action protocol between test code and the app under test
//!
//! Actions are JSON messages sent through the bridge process. Each one is
//! answered by exactly one outcome message on the same channel.

pub mod channel;
pub mod client;
pub mod types;

pub use channel::{ChannelFactory, MessageChannel, WebSocketChannel, WebSocketFactory};
pub use client::ActionClient;
pub use types::{Action, ActionKind, ActionOutcome, ActionValue, ScrollPosition};
