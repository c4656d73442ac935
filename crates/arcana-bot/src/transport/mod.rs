//! Chat transports: where commands come from and where replies go.

pub mod console;
pub mod webhook;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::TransportResult;

pub use self::console::ConsoleTransport;
pub use self::webhook::{CollectingTransport, OutboundMessage};

/// Hard per-message limit of the chat platform, in characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// One inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    /// Message text as typed.
    pub text: String,
    /// Stable identity of the author.
    pub author_id: String,
    /// Whether the author is a bot account.
    #[serde(default)]
    pub is_bot: bool,
}

impl InboundEvent {
    /// A message from a human author.
    pub fn from_user(author_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author_id: author_id.into(),
            is_bot: false,
        }
    }
}

/// Reply channel for a single inbound event.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Answer the event, optionally attaching a PNG image.
    async fn reply(&self, text: &str, image: Option<&[u8]>) -> TransportResult<()>;

    /// Send a further message in the same conversation.
    async fn send_followup(&self, text: &str) -> TransportResult<()>;
}
