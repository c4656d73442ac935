//! Transport that collects replies for a webhook response.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tokio::sync::Mutex;

use super::{ChatTransport, MESSAGE_LIMIT};
use crate::error::{TransportError, TransportResult};

/// One reply message as returned to the webhook caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    /// Message text.
    pub text: String,
    /// Attached PNG, base64-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_png: Option<String>,
}

/// Buffers replies in order so they can be returned in one HTTP response.
#[derive(Default)]
pub struct CollectingTransport {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl CollectingTransport {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every message collected so far.
    pub async fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.messages.lock().await)
    }

    async fn push(&self, text: &str, image: Option<&[u8]>) -> TransportResult<()> {
        let chars = text.chars().count();
        if chars > MESSAGE_LIMIT {
            return Err(TransportError::TooLong(chars));
        }
        self.messages.lock().await.push(OutboundMessage {
            text: text.to_string(),
            image_png: image.map(|png| STANDARD.encode(png)),
        });
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for CollectingTransport {
    async fn reply(&self, text: &str, image: Option<&[u8]>) -> TransportResult<()> {
        self.push(text, image).await
    }

    async fn send_followup(&self, text: &str) -> TransportResult<()> {
        self.push(text, None).await
    }
}
