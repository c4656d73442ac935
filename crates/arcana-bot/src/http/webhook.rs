//! POST /messages: one chat event in, the bot's replies out.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use log::{error, warn};
use serde::Serialize;

use super::AppState;
use crate::router::RETRY_NOTICE;
use crate::transport::{CollectingTransport, InboundEvent, OutboundMessage};

/// Replies to one event, in send order. Empty when the event was ignored.
#[derive(Debug, Serialize)]
pub(super) struct MessagesResponse {
    replies: Vec<OutboundMessage>,
}

pub(super) async fn handle_message(
    State(state): State<Arc<AppState>>,
    Json(event): Json<InboundEvent>,
) -> Json<MessagesResponse> {
    let transport = Arc::new(CollectingTransport::new());
    let router = Arc::clone(&state.router);
    let sink = Arc::clone(&transport);

    // run on its own task so a panicking handler cannot take the server down
    let outcome = tokio::spawn(async move { router.handle(&event, sink.as_ref()).await }).await;

    let mut replies = transport.take().await;
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("webhook reply not fully delivered: {e}"),
        Err(e) => {
            error!("message handler failed: {e}");
            replies = vec![OutboundMessage {
                text: RETRY_NOTICE.to_string(),
                image_png: None,
            }];
        }
    }
    Json(MessagesResponse { replies })
}

#[cfg(test)]
mod tests {
    use arcana_core::{Card, CardCatalog, SpreadDefinition};

    use super::*;
    use crate::http::tests::state_with;

    fn loaded() -> CardCatalog {
        let cards = (0..10)
            .map(|id| Card {
                id,
                name: format!("Card {id}"),
                kind: "Minor".into(),
                meaning: "Something".into(),
                image_ref: None,
            })
            .collect();
        CardCatalog::with_contents(cards, vec![SpreadDefinition::new("one", ["Answer"])])
    }

    #[tokio::test]
    async fn reading_comes_back_with_image() {
        let state = state_with(loaded(), None);
        let Json(body) = handle_message(
            State(state),
            Json(InboundEvent::from_user("u1", "tarot one Today?")),
        )
        .await;
        assert_eq!(body.replies.len(), 1);
        assert!(body.replies[0].text.contains("One Card Oracle"));
        assert!(body.replies[0].image_png.is_some());
    }

    #[tokio::test]
    async fn ignored_events_return_no_replies() {
        let state = state_with(loaded(), None);
        let Json(body) = handle_message(
            State(state),
            Json(InboundEvent::from_user("u1", "just chatting")),
        )
        .await;
        assert!(body.replies.is_empty());
    }
}
