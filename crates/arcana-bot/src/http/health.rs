//! Liveness and readiness.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct HealthBody {
    running: bool,
    uptime_seconds: u64,
    timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ReadyBody {
    ready: bool,
    cards_loaded: usize,
    spreads_loaded: usize,
}

/// GET /health
pub(super) async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthBody> {
    Json(HealthBody {
        running: true,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// GET /ready
pub(super) async fn handle_ready(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadyBody>) {
    let cards_loaded = state.catalog.card_count();
    let spreads_loaded = state.catalog.spread_count();
    let ready = cards_loaded > 0 && spreads_loaded > 0;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadyBody {
            ready,
            cards_loaded,
            spreads_loaded,
        }),
    )
}

#[cfg(test)]
mod tests {
    use arcana_core::{Card, CardCatalog, SpreadDefinition};

    use super::*;
    use crate::http::tests::state_with;

    #[tokio::test]
    async fn health_reports_running() {
        let Json(body) = handle_health(State(state_with(CardCatalog::new(), None))).await;
        assert!(body.running);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("uptimeSeconds").is_some());
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn ready_is_503_until_loaded() {
        let (status, Json(body)) = handle_ready(State(state_with(CardCatalog::new(), None))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.ready);

        let catalog = CardCatalog::with_contents(
            vec![Card {
                id: 0,
                name: "The Fool".into(),
                kind: "Major".into(),
                meaning: String::new(),
                image_ref: None,
            }],
            vec![SpreadDefinition::new("one", ["Answer"])],
        );
        let (status, Json(body)) = handle_ready(State(state_with(catalog, None))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!((body.cards_loaded, body.spreads_loaded), (1, 1));
    }
}
