//! HTTP surface of `arcana serve`.
//!
//! Endpoints:
//! - GET  /health    - liveness and uptime (never authenticated)
//! - GET  /ready     - whether the catalog is loaded; 503 until it is
//! - POST /messages  - chat webhook; bearer token required when configured
//!
//! All responses use Content-Type: application/json.

mod health;
mod middleware;
mod webhook;

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router, middleware as axum_middleware};
use log::{info, warn};

use arcana_core::CardCatalog;

use crate::error::BotResult;
use crate::router::CommandRouter;

use self::health::{handle_health, handle_ready};
use self::middleware::auth_middleware;
use self::webhook::handle_message;

/// Shared state of the HTTP handlers.
pub struct AppState {
    /// Catalog whose load state drives readiness.
    pub catalog: Arc<CardCatalog>,
    /// Command router the webhook feeds.
    pub router: Arc<CommandRouter>,
    /// Bearer token for the webhook; `None` disables authentication.
    pub chat_token: Option<String>,
    /// Process start, for uptime.
    pub started_at: Instant,
}

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Build the application router.
pub fn app(state: Arc<AppState>) -> Router {
    let messages = Router::new()
        .route("/messages", post(handle_message))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .merge(messages)
        .with_state(state)
}

/// Serve the application on `port` until Ctrl-C.
pub async fn serve(port: u16, state: Arc<AppState>) -> BotResult<()> {
    if state.chat_token.is_none() {
        warn!("no chat token configured; POST /messages accepts unauthenticated requests");
    }
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use arcana_core::{EngineConfig, MemoryStore, ReadingEngine, TabularStore};
    use arcana_render::{ArtworkCache, NoArtwork, SpreadRenderer};

    use super::*;
    use crate::router::DEFAULT_KEYWORD;

    pub(crate) fn state_with(catalog: CardCatalog, chat_token: Option<String>) -> Arc<AppState> {
        let catalog = Arc::new(catalog);
        let store: Arc<dyn TabularStore> = Arc::new(MemoryStore::new());
        let engine = Arc::new(ReadingEngine::new(
            Arc::clone(&catalog),
            store,
            EngineConfig::default().with_seed(3),
        ));
        let renderer = SpreadRenderer::new(Arc::new(ArtworkCache::new(Arc::new(NoArtwork))));
        Arc::new(AppState {
            catalog,
            router: Arc::new(CommandRouter::new(engine, renderer, DEFAULT_KEYWORD)),
            chat_token,
            started_at: Instant::now(),
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn webhook_requires_token_but_health_does_not() {
        let state = state_with(CardCatalog::new(), Some("s3cret".into()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app(state)).await.unwrap() });

        let statuses = tokio::task::spawn_blocking(move || {
            let agent: ureq::Agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .into();
            let body = r#"{"text":"tarot help","authorId":"u1"}"#;
            let post = |auth: Option<&str>| {
                let mut request = agent
                    .post(&format!("{base}/messages"))
                    .header("Content-Type", "application/json");
                if let Some(auth) = auth {
                    request = request.header("Authorization", auth);
                }
                request.send(body).unwrap().status().as_u16()
            };
            let missing = post(None);
            let wrong = post(Some("Bearer nope"));
            let right = post(Some("Bearer s3cret"));
            let health = agent
                .get(&format!("{base}/health"))
                .call()
                .unwrap()
                .status()
                .as_u16();
            let ready = agent
                .get(&format!("{base}/ready"))
                .call()
                .unwrap()
                .status()
                .as_u16();
            (missing, wrong, right, health, ready)
        })
        .await
        .unwrap();

        assert_eq!(statuses, (401, 403, 200, 200, 503));
    }
}
