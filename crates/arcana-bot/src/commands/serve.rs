use std::sync::Arc;

use crate::config::CommonArgs;
use crate::error::BotResult;
use crate::http::{self, AppState};

use super::build_services;

/// Serve the webhook and health endpoints until interrupted.
pub async fn run(port: u16, chat_token: Option<String>, common: &CommonArgs) -> BotResult<()> {
    let services = Arc::new(build_services(common)?);

    // readiness reports 503 until this finishes
    let loader = Arc::clone(&services);
    tokio::spawn(async move { loader.load_catalog().await });

    let state = Arc::new(AppState {
        catalog: Arc::clone(&services.catalog),
        router: Arc::clone(&services.router),
        chat_token: chat_token.filter(|t| !t.is_empty()),
        started_at: services.started_at,
    });
    http::serve(port, state).await?;

    services.router.drain_saves().await;
    Ok(())
}
