use std::path::PathBuf;
use std::sync::Arc;

use log::{error, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::CommonArgs;
use crate::error::{BotResult, TransportResult};
use crate::router::RETRY_NOTICE;
use crate::transport::{ChatTransport, ConsoleTransport, InboundEvent};

use super::build_services;

/// Answer commands read line by line from stdin until EOF.
pub async fn run(user: &str, image_dir: Option<PathBuf>, common: &CommonArgs) -> BotResult<()> {
    let services = build_services(common)?;
    services.load_catalog().await;

    let transport = Arc::new(ConsoleTransport::new(image_dir));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event = InboundEvent::from_user(user, line);
        let router = Arc::clone(&services.router);
        let sink = Arc::clone(&transport);
        answer(
            async move { router.handle(&event, sink.as_ref()).await },
            transport.as_ref(),
        )
        .await;
    }

    services.router.drain_saves().await;
    Ok(())
}

/// Run one event's handler on its own task. A failing handler does not end
/// the session; the user is told to try again instead.
async fn answer<F>(handler: F, transport: &dyn ChatTransport)
where
    F: Future<Output = TransportResult<()>> + Send + 'static,
{
    match tokio::spawn(handler).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("reply not delivered: {e}"),
        Err(e) => {
            error!("command handler failed: {e}");
            if let Err(e) = transport.reply(RETRY_NOTICE, None).await {
                warn!("retry notice not delivered: {e}");
            }
        }
    }
}
