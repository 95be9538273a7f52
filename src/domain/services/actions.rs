#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use super::AssistantClient;
use crate::domain::models::Action;
use crate::domain::models::Event;

pub fn help_text() -> String {
    let text = r#"
HOTKEYS:
- Enter - Send your message to Timothy.
- CTRL+T - Toggle between the internal and external LLM.
- CTRL+R - Ask the backend to update its product data. Updating may take a while.
- Up arrow - Scroll up
- Down arrow - Scroll down
- Page up - Page up
- Page down - Page down
- CTRL+C - Exit.
        "#;

    return text.trim().to_string();
}

fn report(tx: &mpsc::UnboundedSender<Event>, event: Event) {
    if tx.send(event).is_err() {
        tracing::warn!("UI stopped listening for backend events");
    }
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs every backend action on its own task so the UI keeps drawing while
    /// requests are outstanding. Returns once the action channel closes.
    pub async fn start(
        client: AssistantClient,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let client = Arc::new(client);

        while let Some(action) = rx.recv().await {
            let worker_client = client.clone();
            let worker_tx = tx.clone();

            match action {
                Action::BackendProbeReadiness() => {
                    tokio::spawn(async move {
                        let res = worker_client.probe_readiness().await;
                        report(&worker_tx, Event::BackendReady(res));
                    });
                }
                Action::BackendRefreshData() => {
                    tokio::spawn(async move {
                        let res = worker_client.refresh_data().await;
                        report(&worker_tx, Event::BackendDataRefreshed(res));
                    });
                }
                Action::BackendSendTurn(request) => {
                    tokio::spawn(async move {
                        let res = worker_client.send_turn(&request).await;
                        report(&worker_tx, Event::BackendTurnResponse(res));
                    });
                }
            }
        }

        return Ok(());
    }
}
