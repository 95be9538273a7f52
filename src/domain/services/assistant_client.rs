#[cfg(test)]
#[path = "assistant_client_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use tokio::time;

use super::ConversationState;
use crate::configuration::Config;
use crate::domain::models::AssistantReply;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendVersion;
use crate::domain::models::ClientError;
use crate::domain::models::TurnRequest;
use crate::infrastructure::backends::BackendManager;

pub const DEFAULT_READINESS_ATTEMPTS: u32 = 10;
pub const DEFAULT_READINESS_INTERVAL: Duration = Duration::from_millis(1000);

/// Drives the network operations the conversation depends on and maps their
/// failures to `ClientError`.
pub struct AssistantClient {
    backend: BackendBox,
    readiness_attempts: u32,
    readiness_interval: Duration,
}

impl AssistantClient {
    pub fn new(backend: BackendBox) -> AssistantClient {
        return AssistantClient {
            backend,
            readiness_attempts: DEFAULT_READINESS_ATTEMPTS,
            readiness_interval: DEFAULT_READINESS_INTERVAL,
        };
    }

    pub fn from_config() -> Result<AssistantClient> {
        return Ok(AssistantClient::new(BackendManager::get()?).with_readiness(
            Config::readiness_attempts()?,
            Config::readiness_interval()?,
        ));
    }

    pub fn with_readiness(mut self, attempts: u32, interval: Duration) -> AssistantClient {
        self.readiness_attempts = attempts.max(1);
        self.readiness_interval = interval;
        return self;
    }

    /// Polls the backend until it reports ready, sleeping between failed
    /// attempts. Transport errors and bad statuses are treated alike.
    pub async fn probe_readiness(&self) -> Result<BackendVersion, ClientError> {
        for attempt in 1..=self.readiness_attempts {
            match self.backend.is_ready().await {
                Ok(version) => {
                    tracing::info!(attempt, version = %version, "Backend is ready");
                    return Ok(version);
                }
                Err(err) => {
                    tracing::debug!(attempt, error = ?err, "Backend is not ready");
                }
            }

            if attempt < self.readiness_attempts {
                time::sleep(self.readiness_interval).await;
            }
        }

        tracing::error!(
            attempts = self.readiness_attempts,
            "Backend never became ready"
        );
        return Err(ClientError::BackendUnavailable {
            attempts: self.readiness_attempts,
        });
    }

    pub async fn send_turn(&self, request: &TurnRequest) -> Result<AssistantReply, ClientError> {
        return self.backend.send_message(request).await.map_err(|err| {
            tracing::error!(
                protocol = %self.backend.protocol(),
                error = ?err,
                "Failed to send chat turn"
            );
            return ClientError::TurnFailed(err.to_string());
        });
    }

    pub async fn refresh_data(&self) -> Result<BackendVersion, ClientError> {
        let res = self.backend.update_data().await;
        match res {
            Ok(version) => {
                tracing::info!(version = %version, "Backend data refreshed");
                return Ok(version);
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to refresh backend data");
                return Err(ClientError::RefreshFailed(err.to_string()));
            }
        }
    }

    /// Runs one complete turn against `state`. Returns `false` when the input
    /// was blank and nothing was sent.
    pub async fn run_turn(
        &self,
        state: &mut ConversationState,
        input: &str,
        context_window: usize,
    ) -> Result<bool, ClientError> {
        let request = match state.prepare_turn(input, context_window) {
            Some(request) => request,
            None => return Ok(false),
        };

        let res = self.send_turn(&request).await;
        let outcome = res.clone().map(|_| {
            return true;
        });
        state.finish_turn(res);

        return outcome;
    }
}
