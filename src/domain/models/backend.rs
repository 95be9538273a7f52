use anyhow::Result;
use async_trait::async_trait;

use super::Author;
use super::BackendVersion;
use super::Origin;
use super::ProtocolGeneration;
use super::WireMessage;

/// Everything needed to issue one chat turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnRequest {
    /// Prior messages, oldest first. Never contains `text`.
    pub context: Vec<WireMessage>,
    pub text: String,
    pub use_external: bool,
}

impl TurnRequest {
    /// Context window followed by the new user message.
    pub fn messages(&self) -> Vec<WireMessage> {
        let mut messages = self.context.clone();
        messages.push(WireMessage {
            sender: Author::User.sender().to_string(),
            text: self.text.to_string(),
        });

        return messages;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistantReply {
    pub text: String,
    pub origin: Option<Origin>,
}

#[async_trait]
pub trait AssistantBackend {
    fn protocol(&self) -> ProtocolGeneration;

    /// A single readiness check. Any transport error or non-success status is
    /// an error.
    async fn is_ready(&self) -> Result<BackendVersion>;

    /// Asks the backend to refresh its product data, returning the version it
    /// reports afterwards.
    async fn update_data(&self) -> Result<BackendVersion>;

    /// Sends one chat turn and waits for the complete reply.
    async fn send_message(&self, request: &TurnRequest) -> Result<AssistantReply>;
}

pub type BackendBox = Box<dyn AssistantBackend + Send + Sync>;
