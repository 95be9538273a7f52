#[cfg(test)]
#[path = "conversation_state_test.rs"]
mod tests;

use crate::domain::models::AssistantReply;
use crate::domain::models::Author;
use crate::domain::models::BackendVersion;
use crate::domain::models::ClientError;
use crate::domain::models::Message;
use crate::domain::models::Origin;
use crate::domain::models::RequestLifecycle;
use crate::domain::models::TurnRequest;
use crate::domain::models::WireMessage;

pub const GREETING: &str =
    "Hi, my name is Timothy. I'm your personal assistant for shopping clothes. Ask me anything.";

/// The conversation log plus everything the next turn depends on. The log is
/// append-only and starts with a single greeting from the assistant.
pub struct ConversationState {
    messages: Vec<Message>,
    lifecycle: RequestLifecycle,
    backend_version: Option<BackendVersion>,
    use_external_llm: bool,
}

impl ConversationState {
    pub fn new(use_external_llm: bool) -> ConversationState {
        return ConversationState {
            messages: vec![Message::new(Author::Assistant, GREETING)],
            lifecycle: RequestLifecycle::Idle,
            backend_version: None,
            use_external_llm,
        };
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn lifecycle(&self) -> RequestLifecycle {
        return self.lifecycle;
    }

    pub fn backend_version(&self) -> Option<&BackendVersion> {
        return self.backend_version.as_ref();
    }

    pub fn use_external_llm(&self) -> bool {
        return self.use_external_llm;
    }

    pub fn append_message(&mut self, author: Author, text: &str, origin: Option<Origin>) {
        self.messages
            .push(Message::new_with_origin(author, text, origin));
    }

    /// The last `n` messages, oldest first, reduced to sender and text.
    pub fn recent_context(&self, n: usize) -> Vec<WireMessage> {
        let start = self.messages.len().saturating_sub(n);
        return self.messages[start..]
            .iter()
            .map(|message| {
                return message.to_wire();
            })
            .collect();
    }

    pub fn set_lifecycle(&mut self, lifecycle: RequestLifecycle) {
        self.lifecycle = lifecycle;
    }

    pub fn set_backend_version(&mut self, version: BackendVersion) {
        self.backend_version = Some(version);
    }

    pub fn set_external_llm_preference(&mut self, use_external_llm: bool) {
        self.use_external_llm = use_external_llm;
    }

    pub fn toggle_external_llm(&mut self) -> bool {
        self.set_external_llm_preference(!self.use_external_llm);
        return self.use_external_llm;
    }

    /// Starts a turn for `input`. Blank input is a no-op and returns `None`.
    /// The context is captured before the user's message is appended, so it
    /// never contains the message being sent.
    pub fn prepare_turn(&mut self, input: &str, context_window: usize) -> Option<TurnRequest> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        let context = self.recent_context(context_window);
        self.append_message(Author::User, text, None);
        self.set_lifecycle(RequestLifecycle::Waiting);

        return Some(TurnRequest {
            context,
            text: text.to_string(),
            use_external: self.use_external_llm,
        });
    }

    /// Completes the outstanding turn. Failures leave the log untouched.
    pub fn finish_turn(&mut self, result: Result<AssistantReply, ClientError>) {
        match result {
            Ok(reply) => {
                self.append_message(Author::Assistant, &reply.text, reply.origin);
            }
            Err(err) => {
                tracing::error!(error = %err, "Chat turn failed");
            }
        }

        self.set_lifecycle(RequestLifecycle::Idle);
    }
}
