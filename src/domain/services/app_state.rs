#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Local;
use ratatui::prelude::Rect;

use super::ConversationState;
use super::Scroll;
use crate::domain::models::AssistantReply;
use crate::domain::models::BackendVersion;
use crate::domain::models::ClientError;
use crate::domain::models::Message;
use crate::domain::models::ProtocolGeneration;
use crate::domain::models::TurnRequest;

/// Conversation plus the UI-layer state that surrounds it: input gating,
/// the refresh busy flag, the status banner and scrolling.
pub struct AppState {
    pub conversation: ConversationState,
    pub protocol: ProtocolGeneration,
    pub context_window: usize,
    pub refreshing: bool,
    pub last_refreshed: Option<DateTime<Local>>,
    pub status: Option<String>,
    pub scroll: Scroll,
    pub last_known_width: u16,
    pub last_known_height: u16,
}

impl AppState {
    pub fn new(
        protocol: ProtocolGeneration,
        context_window: usize,
        use_external_llm: bool,
    ) -> AppState {
        return AppState {
            conversation: ConversationState::new(use_external_llm),
            protocol,
            context_window,
            refreshing: false,
            last_refreshed: None,
            status: None,
            scroll: Scroll::default(),
            last_known_width: 0,
            last_known_height: 0,
        };
    }

    pub fn waiting_for_backend(&self) -> bool {
        return self.conversation.lifecycle().is_waiting();
    }

    /// Starts a turn from the input box. Submissions while a turn is in
    /// flight are dropped.
    pub fn submit(&mut self, input: &str) -> Option<TurnRequest> {
        if self.waiting_for_backend() {
            tracing::debug!("Ignoring submit while waiting for the backend");
            return None;
        }

        let request = self
            .conversation
            .prepare_turn(input, self.context_window)?;
        self.status = None;
        self.sync_dependants();
        self.scroll.last();

        return Some(request);
    }

    pub fn handle_turn_response(&mut self, res: Result<AssistantReply, ClientError>) {
        if let Err(err) = &res {
            self.status = Some(format!("Timothy couldn't answer that one. {err}"));
        }

        self.conversation.finish_turn(res);
        self.sync_dependants();
        self.scroll.last();
    }

    pub fn handle_readiness_response(&mut self, res: Result<BackendVersion, ClientError>) {
        match res {
            Ok(version) => {
                self.conversation.set_backend_version(version);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Continuing without a ready backend");
                self.status = Some(format!("Timothy isn't reachable yet, {err}."));
            }
        }
    }

    /// Marks a data refresh as outstanding. Returns false if one already is.
    pub fn begin_refresh(&mut self) -> bool {
        if self.refreshing {
            return false;
        }

        self.refreshing = true;
        return true;
    }

    pub fn handle_refresh_response(&mut self, res: Result<BackendVersion, ClientError>) {
        self.refreshing = false;
        match res {
            Ok(version) => {
                self.conversation.set_backend_version(version);
                self.last_refreshed = Some(Local::now());
                self.status = None;
            }
            Err(err) => {
                self.status = Some(format!("Update failed. {err}"));
            }
        }
    }

    pub fn toggle_external_llm(&mut self) -> bool {
        let use_external = self.conversation.toggle_external_llm();
        if !self.protocol.supports_external_llm() {
            self.status = Some(format!(
                "The {} protocol has no external LLM option, the toggle is ignored.",
                self.protocol
            ));
        }

        return use_external;
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    /// Width available to message text inside the bordered list.
    pub fn line_width(&self) -> usize {
        return self.last_known_width.saturating_sub(4).max(1) as usize;
    }

    /// Wrapped lines for one message, header included.
    pub fn message_lines(&self, message: &Message) -> Vec<String> {
        let mut header = message.author.to_string();
        if let Some(origin) = message.origin {
            header = format!("{header} ({origin})");
        }

        let mut lines = vec![header];
        lines.extend(message.as_string_lines(self.line_width()));
        return lines;
    }

    fn sync_dependants(&mut self) {
        let lines_len: usize = self
            .conversation
            .messages()
            .iter()
            .map(|message| {
                return self.message_lines(message).len() + 1;
            })
            .sum();

        self.scroll.set_state(
            u16::try_from(lines_len).unwrap_or(u16::MAX),
            self.last_known_height.saturating_sub(2),
        );
    }
}
