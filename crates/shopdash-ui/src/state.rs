//! UI-level state that drives rendering.
//! This is a read-only projection of the chat engine,
//! updated each frame by draining the EventBus.

use shopdash_types::event::{ChatEvent, NoticeLevel};
use shopdash_types::message::ChatMessage;

/// Notices kept on screen at once
pub const MAX_NOTICES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Connecting,
    Ready(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Sending,
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// State visible to UI panels
pub struct UiState {
    /// Committed conversation, oldest first
    pub messages: Vec<ChatMessage>,
    /// Assistant text of the in-flight turn
    pub streaming_text: String,
    /// Reasoning text of the in-flight turn
    pub thinking_text: String,
    /// Input field content
    pub input_text: String,
    pub session: SessionStatus,
    pub phase: TurnPhase,
    pub notices: Vec<Notice>,
    /// Set once the backend rejects our token; cleared on reset
    pub auth_expired: bool,
    pub show_settings: bool,
    pub show_thinking: bool,
    /// Status line text
    pub status_text: String,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            streaming_text: String::new(),
            thinking_text: String::new(),
            input_text: String::new(),
            session: SessionStatus::Connecting,
            phase: TurnPhase::Idle,
            notices: Vec::new(),
            auth_expired: false,
            show_settings: false,
            show_thinking: false,
            status_text: "Connecting...".to_string(),
        }
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::SessionReady { session_id } => {
                    self.session = SessionStatus::Ready(session_id);
                    self.status_text = "Ready".to_string();
                }
                ChatEvent::SessionFailed { message } => {
                    self.status_text = "Session unavailable".to_string();
                    self.session = SessionStatus::Failed(message);
                }
                ChatEvent::UserMessage { message } => {
                    self.messages.push(message);
                }
                ChatEvent::TurnStart { .. } => {
                    self.phase = TurnPhase::Sending;
                    self.streaming_text.clear();
                    self.thinking_text.clear();
                    self.status_text = "Sending...".to_string();
                }
                ChatEvent::StreamOpened { .. } => {
                    self.phase = TurnPhase::Streaming;
                    self.status_text = "Answering...".to_string();
                }
                ChatEvent::ContentDelta { text } => {
                    self.streaming_text.push_str(&text);
                }
                ChatEvent::ThinkingDelta { text } => {
                    self.thinking_text.push_str(&text);
                }
                ChatEvent::CommandExecuted { label, .. } => {
                    self.status_text = format!("Dashboard: {}", label);
                }
                ChatEvent::MessageCommitted { message } => {
                    self.messages.push(message);
                    self.streaming_text.clear();
                    self.thinking_text.clear();
                }
                ChatEvent::TurnCancelled { .. } => {
                    self.streaming_text.clear();
                    self.thinking_text.clear();
                    self.notify(NoticeLevel::Info, "Reply stopped");
                }
                ChatEvent::TurnEnd { .. } => {
                    self.phase = TurnPhase::Idle;
                    if !matches!(self.session, SessionStatus::Failed(_)) {
                        self.status_text = "Ready".to_string();
                    }
                }
                ChatEvent::HistoryTruncated { len } => {
                    self.messages.truncate(len);
                }
                ChatEvent::Reset => {
                    self.messages.clear();
                    self.streaming_text.clear();
                    self.thinking_text.clear();
                    self.notices.clear();
                    self.phase = TurnPhase::Idle;
                    self.session = SessionStatus::Connecting;
                    self.auth_expired = false;
                    self.status_text = "Connecting...".to_string();
                }
                ChatEvent::AuthExpired => {
                    self.auth_expired = true;
                }
                ChatEvent::Notification { level, message } => {
                    self.notify(level, message);
                }
            }
        }
    }

    /// Queue a notice, dropping the oldest beyond [`MAX_NOTICES`].
    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        if index < self.notices.len() {
            self.notices.remove(index);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase != TurnPhase::Idle
    }

    /// Sending is possible: session ready, no turn in flight, non-blank input.
    pub fn can_send(&self) -> bool {
        matches!(self.session, SessionStatus::Ready(_))
            && !self.is_busy()
            && !self.input_text.trim().is_empty()
    }

    /// Regenerate needs at least one user message and an idle engine.
    pub fn can_regenerate(&self) -> bool {
        !self.is_busy()
            && matches!(self.session, SessionStatus::Ready(_))
            && self
                .messages
                .iter()
                .any(|m| m.role == shopdash_types::message::Role::User)
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a comma/space separated shop id list. `None` if any entry is not an id.
pub fn parse_shop_ids(input: &str) -> Option<Vec<i64>> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<i64>().ok())
        .collect()
}
