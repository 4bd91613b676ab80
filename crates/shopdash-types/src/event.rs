use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::DashboardCommand;
use crate::message::ChatMessage;
use crate::{DashError, Result};

/// One decoded frame of the chat stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental reasoning text
    Thinking(String),
    /// Incremental assistant output
    Content(String),
    /// A command to apply to the dashboard immediately
    DashboardCommand(DashboardCommand),
    /// Terminal: commit the running buffer
    Done,
    /// Terminal: discard the running buffer
    Error(String),
}

impl StreamEvent {
    /// Interpret a frame's JSON document.
    ///
    /// Frames look like `{"type": "content", "data": "..."}`; the body may
    /// also arrive under `content`.
    pub fn from_frame(frame: &Value) -> Result<Self> {
        let kind = frame
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DashError::FrameDecode("frame has no type".to_string()))?;
        let body = frame.get("data").or_else(|| frame.get("content"));

        match kind {
            "thinking" => Ok(StreamEvent::Thinking(body_text(body)?)),
            "content" => Ok(StreamEvent::Content(body_text(body)?)),
            "dashboard_command" => {
                let payload = body
                    .or_else(|| frame.get("command"))
                    .ok_or_else(|| DashError::FrameDecode("command frame has no payload".to_string()))?;
                let command = DashboardCommand::deserialize(payload)
                    .map_err(|e| DashError::FrameDecode(e.to_string()))?;
                Ok(StreamEvent::DashboardCommand(command))
            }
            "done" => Ok(StreamEvent::Done),
            "error" => {
                let message = body
                    .or_else(|| frame.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown stream error")
                    .to_string();
                Ok(StreamEvent::Error(message))
            }
            other => Err(DashError::FrameDecode(format!("unknown frame type: {}", other))),
        }
    }
}

fn body_text(body: Option<&Value>) -> Result<String> {
    match body {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(DashError::FrameDecode(format!(
            "expected text body, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Events emitted by the chat engine.
/// UI subscribes to these for reactive updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatEvent {
    /// A session is ready for messages
    SessionReady { session_id: String },

    /// Session creation failed; the UI should offer a retry
    SessionFailed { message: String },

    /// User message appended optimistically
    UserMessage { message: ChatMessage },

    /// A turn started (request being sent)
    TurnStart { turn_id: u64 },

    /// First bytes of the response arrived
    StreamOpened { turn_id: u64 },

    /// Assistant output arrived
    ContentDelta { text: String },

    /// Reasoning text arrived
    ThinkingDelta { text: String },

    /// A dashboard command was applied
    CommandExecuted { kind: String, label: String },

    /// The assistant message was committed
    MessageCommitted { message: ChatMessage },

    /// The user aborted the turn
    TurnCancelled { turn_id: u64 },

    /// The turn is over, whatever the outcome
    TurnEnd { turn_id: u64 },

    /// Conversation was cut back to `len` messages (regenerate)
    HistoryTruncated { len: usize },

    /// Conversation and session were cleared
    Reset,

    /// Stored credentials were rejected
    AuthExpired,

    /// Transient notice for the user
    Notification { level: NoticeLevel, message: String },
}
