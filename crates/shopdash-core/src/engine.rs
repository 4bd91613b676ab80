//! Streaming chat engine.
//!
//! Per-conversation state machine:
//! `Idle -> Sending -> Streaming -> Idle` (done, error, or cancelled).
//!
//! A turn is started synchronously with [`ChatEngine::start_message`] so the
//! UI sees `Sending` before the next frame, then driven to completion by
//! [`ChatEngine::run_turn`], which must be spawned via
//! `wasm_bindgen_futures::spawn_local`. At most one turn is in flight.

use std::cell::RefCell;
use std::rc::Rc;
use futures::StreamExt;
use shopdash_types::{
    DashError, Result,
    command::DashboardCommand,
    config::ClientConfig,
    event::{ChatEvent, NoticeLevel, StreamEvent},
    message::{ChatMessage, Role},
    session::{ChatSession, ShopScope},
};
use crate::cancel::CancelToken;
use crate::dispatcher::DashboardStore;
use crate::event_bus::EventBus;
use crate::frame::decode_frames;
use crate::ports::*;
use crate::session::SessionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    /// Request sent, no bytes yet
    Sending,
    Streaming,
}

/// A started turn, ready to be driven by [`ChatEngine::run_turn`].
pub struct Turn {
    id: u64,
    request: ChatStreamRequest,
    token: CancelToken,
}

impl Turn {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request(&self) -> &ChatStreamRequest {
        &self.request
    }
}

struct EngineInner {
    state: EngineState,
    messages: Vec<ChatMessage>,
    /// Running assistant output of the current turn
    live: String,
    /// Reasoning text of the current turn
    thinking: String,
    active: Option<(u64, CancelToken)>,
    turn_counter: u64,
}

/// Chat engine, clone-cheap via Rc. Clones share one conversation.
#[derive(Clone)]
pub struct ChatEngine {
    api: Rc<dyn ChatApiPort>,
    sessions: Rc<SessionManager>,
    store: DashboardStore,
    event_bus: EventBus,
    inner: Rc<RefCell<EngineInner>>,
}

impl ChatEngine {
    pub fn new(
        api: Rc<dyn ChatApiPort>,
        clock: Rc<dyn ClockPort>,
        store: DashboardStore,
        event_bus: EventBus,
        config: &ClientConfig,
    ) -> Self {
        let sessions = Rc::new(SessionManager::new(api.clone(), clock, config));
        Self {
            api,
            sessions,
            store,
            event_bus,
            inner: Rc::new(RefCell::new(EngineInner {
                state: EngineState::Idle,
                messages: Vec::new(),
                live: String::new(),
                thinking: String::new(),
                active: None,
                turn_counter: 0,
            })),
        }
    }

    pub fn state(&self) -> EngineState {
        self.inner.borrow().state
    }

    pub fn is_idle(&self) -> bool {
        self.state() == EngineState::Idle
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.borrow().messages.clone()
    }

    /// Assistant text streamed so far in the current turn
    pub fn live_text(&self) -> String {
        self.inner.borrow().live.clone()
    }

    pub fn thinking_text(&self) -> String {
        self.inner.borrow().thinking.clone()
    }

    pub fn session(&self) -> Option<ChatSession> {
        self.sessions.current()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    /// Text of a committed message, for the copy action.
    pub fn message_text(&self, message_id: &str) -> Option<String> {
        self.inner
            .borrow()
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .map(|m| m.content.clone())
    }

    // ─── Session ─────────────────────────────────────────────

    /// Create (or reuse) the session for this conversation.
    pub async fn ensure_session(&self, scope: &ShopScope) -> Result<ChatSession> {
        match self.sessions.create_session(scope).await {
            Ok(session) => {
                self.event_bus.emit(ChatEvent::SessionReady {
                    session_id: session.id.clone(),
                });
                Ok(session)
            }
            Err(DashError::Busy) => Err(DashError::Busy),
            Err(e) => {
                if e == DashError::Unauthorized {
                    self.event_bus.emit(ChatEvent::AuthExpired);
                }
                self.event_bus.emit(ChatEvent::SessionFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// The UI's retry action: drop the prior session id and create anew.
    pub async fn retry_session(&self, scope: &ShopScope) -> Result<ChatSession> {
        self.sessions.reset();
        self.ensure_session(scope).await
    }

    // ─── Turns ───────────────────────────────────────────────

    /// Start a turn: validate, append the user message, enter `Sending`.
    pub fn start_message(&self, text: &str) -> Result<Turn> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DashError::InvalidInput("message is empty".to_string()));
        }
        let session = self.sessions.current().ok_or(DashError::NoSession)?;

        let (turn_id, token, history, message) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != EngineState::Idle {
                return Err(DashError::Busy);
            }
            let history = inner.messages.iter().map(ChatMessage::to_history).collect();
            let message = ChatMessage::user(text);
            inner.messages.push(message.clone());

            inner.turn_counter += 1;
            let turn_id = inner.turn_counter;
            let token = CancelToken::new();
            inner.active = Some((turn_id, token.clone()));
            inner.state = EngineState::Sending;
            inner.live.clear();
            inner.thinking.clear();
            (turn_id, token, history, message)
        };

        self.event_bus.emit(ChatEvent::UserMessage { message });
        self.event_bus.emit(ChatEvent::TurnStart { turn_id });

        Ok(Turn {
            id: turn_id,
            request: ChatStreamRequest {
                message: text.to_string(),
                session_id: session.id,
                shop_ids: session.scope.shop_ids(),
                history,
            },
            token,
        })
    }

    /// Drive a started turn until done, error, or cancellation.
    ///
    /// Cancellation is not an error: it returns `Ok(())`.
    pub async fn run_turn(&self, turn: Turn) -> Result<()> {
        let Turn { id, request, token } = turn;
        log::info!("Turn {}: sending message ({} history entries)", id, request.history.len());

        let bytes = match token.guard(self.api.open_stream(&request)).await {
            Err(_aborted) => {
                log::debug!("Turn {} cancelled before the stream opened", id);
                return Ok(());
            }
            Ok(Err(e)) => return self.fail_turn(id, &token, e),
            Ok(Ok(bytes)) => bytes,
        };

        let engine = self.clone();
        let first_byte_token = token.clone();
        let bytes = token.guard(bytes).inspect(move |chunk| {
            if chunk.is_ok() {
                engine.mark_streaming(id, &first_byte_token);
            }
        });
        let mut frames = Box::pin(decode_frames(bytes));

        while let Some(frame) = frames.next().await {
            if token.is_cancelled() {
                return Ok(());
            }
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => return self.fail_turn(id, &token, e),
            };
            let event = match StreamEvent::from_frame(&frame) {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("Turn {}: {}", id, e);
                    continue;
                }
            };

            match event {
                StreamEvent::Thinking(text) => self.append_thinking(&text),
                StreamEvent::Content(text) => self.append_content(&text),
                StreamEvent::DashboardCommand(command) => self.apply_command(&command),
                StreamEvent::Done => return self.commit_turn(id, &token),
                StreamEvent::Error(message) => {
                    return self.fail_turn(id, &token, DashError::StreamProtocol(message));
                }
            }
        }

        if token.is_cancelled() {
            return Ok(());
        }
        // Sentinel or clean close without a `done` frame
        self.commit_turn(id, &token)
    }

    /// `start_message` followed by `run_turn`.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let turn = self.start_message(text)?;
        self.run_turn(turn).await
    }

    /// Abort the in-flight turn. No-op (returns false) when idle.
    pub fn cancel(&self) -> bool {
        let (turn_id, token) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == EngineState::Idle {
                return false;
            }
            let Some(active) = inner.active.take() else {
                return false;
            };
            inner.state = EngineState::Idle;
            inner.live.clear();
            inner.thinking.clear();
            active
        };

        token.cancel();
        log::info!("Turn {} cancelled", turn_id);
        self.event_bus.emit(ChatEvent::TurnCancelled { turn_id });
        self.event_bus.emit(ChatEvent::TurnEnd { turn_id });
        true
    }

    /// Resend the most recent user message.
    ///
    /// The conversation is cut back to just before that message (dropping
    /// any reply to it). Returns `Ok(None)` when there is nothing to resend.
    pub fn regenerate(&self) -> Result<Option<Turn>> {
        let (text, len) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != EngineState::Idle {
                return Err(DashError::Busy);
            }
            let Some(index) = inner.messages.iter().rposition(|m| m.role == Role::User) else {
                return Ok(None);
            };
            if self.sessions.current().is_none() {
                return Err(DashError::NoSession);
            }
            let text = inner.messages[index].content.clone();
            inner.messages.truncate(index);
            (text, index)
        };

        self.event_bus.emit(ChatEvent::HistoryTruncated { len });
        self.start_message(&text).map(Some)
    }

    /// Clear the conversation and discard the session.
    pub fn reset(&self) {
        self.cancel();
        {
            let mut inner = self.inner.borrow_mut();
            inner.messages.clear();
            inner.live.clear();
            inner.thinking.clear();
        }
        self.sessions.reset();
        self.event_bus.emit(ChatEvent::Reset);
    }

    // ─── Frame handling ──────────────────────────────────────

    /// True while `turn_id` is the live, uncancelled turn.
    fn is_current(&self, turn_id: u64, token: &CancelToken) -> bool {
        !token.is_cancelled()
            && matches!(self.inner.borrow().active, Some((id, _)) if id == turn_id)
    }

    fn mark_streaming(&self, turn_id: u64, token: &CancelToken) {
        if !self.is_current(turn_id, token) {
            return;
        }
        let opened = {
            let mut inner = self.inner.borrow_mut();
            let opened = inner.state == EngineState::Sending;
            inner.state = EngineState::Streaming;
            opened
        };
        if opened {
            log::debug!("Turn {}: stream opened", turn_id);
            self.event_bus.emit(ChatEvent::StreamOpened { turn_id });
        }
    }

    fn append_thinking(&self, text: &str) {
        self.inner.borrow_mut().thinking.push_str(text);
        self.event_bus.emit(ChatEvent::ThinkingDelta {
            text: text.to_string(),
        });
    }

    fn append_content(&self, text: &str) {
        self.inner.borrow_mut().live.push_str(text);
        self.event_bus.emit(ChatEvent::ContentDelta {
            text: text.to_string(),
        });
    }

    fn apply_command(&self, command: &DashboardCommand) {
        let outcome = self.store.dispatch(command);
        if !outcome.took_effect() {
            return;
        }

        let label = command.label();
        let marker = {
            let mut inner = self.inner.borrow_mut();
            let mut marker = String::new();
            if !inner.live.is_empty() && !inner.live.ends_with('\n') {
                marker.push('\n');
            }
            marker.push_str(&command_marker(&label));
            marker.push('\n');
            inner.live.push_str(&marker);
            marker
        };
        self.event_bus.emit(ChatEvent::CommandExecuted {
            kind: command.kind().to_string(),
            label,
        });
        self.event_bus.emit(ChatEvent::ContentDelta { text: marker });
    }

    fn commit_turn(&self, turn_id: u64, token: &CancelToken) -> Result<()> {
        if !self.is_current(turn_id, token) {
            return Ok(());
        }
        let message = {
            let mut inner = self.inner.borrow_mut();
            let content = std::mem::take(&mut inner.live);
            inner.thinking.clear();
            let message = ChatMessage::assistant(content);
            inner.messages.push(message.clone());
            inner.state = EngineState::Idle;
            inner.active = None;
            message
        };
        log::info!("Turn {}: reply committed ({} chars)", turn_id, message.content.len());
        self.event_bus.emit(ChatEvent::MessageCommitted { message });
        self.event_bus.emit(ChatEvent::TurnEnd { turn_id });
        Ok(())
    }

    fn fail_turn(&self, turn_id: u64, token: &CancelToken, error: DashError) -> Result<()> {
        if !self.is_current(turn_id, token) {
            return Ok(());
        }
        {
            let mut inner = self.inner.borrow_mut();
            inner.state = EngineState::Idle;
            inner.active = None;
            inner.live.clear();
            inner.thinking.clear();
        }

        let error = match error {
            DashError::StreamProtocol(_) | DashError::StreamTransport(_) | DashError::Unauthorized => {
                error
            }
            other => DashError::StreamTransport(other.to_string()),
        };
        log::warn!("Turn {} failed: {}", turn_id, error);

        if error == DashError::Unauthorized {
            self.event_bus.emit(ChatEvent::AuthExpired);
        }
        self.event_bus.emit(ChatEvent::Notification {
            level: NoticeLevel::Error,
            message: error.to_string(),
        });
        self.event_bus.emit(ChatEvent::TurnEnd { turn_id });
        Err(error)
    }
}

/// Transcript marker recording that a dashboard command ran.
pub fn command_marker(label: &str) -> String {
    format!("[command executed: {}]", label)
}

/// True for a transcript line written by [`command_marker`].
pub fn is_command_marker(line: &str) -> bool {
    line.starts_with("[command executed: ") && line.ends_with(']')
}
