//! Chat session lifecycle.
//!
//! A session is created once and cached until `reset`. Transient failures
//! are retried with a fixed backoff before giving up.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use shopdash_types::{
    DashError, Result,
    config::ClientConfig,
    session::{ChatSession, SessionRequest, SessionResponse, ShopScope},
};
use crate::ports::{ChatApiPort, ClockPort};

pub struct SessionManager {
    api: Rc<dyn ChatApiPort>,
    clock: Rc<dyn ClockPort>,
    retries: u32,
    backoff_ms: u64,
    current: RefCell<Option<ChatSession>>,
    creating: Cell<bool>,
}

impl SessionManager {
    pub fn new(api: Rc<dyn ChatApiPort>, clock: Rc<dyn ClockPort>, config: &ClientConfig) -> Self {
        Self {
            api,
            clock,
            retries: config.session_retries,
            backoff_ms: config.retry_backoff_ms,
            current: RefCell::new(None),
            creating: Cell::new(false),
        }
    }

    pub fn current(&self) -> Option<ChatSession> {
        self.current.borrow().clone()
    }

    /// Return the cached session, creating it on first use.
    ///
    /// Failures other than a rejected token surface as
    /// [`DashError::SessionCreation`].
    pub async fn create_session(&self, scope: &ShopScope) -> Result<ChatSession> {
        if let Some(session) = self.current() {
            return Ok(session);
        }
        if self.creating.replace(true) {
            return Err(DashError::Busy);
        }
        let result = self.create_with_retry(scope).await;
        self.creating.set(false);

        let session = result?;
        *self.current.borrow_mut() = Some(session.clone());
        Ok(session)
    }

    async fn create_with_retry(&self, scope: &ShopScope) -> Result<ChatSession> {
        let req = SessionRequest::for_scope(scope);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.api.create_session(&req).await {
                Ok(resp) => {
                    log::info!(
                        "Chat session {} created for {}",
                        resp.session_id,
                        scope.label()
                    );
                    return Ok(ChatSession::from_response(resp, scope.clone()));
                }
                Err(DashError::Unauthorized) => return Err(DashError::Unauthorized),
                Err(e) if e.is_transient() && attempt <= self.retries => {
                    log::warn!(
                        "Session creation attempt {} failed ({}), retrying in {}ms",
                        attempt,
                        e,
                        self.backoff_ms
                    );
                    self.clock.sleep(self.backoff_ms).await;
                }
                Err(e) => {
                    log::warn!("Session creation failed after {} attempt(s): {}", attempt, e);
                    return Err(DashError::SessionCreation(e.to_string()));
                }
            }
        }
    }

    /// Fetch a session's current metadata from the backend.
    pub async fn get_session(&self, session_id: &str) -> Result<SessionResponse> {
        self.api.get_session(session_id).await
    }

    /// Forget the cached session
    pub fn reset(&self) {
        if let Some(old) = self.current.borrow_mut().take() {
            log::info!("Chat session {} discarded", old.id);
        }
    }

    /// Discard any prior session and create a fresh one.
    pub async fn retry(&self, scope: &ShopScope) -> Result<ChatSession> {
        self.reset();
        self.create_session(scope).await
    }
}
