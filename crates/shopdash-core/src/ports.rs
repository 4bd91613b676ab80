//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `shopdash-core` (pure Rust).
//! Implementations live in `shopdash-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::Stream;
use serde::Serialize;
use shopdash_types::{
    Result,
    message::HistoryEntry,
    session::{SessionRequest, SessionResponse},
};

// ─── Chat API Port ───────────────────────────────────────────

/// Raw response body, chunked however the transport delivers it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>>>>;

/// Body of the streaming chat request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatStreamRequest {
    pub message: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_ids: Option<Vec<i64>>,
    /// Prior conversation, oldest first
    pub history: Vec<HistoryEntry>,
}

#[async_trait(?Send)]
pub trait ChatApiPort {
    /// Create a chat session
    async fn create_session(&self, req: &SessionRequest) -> Result<SessionResponse>;

    /// Fetch an existing session by id
    async fn get_session(&self, session_id: &str) -> Result<SessionResponse>;

    /// Send a message and return the response body as a byte stream.
    /// Dropping the stream must release the underlying connection.
    async fn open_stream(&self, req: &ChatStreamRequest) -> Result<ByteStream>;
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Clock Port ──────────────────────────────────────────────

#[async_trait(?Send)]
pub trait ClockPort {
    /// Current local calendar date
    fn today(&self) -> NaiveDate;

    /// Suspend for `ms` milliseconds
    async fn sleep(&self, ms: u64);
}
