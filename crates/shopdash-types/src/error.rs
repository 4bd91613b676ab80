use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashError {
    #[error("Session creation failed: {0}")]
    SessionCreation(String),

    #[error("Stream interrupted: {0}")]
    StreamTransport(String),

    #[error("Assistant error: {0}")]
    StreamProtocol(String),

    #[error("Malformed frame: {0}")]
    FrameDecode(String),

    #[error("Not authorized")]
    Unauthorized,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("A reply is still streaming")]
    Busy,

    #[error("No chat session")]
    NoSession,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),
}

impl DashError {
    /// Worth retrying: the request may succeed if sent again.
    pub fn is_transient(&self) -> bool {
        match self {
            DashError::Network(_) | DashError::Timeout(_) => true,
            DashError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(e: serde_json::Error) -> Self {
        DashError::Serialization(e.to_string())
    }
}
