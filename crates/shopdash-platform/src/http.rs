//! HTTP adapter for the dashboard chat backend.
//!
//! Session calls are JSON requests bounded by `request_timeout_ms`. The
//! stream call has no timeout and hands back the raw response body; frame
//! parsing happens in the core. Uses browser `fetch()` via gloo-net.

use std::future::Future;
use std::rc::Rc;
use async_trait::async_trait;
use futures::future::{self, Either};
use futures::stream;
use gloo_net::http::{Request, RequestBuilder, Response};
use gloo_timers::future::TimeoutFuture;
use gloo_utils::errors::JsError;
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{ReadableStream, ReadableStreamDefaultReader};

use shopdash_core::ports::*;
use shopdash_types::{
    DashError, Result,
    config::ClientConfig,
    session::{SessionRequest, SessionResponse},
};

pub struct HttpChatApi {
    config: ClientConfig,
    storage: Rc<dyn StoragePort>,
}

impl HttpChatApi {
    /// `storage` holds the bearer token under `config.token_storage_key`.
    pub fn new(config: ClientConfig, storage: Rc<dyn StoragePort>) -> Self {
        Self { config, storage }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token read fresh on every request so a re-login takes effect at once.
    pub async fn bearer_token(&self) -> Result<Option<String>> {
        let raw = self.storage.get(&self.config.token_storage_key).await?;
        Ok(raw
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
            .filter(|token| !token.is_empty()))
    }

    async fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.bearer_token().await? {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        })
    }

    /// Map non-2xx responses to errors. A 401 also clears the stored token.
    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status == 401 {
            log::warn!("Backend rejected the bearer token, clearing it");
            if let Err(e) = self.storage.delete(&self.config.token_storage_key).await {
                log::warn!("Failed to clear token: {}", e);
            }
            return Err(DashError::Unauthorized);
        }
        if !response.ok() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(DashError::Http { status, message });
        }
        Ok(response)
    }

    async fn with_timeout<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        let ms = self.config.request_timeout_ms;
        let timeout = TimeoutFuture::new(u32::try_from(ms).unwrap_or(u32::MAX));
        futures::pin_mut!(request);
        match future::select(request, timeout).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => {
                log::warn!("Request timed out after {}ms", ms);
                Err(DashError::Timeout(ms))
            }
        }
    }
}

#[async_trait(?Send)]
impl ChatApiPort for HttpChatApi {
    async fn create_session(&self, req: &SessionRequest) -> Result<SessionResponse> {
        let url = self.config.session_url();
        self.with_timeout(async {
            let request = self
                .authorize(Request::post(&url))
                .await?
                .json(req)
                .map_err(|e| DashError::Serialization(e.to_string()))?;
            let response = request.send().await.map_err(network)?;
            let response = self.check(response).await?;
            parse_session(response).await
        })
        .await
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionResponse> {
        let url = self.config.session_url_for(session_id);
        self.with_timeout(async {
            let response = self
                .authorize(Request::get(&url))
                .await?
                .send()
                .await
                .map_err(network)?;
            let response = self.check(response).await?;
            parse_session(response).await
        })
        .await
    }

    async fn open_stream(&self, req: &ChatStreamRequest) -> Result<ByteStream> {
        let url = self.config.stream_url();
        let request = self
            .authorize(Request::post(&url))
            .await?
            .header("Accept", "text/event-stream")
            .json(req)
            .map_err(|e| DashError::Serialization(e.to_string()))?;

        let response = request.send().await.map_err(network)?;
        let response = self.check(response).await?;
        let body = response
            .body()
            .ok_or_else(|| DashError::StreamTransport("response has no body".to_string()))?;

        log::debug!("Chat stream opened for session {}", req.session_id);
        Ok(body_stream(body))
    }
}

async fn parse_session(response: Response) -> Result<SessionResponse> {
    response
        .json::<SessionResponse>()
        .await
        .map_err(|e| DashError::Serialization(e.to_string()))
}

fn network(e: gloo_net::Error) -> DashError {
    DashError::Network(e.to_string())
}

// ─── Response body reader ────────────────────────────────────

/// Owns the body reader; cancels it if dropped before the body ends.
struct BodyReader {
    reader: ReadableStreamDefaultReader,
    done: bool,
}

impl Drop for BodyReader {
    fn drop(&mut self) {
        if !self.done {
            log::debug!("Releasing unfinished response body");
            let _ = self.reader.cancel();
        }
    }
}

fn body_stream(body: ReadableStream) -> ByteStream {
    let reader = BodyReader {
        reader: body.get_reader().unchecked_into(),
        done: false,
    };

    Box::pin(stream::unfold(reader, |mut body| async move {
        if body.done {
            return None;
        }
        match read_chunk(&body.reader).await {
            Ok(Some(chunk)) => Some((Ok(chunk), body)),
            Ok(None) => {
                body.done = true;
                None
            }
            Err(e) => {
                body.done = true;
                Some((Err(e), body))
            }
        }
    }))
}

async fn read_chunk(reader: &ReadableStreamDefaultReader) -> Result<Option<Vec<u8>>> {
    let result = JsFuture::from(reader.read())
        .await
        .map_err(|e| DashError::Network(js_error(e)))?;

    let done = Reflect::get(&result, &JsValue::from_str("done"))
        .map_err(|e| DashError::JsInterop(js_error(e)))?
        .as_bool()
        .unwrap_or(true);
    if done {
        return Ok(None);
    }

    let value = Reflect::get(&result, &JsValue::from_str("value"))
        .map_err(|e| DashError::JsInterop(js_error(e)))?;
    let chunk: Uint8Array = value
        .dyn_into()
        .map_err(|_| DashError::JsInterop("stream chunk is not a Uint8Array".to_string()))?;
    Ok(Some(chunk.to_vec()))
}

/// Best-effort message from a thrown JS value.
pub(crate) fn js_error(value: JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    match JsError::try_from(value) {
        Ok(error) => error.to_string(),
        Err(_) => "unknown JS exception".to_string(),
    }
}
