//! Stream frame parser.
//!
//! The chat endpoint answers with newline-delimited lines, each either blank
//! or `data: <json>`. A `data: [DONE]` line ends the stream. Bytes are
//! buffered raw so a UTF-8 sequence split across two chunks still decodes.

use std::collections::VecDeque;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use shopdash_types::{DashError, Result};

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder; feed it chunks, get back complete frames in order.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to contain no newline
    scanned: usize,
    finished: bool,
}

enum Line {
    Skip,
    Frame(Value),
    End,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the sentinel has been seen. Later input is ignored.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one chunk and return the frames it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        let mut frames = Vec::new();
        if self.finished {
            return frames;
        }
        self.buffer.extend_from_slice(chunk);

        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.scanned = 0;

            match decode_line(&line[..end]) {
                Line::Skip => {}
                Line::Frame(value) => frames.push(value),
                Line::End => {
                    self.finished = true;
                    self.buffer.clear();
                    break;
                }
            }
        }
        self.scanned = self.buffer.len();
        frames
    }

    /// Transport closed. An unterminated trailing line is dropped.
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            log::debug!(
                "Dropping {} bytes of unterminated stream data",
                self.buffer.len()
            );
        }
        self.buffer.clear();
        self.scanned = 0;
        self.finished = true;
    }
}

fn decode_line(raw: &[u8]) -> Line {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_end_matches('\r');

    let Some(rest) = text.strip_prefix(DATA_PREFIX) else {
        return Line::Skip;
    };
    let rest = rest.trim();
    if rest == DONE_SENTINEL {
        return Line::End;
    }

    match serde_json::from_str(rest) {
        Ok(value) => Line::Frame(value),
        Err(e) => {
            log::warn!("Skipping malformed frame ({}): {}", e, rest);
            Line::Skip
        }
    }
}

struct FrameState<S> {
    bytes: S,
    decoder: FrameDecoder,
    pending: VecDeque<Value>,
    done: bool,
}

/// Turn a byte stream into a lazy stream of decoded JSON frames.
///
/// Ends after the sentinel, when the transport closes, or after yielding a
/// single transport error. Not restartable.
pub fn decode_frames<S>(bytes: S) -> impl Stream<Item = Result<Value>>
where
    S: Stream<Item = Result<Vec<u8>>> + Unpin,
{
    let state = FrameState {
        bytes,
        decoder: FrameDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.pending.pop_front() {
                return Some((Ok(frame), state));
            }

            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.pending.extend(state.decoder.push(&chunk));
                    if state.decoder.is_finished() {
                        state.done = true;
                    }
                }
                Some(Err(error)) => {
                    state.done = true;
                    let error = match error {
                        DashError::StreamTransport(_) => error,
                        other => DashError::StreamTransport(other.to_string()),
                    };
                    return Some((Err(error), state));
                }
                None => {
                    state.decoder.finish();
                    state.done = true;
                }
            }
        }
    })
}
