//! Browser adapters for the shopdash-core ports.
//!
//! Only compiles to something useful on `wasm32-unknown-unknown`.

pub mod http;
pub mod storage;
pub mod clock;
