//! Platform-free core of the dashboard chat client.
//!
//! Everything here runs on a single-threaded event loop and talks to the
//! outside world only through the traits in [`ports`].

pub mod ports;
pub mod event_bus;
pub mod frame;
pub mod cancel;
pub mod dispatcher;
pub mod session;
pub mod engine;
