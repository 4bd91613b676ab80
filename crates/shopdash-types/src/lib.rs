pub mod message;
pub mod session;
pub mod command;
pub mod dashboard;
pub mod event;
pub mod config;
pub mod error;


pub use error::DashError;
pub type Result<T> = std::result::Result<T, DashError>;
