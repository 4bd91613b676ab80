//! egui front end for the dashboard chat assistant.
//!
//! Panels render from [`state::UiState`] and report user intent back as
//! plain action values; they never call the engine directly.

pub mod state;
pub mod theme;
pub mod panels;

#[cfg(test)]
mod tests;
