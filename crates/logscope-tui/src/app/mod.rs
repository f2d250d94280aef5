//! Application state and actions

mod action;
mod state;

pub use action::Action;
pub use state::{AppState, FilterCache, InputMode, UiState};
