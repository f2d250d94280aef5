//! TUI components for logscope
//!
//! This crate provides the terminal user interface for the dashboard,
//! including state management, keybindings, event handling, and UI
//! components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, FilterCache, InputMode, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{HelpOverlay, StatusBar, dashboard_hints};
pub use ui::screens::DashboardScreen;
pub use ui::{Layout, Theme};
