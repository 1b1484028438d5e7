// Terminal UI implementation using ratatui

pub mod app;
pub mod help_ui;
pub mod runner;
pub mod ui;

pub use app::{App, Dispatch, FeedKind, InputMode};
pub use runner::{run_tui, TuiOptions};
