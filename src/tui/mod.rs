//! Interactive terminal interface
//!
//! Built on ratatui. The app subscribes to the active budget and redraws
//! from live snapshots; dialogs write through the same services as the CLI.

pub mod app;
pub mod dialogs;
pub mod event;
pub mod handler;
pub mod keybindings;
pub mod layout;
pub mod terminal;
pub mod theme;
pub mod views;
pub mod widgets;

pub use app::App;
pub use terminal::run_tui;
