//! TUI module for PetMarket CLI
//!
//! Terminal messaging view using Ratatui.

mod app;
mod backend;
mod compose;
mod messages;
mod sidebar;
mod ui;

pub use app::run;
