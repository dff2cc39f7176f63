//! Ratatui front-end. The shell only collects input, hands typed arguments
//! to [`Library`](crate::library::Library), and renders what comes back.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
