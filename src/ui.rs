//! Ratatui front-end for Beer Tracker: a list of beers, a detail view, a
//! modal add/edit form and a footer status line.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
