//! Command-line front end for the notebook store.
mod app;
mod main;

pub use app::*;
pub use main::*;
