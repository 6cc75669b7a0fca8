//! Notebook application library
//!
//! This library provides a persistent store for themed notebooks and their notes,
//! the global display preferences, color helpers, and a command-line front end.

mod cli;
mod color;
mod config;
mod errors;
mod helper;
mod notebook;
mod speech;
mod storage;
mod store;
mod types;

// Re-export key components
pub use cli::*;
pub use color::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use notebook::*;
pub use speech::*;
pub use storage::*;
pub use store::*;
pub use types::*;
