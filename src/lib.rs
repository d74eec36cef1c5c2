//! Buggery - a small task language and its runner
//!
//! A Buggeryfile declares tasks made of shell commands, variable
//! assignments and calls to other tasks. Programs are parsed, checked as a
//! whole and only then run, so a mistake anywhere is reported before any
//! command executes.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod lang;
pub mod runner;

// Re-export commonly used types
pub use error::{BuggeryError, Result};
pub use lang::{check_program, load_program, parse_program, Program};
pub use runner::{run, Engine, Value};

/// Current version of Buggery
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
