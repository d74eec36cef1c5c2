//! CLI interface and argument parsing
//!
//! This module handles command-line parsing, task file discovery, shell
//! completion and the mapping of errors to exit codes.

pub mod app;

// Re-export main types
pub use app::*;
