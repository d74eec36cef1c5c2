//! Source discovery and runner settings
//!
//! This module finds the Buggeryfile to run and loads the optional
//! buggery.yml settings file and dotenv file that go with it.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
