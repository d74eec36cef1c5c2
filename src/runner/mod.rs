//! Task execution engine
//!
//! This module runs checked programs: scopes and values, variable
//! interpolation, shell commands, the builtin library and the engine that
//! ties them together.

pub mod builtin;
pub mod command;
pub mod context;
pub mod engine;
pub mod interpolate;
pub mod scope;
pub mod value;

// Re-export main types
pub use builtin::BuiltinTask;
pub use command::execute_command;
pub use context::{Context, Verbosity};
pub use engine::{run, Engine};
pub use scope::{Frames, Scope};
pub use value::{ProcessResult, Value};
