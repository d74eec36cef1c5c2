//! The task language
//!
//! Source text goes through [`lexer`] and [`parser`] into a [`Program`],
//! which [`check`] verifies before anything runs.

pub mod ast;
pub mod check;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod visit;

pub use ast::{Location, Param};
pub use check::check_program;
pub use parser::parse_program;
pub use program::{is_startup, Program, Task, STARTUP};

use crate::error::Result;

/// Parse and check `source`, ready to run
pub fn load_program(source: &str) -> Result<Program> {
    let program = parse_program(source)?;
    check_program(&program)?;
    Ok(program)
}
