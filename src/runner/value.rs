//! Runtime values

use std::fmt;

/// Everything known about a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// The interpolated command text
    pub command: String,
    /// Text fed to standard input, if any
    pub stdin: Option<String>,
    /// Captured standard output, trimmed
    pub stdout: String,
    /// Captured standard error, trimmed
    pub stderr: String,
    pub exit_code: i32,
    pub pid: u32,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A value produced by evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Process(ProcessResult),
}

impl Value {
    /// The string form used for interpolation and builtin arguments.
    /// A process result reads as its standard output.
    pub fn as_string(&self) -> &str {
        match self {
            Value::String(s) => s,
            Value::Process(result) => &result.stdout,
        }
    }

    pub fn as_process(&self) -> Option<&ProcessResult> {
        match self {
            Value::Process(result) => Some(result),
            Value::String(_) => None,
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<ProcessResult> for Value {
    fn from(result: ProcessResult) -> Self {
        Value::Process(result)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_string())
    }
}
