//! Error types for Buggery

use crate::lang::Location;
use crate::runner::ProcessResult;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Buggery operations
pub type Result<T> = std::result::Result<T, BuggeryError>;

/// Main error type for Buggery
#[derive(Error, Debug)]
pub enum BuggeryError {
    /// Malformed source text
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// Program failed static checking
    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),

    /// Failure while running a task
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// A shell command exited unsuccessfully
    #[error("{0}")]
    Command(Box<CommandFailure>),

    /// Settings file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<CommandFailure> for BuggeryError {
    fn from(failure: CommandFailure) -> Self {
        BuggeryError::Command(Box::new(failure))
    }
}

impl BuggeryError {
    /// Source location of the error, when one is known
    pub fn location(&self) -> Option<Location> {
        match self {
            BuggeryError::Syntax(e) => Some(e.location()),
            BuggeryError::Semantic(e) => e.location(),
            BuggeryError::Runtime(e) => e.location(),
            _ => None,
        }
    }

    /// The failed process record, if this error is a command failure
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            BuggeryError::Command(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Lexical and grammatical errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("{location}: unexpected character '{found}'")]
    UnexpectedChar { location: Location, found: char },

    #[error("{location}: unterminated string")]
    UnterminatedString { location: Location },

    #[error("{location}: subtasks must be indented by exactly {expected} spaces")]
    BadIndent { location: Location, expected: usize },

    #[error("{location}: empty command")]
    EmptyCommand { location: Location },

    #[error("{location}: expected {expected}, found {found}")]
    UnexpectedToken {
        location: Location,
        expected: String,
        found: String,
    },
}

impl SyntaxError {
    pub fn location(&self) -> Location {
        match self {
            SyntaxError::UnexpectedChar { location, .. }
            | SyntaxError::UnterminatedString { location }
            | SyntaxError::BadIndent { location, .. }
            | SyntaxError::EmptyCommand { location }
            | SyntaxError::UnexpectedToken { location, .. } => *location,
        }
    }
}

/// Errors found by the static checker
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    #[error("program defines no tasks")]
    NoTasks,

    #[error("{location}: duplicate task '{name}'")]
    DuplicateTask { name: String, location: Location },

    #[error("{location}: task '{name}' has no subtasks")]
    EmptyTask { name: String, location: Location },

    #[error("{location}: duplicate parameter '{name}' in task '{task}'")]
    DuplicateParam {
        name: String,
        task: String,
        location: Location,
    },

    #[error("{location}: variable '{name}' is used before it is assigned in task '{task}'")]
    UninitializedVariable {
        name: String,
        task: String,
        location: Location,
    },

    #[error("{location}: task '{name}' is not defined")]
    UnknownTask { name: String, location: Location },

    #[error("{location}: task '{callee}' never assigns RETVAL, so its result cannot be captured")]
    MissingRetval { callee: String, location: Location },

    #[error("{location}: task '{callee}' takes at most {max} argument(s), {given} given")]
    TooManyArguments {
        callee: String,
        given: usize,
        max: usize,
        location: Location,
    },

    #[error("{location}: task '{callee}' needs at least {min} argument(s), {given} given")]
    TooFewArguments {
        callee: String,
        given: usize,
        min: usize,
        location: Location,
    },

    #[error("{location}: task '{name}' is recursive ({cycle})")]
    RecursiveTask {
        name: String,
        cycle: String,
        location: Location,
    },
}

impl SemanticError {
    pub fn location(&self) -> Option<Location> {
        match self {
            SemanticError::NoTasks => None,
            SemanticError::DuplicateTask { location, .. }
            | SemanticError::EmptyTask { location, .. }
            | SemanticError::DuplicateParam { location, .. }
            | SemanticError::UninitializedVariable { location, .. }
            | SemanticError::UnknownTask { location, .. }
            | SemanticError::MissingRetval { location, .. }
            | SemanticError::TooManyArguments { location, .. }
            | SemanticError::TooFewArguments { location, .. }
            | SemanticError::RecursiveTask { location, .. } => Some(*location),
        }
    }
}

/// Errors raised while a task runs
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("{}task '{name}' is not defined", At(.location))]
    UnknownTask {
        name: String,
        location: Option<Location>,
    },

    #[error("{}variable '{name}' is not defined", At(.location))]
    UnknownVariable {
        name: String,
        location: Option<Location>,
    },

    #[error("{}too few arguments for task '{task}': parameter '{param}' has no value", At(.location))]
    TooFewArguments {
        task: String,
        param: String,
        location: Option<Location>,
    },

    #[error("{}task '{task}' takes at most {max} argument(s), {given} given", At(.location))]
    TooManyArguments {
        task: String,
        given: usize,
        max: usize,
        location: Option<Location>,
    },

    #[error("{}task '{task}' is already running ({chain})", At(.location))]
    RecursiveTask {
        task: String,
        chain: String,
        location: Option<Location>,
    },

    #[error("{}null is not a valid value (for '{name}')", At(.location))]
    NullValue {
        name: String,
        location: Option<Location>,
    },

    #[error("failed to run `{command}`: {source}")]
    Process {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("builtin '{task}' failed: {source}")]
    Builtin {
        task: String,
        #[source]
        source: io::Error,
    },
}

impl RuntimeError {
    pub fn location(&self) -> Option<Location> {
        match self {
            RuntimeError::UnknownTask { location, .. }
            | RuntimeError::UnknownVariable { location, .. }
            | RuntimeError::TooFewArguments { location, .. }
            | RuntimeError::TooManyArguments { location, .. }
            | RuntimeError::RecursiveTask { location, .. }
            | RuntimeError::NullValue { location, .. } => *location,
            RuntimeError::Process { .. } | RuntimeError::Builtin { .. } => None,
        }
    }
}

/// Optional location prefix for runtime messages
struct At<'a>(&'a Option<Location>);

impl fmt::Display for At<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(location) => write!(f, "{}: ", location),
            None => Ok(()),
        }
    }
}

/// A shell command that exited with a non-zero status.
///
/// Carries the complete process record so callers can inspect what the
/// command printed before it failed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Command `{}` failed with exit code {}", .result.command, .result.exit_code)]
pub struct CommandFailure {
    pub result: ProcessResult,
}

impl CommandFailure {
    pub fn new(result: ProcessResult) -> Self {
        CommandFailure { result }
    }

    pub fn exit_code(&self) -> i32 {
        self.result.exit_code
    }
}

/// Settings file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find {0} (searched: {1})")]
    NotFound(String, String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: String },

    #[error("Failed to load environment file '{path}': {error}")]
    EnvFile { path: PathBuf, error: String },
}

/// Variable interpolation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),
}

/// Specialized result type for parsing
pub type SyntaxResult<T> = std::result::Result<T, SyntaxError>;

/// Specialized result type for static checking
pub type CheckResult<T> = std::result::Result<T, SemanticError>;

/// Specialized result type for settings operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

/// Specialized result type for task execution.
///
/// Execution can fail either with an engine error or with a command failure,
/// so this uses the top-level error type.
pub type RuntimeResult<T> = Result<T>;
