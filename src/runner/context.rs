//! Execution context for task running
//!
//! The context tracks the host-facing state needed while tasks run: where
//! commands execute, how they are started, how chatty to be and where task
//! output goes.

use crate::config::Settings;
use colored::{ColoredString, Colorize};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

/// Execution context that tracks state during task execution
pub struct Context {
    /// Directory commands run in and relative paths resolve against
    pub working_dir: PathBuf,

    /// Command prefix used to run shell text (e.g., ["sh", "-c"])
    pub interpreter: Vec<String>,

    /// Stack of tasks being executed, innermost last
    pub task_stack: Vec<String>,

    /// Verbosity level
    pub verbosity: Verbosity,

    /// Whether command stdout is echoed while it is captured
    pub stream_output: bool,

    /// Where `print` and streamed command output go
    output: Box<dyn Write>,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context with default settings
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            interpreter: vec!["sh".to_string(), "-c".to_string()],
            task_stack: Vec::new(),
            verbosity: Verbosity::Normal,
            stream_output: true,
            output: Box::new(io::stdout()),
        }
    }

    /// Apply values from a settings file
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.interpreter = settings.interpreter.clone();
        self.stream_output = settings.stream_output;
        self
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Send task output somewhere other than stdout
    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.output = output;
        self
    }

    /// Record entry into a task
    pub fn enter_task(&mut self, task_name: &str) {
        self.task_stack.push(task_name.to_string());
        self.print_debug(&format!("Entering {}", self.call_chain()));
    }

    /// Record that the innermost task finished, successfully or not
    pub fn leave_task(&mut self, succeeded: bool) -> Option<String> {
        if succeeded {
            self.print_debug(&format!("Finished {}", self.call_chain()));
        } else {
            self.print_debug(&format!("Aborted {}", self.call_chain()));
        }
        self.task_stack.pop()
    }

    /// Whether a task is already running, ignoring case
    pub fn is_task_in_stack(&self, task_name: &str) -> bool {
        self.task_stack
            .iter()
            .any(|t| t.eq_ignore_ascii_case(task_name))
    }

    /// Name of the innermost running task
    pub fn current_task(&self) -> Option<&str> {
        self.task_stack.last().map(String::as_str)
    }

    /// Active tasks, outermost first, as `outer > inner`
    pub fn call_chain(&self) -> String {
        self.task_stack.join(" > ")
    }

    /// Whether streamed command output should be echoed
    pub fn echoes_output(&self) -> bool {
        self.stream_output && self.verbosity >= Verbosity::Normal
    }

    /// Write one line of task output
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{}", line)?;
        self.output.flush()
    }

    fn log(&self, min: Verbosity, label: ColoredString, message: &str) {
        if self.verbosity >= min {
            eprintln!("{} {}", label, message);
        }
    }

    pub fn print_info(&self, message: &str) {
        self.log(Verbosity::Normal, "[INFO]".green(), message);
    }

    /// Errors still show with `--quiet`
    pub fn print_error(&self, message: &str) {
        self.log(Verbosity::Quiet, "[ERROR]".red().bold(), message);
    }

    /// Only shown with `--verbose`
    pub fn print_debug(&self, message: &str) {
        self.log(Verbosity::Verbose, "[DEBUG]".dimmed(), message);
    }

    /// Announce a command before it runs
    pub fn print_command(&self, command: &str) {
        self.log(Verbosity::Normal, "[RUN]".cyan().bold(), command);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
