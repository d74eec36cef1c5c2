//! Syntax tree produced by the parser
//!
//! Nodes are built once and never mutated. Both the checker and the engine
//! read them; every node remembers where it came from in the source.

use crate::runner::interpolate::markers;
use std::fmt;

/// Name of the variable whose value becomes a task's result
pub const RETVAL: &str = "RETVAL";

/// 1-based position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A user-defined task
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedTask {
    pub name: String,
    pub params: Vec<Param>,
    pub subtasks: Vec<Subtask>,
    pub location: Location,
}

impl DefinedTask {
    /// Names assigned anywhere in the body, in source order
    pub fn assigned_names(&self) -> Vec<&str> {
        self.subtasks.iter().filter_map(Subtask::defines).collect()
    }
}

/// A task parameter, with an optional default evaluated at call time
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
    pub location: Location,
}

impl Param {
    /// A parameter that must always be supplied
    pub fn required(name: &str) -> Self {
        Param {
            name: name.to_string(),
            default: None,
            location: Location::default(),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "{}={}", self.name, default),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One statement of a task body
#[derive(Debug, Clone, PartialEq)]
pub enum Subtask {
    Assignment(Assignment),
    Command(Command),
    Call(Call),
}

impl Subtask {
    pub fn location(&self) -> Location {
        match self {
            Subtask::Assignment(assignment) => assignment.location,
            Subtask::Command(command) => command.location,
            Subtask::Call(call) => call.location,
        }
    }

    /// Variables this statement reads
    pub fn uses(&self) -> Vec<VariableUse<'_>> {
        match self {
            Subtask::Assignment(assignment) => assignment.value.uses(),
            Subtask::Command(command) => command.uses(),
            Subtask::Call(call) => call.uses(),
        }
    }

    /// The variable this statement assigns, if any
    pub fn defines(&self) -> Option<&str> {
        match self {
            Subtask::Assignment(assignment) => Some(&assignment.target),
            Subtask::Command(_) | Subtask::Call(_) => None,
        }
    }
}

/// `NAME = expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: String,
    pub value: Expr,
    pub location: Location,
}

/// `$ text`, optionally fed from a variable with `$ (NAME) text`
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub text: String,
    pub stdin: Option<String>,
    pub location: Location,
}

impl Command {
    pub fn uses(&self) -> Vec<VariableUse<'_>> {
        let mut uses: Vec<VariableUse<'_>> = self
            .stdin
            .iter()
            .map(|name| VariableUse::new(name, self.location))
            .collect();
        uses.extend(markers(&self.text).map(|name| VariableUse::new(name, self.location)));
        uses
    }
}

/// `task` or `task(arg, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub target: String,
    pub args: Vec<Expr>,
    pub location: Location,
}

impl Call {
    pub fn uses(&self) -> Vec<VariableUse<'_>> {
        self.args.iter().flat_map(Expr::uses).collect()
    }
}

/// Value-producing expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    String(StringLiteral),
    Variable(VariableRef),
    Call(Call),
    Command(Command),
}

impl Expr {
    /// Shorthand for a string literal at an unknown location
    pub fn string(text: &str) -> Self {
        Expr::String(StringLiteral {
            text: text.to_string(),
            location: Location::default(),
        })
    }

    /// Shorthand for a variable reference at an unknown location
    pub fn variable(name: &str) -> Self {
        Expr::Variable(VariableRef {
            name: name.to_string(),
            location: Location::default(),
        })
    }

    pub fn location(&self) -> Location {
        match self {
            Expr::String(literal) => literal.location,
            Expr::Variable(variable) => variable.location,
            Expr::Call(call) => call.location,
            Expr::Command(command) => command.location,
        }
    }

    pub fn uses(&self) -> Vec<VariableUse<'_>> {
        match self {
            Expr::String(literal) => markers(&literal.text)
                .map(|name| VariableUse::new(name, literal.location))
                .collect(),
            Expr::Variable(variable) => vec![VariableUse::new(&variable.name, variable.location)],
            Expr::Call(call) => call.uses(),
            Expr::Command(command) => command.uses(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::String(literal) => write!(f, "\"{}\"", literal.text),
            Expr::Variable(variable) => write!(f, "{}", variable.name),
            Expr::Call(call) => {
                write!(f, "{}", call.target)?;
                if !call.args.is_empty() {
                    let args: Vec<String> = call.args.iter().map(|a| a.to_string()).collect();
                    write!(f, "({})", args.join(", "))?;
                }
                Ok(())
            }
            Expr::Command(command) => match &command.stdin {
                Some(stdin) => write!(f, "$ ({}) {}", stdin, command.text),
                None => write!(f, "$ {}", command.text),
            },
        }
    }
}

/// A double-quoted string, possibly containing `@NAME` markers
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub text: String,
    pub location: Location,
}

/// A bare variable name
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    pub name: String,
    pub location: Location,
}

/// A read of a variable, with where it happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableUse<'a> {
    pub name: &'a str,
    pub location: Location,
}

impl<'a> VariableUse<'a> {
    fn new(name: &'a str, location: Location) -> Self {
        VariableUse { name, location }
    }
}
