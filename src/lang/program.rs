//! Programs and the task registry

use crate::error::{CheckResult, SemanticError};
use crate::lang::ast::{DefinedTask, Location, Param};
use crate::runner::builtin::{builtins, BuiltinTask};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Name of the task that runs against the global scope
pub const STARTUP: &str = "startup";

/// Returns true if `name` refers to the startup task
pub fn is_startup(name: &str) -> bool {
    name.eq_ignore_ascii_case(STARTUP)
}

/// Registry key: task names compare without regard to case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskName(String);

impl TaskName {
    pub fn new(name: &str) -> Self {
        TaskName(name.to_lowercase())
    }
}

impl Borrow<str> for TaskName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A task the engine can run
#[derive(Debug, Clone)]
pub enum Task {
    Defined(DefinedTask),
    Builtin(BuiltinTask),
}

impl Task {
    pub fn name(&self) -> &str {
        match self {
            Task::Defined(task) => &task.name,
            Task::Builtin(task) => task.name,
        }
    }

    pub fn params(&self) -> &[Param] {
        match self {
            Task::Defined(task) => &task.params,
            Task::Builtin(task) => &task.params,
        }
    }

    pub fn param_count(&self) -> usize {
        self.params().len()
    }

    pub fn required_param_count(&self) -> usize {
        self.params().iter().filter(|p| p.is_required()).count()
    }

    /// Every variable the task body assigns
    pub fn defined_variable_names(&self) -> BTreeSet<&str> {
        match self {
            Task::Defined(task) => task.assigned_names().into_iter().collect(),
            Task::Builtin(_) => BTreeSet::new(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Task::Builtin(_))
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Task::Defined(task) => Some(task.location),
            Task::Builtin(_) => None,
        }
    }

    /// `name(PARAM, OPT="x")`, as shown in task listings
    pub fn signature(&self) -> String {
        if self.params().is_empty() {
            return self.name().to_string();
        }
        let params: Vec<String> = self.params().iter().map(|p| p.to_string()).collect();
        format!("{}({})", self.name(), params.join(", "))
    }
}

/// A parsed program: user tasks plus the builtin library
#[derive(Debug, Clone)]
pub struct Program {
    tasks: HashMap<TaskName, Task>,
    /// User task keys in declaration order
    order: Vec<TaskName>,
}

impl Program {
    /// An empty program with only the builtins registered
    pub fn new() -> Self {
        let mut tasks = HashMap::new();
        for builtin in builtins() {
            tasks.insert(TaskName::new(builtin.name), Task::Builtin(builtin));
        }
        Program {
            tasks,
            order: Vec::new(),
        }
    }

    /// Build a program, registering tasks in order
    pub fn from_tasks(defined: Vec<DefinedTask>) -> CheckResult<Self> {
        let mut program = Program::new();
        for task in defined {
            program.add_task(task)?;
        }
        Ok(program)
    }

    /// Register a user task. Names colliding modulo case are rejected.
    pub fn add_task(&mut self, task: DefinedTask) -> CheckResult<()> {
        let key = TaskName::new(&task.name);
        if self.tasks.contains_key(&key) {
            return Err(SemanticError::DuplicateTask {
                name: task.name,
                location: task.location,
            });
        }
        self.order.push(key.clone());
        self.tasks.insert(key, Task::Defined(task));
        Ok(())
    }

    /// Look up a task by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name.to_lowercase().as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// User tasks in declaration order
    pub fn defined_tasks(&self) -> impl Iterator<Item = &DefinedTask> {
        self.order.iter().filter_map(|key| match self.tasks.get(key) {
            Some(Task::Defined(task)) => Some(task),
            _ => None,
        })
    }

    /// All tasks: user tasks in declaration order, then builtins by name
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        let mut builtins: Vec<&Task> = self.tasks.values().filter(|t| t.is_builtin()).collect();
        builtins.sort_by(|a, b| a.name().cmp(b.name()));
        self.order
            .iter()
            .filter_map(|key| self.tasks.get(key))
            .chain(builtins)
    }

    /// The startup task, if the program defines one
    pub fn startup(&self) -> Option<&DefinedTask> {
        match self.get(STARTUP) {
            Some(Task::Defined(task)) => Some(task),
            _ => None,
        }
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}
