//! Static checks run before any task executes
//!
//! The checker walks the whole tree once (see [`walk`]) and matches on each
//! node kind. Task bodies are straight-line code, so definite assignment is a
//! single pass over the statements in source order. Once every call is known
//! to resolve, the call graph is searched for cycles: a task may not call
//! itself, directly or through other tasks.

use crate::error::{CheckResult, SemanticError};
use crate::lang::ast::{Call, DefinedTask, Expr, Subtask, VariableUse, RETVAL};
use crate::lang::program::{is_startup, Program, Task};
use crate::lang::visit::{walk, Node};
use std::collections::HashSet;

/// Validate a parsed program
pub fn check_program(program: &Program) -> CheckResult<()> {
    if program.defined_tasks().next().is_none() {
        return Err(SemanticError::NoTasks);
    }

    let checker = Checker::new(program);
    walk(Node::Program(program), &mut |node| checker.check_node(node))?;

    detect_recursive_tasks(program)
}

/// Tasks called by `task`, from call statements and assigned calls
fn calls_in(task: &DefinedTask) -> impl Iterator<Item = &Call> {
    task.subtasks.iter().filter_map(|subtask| match subtask {
        Subtask::Call(call) => Some(call),
        Subtask::Assignment(assignment) => match &assignment.value {
            Expr::Call(call) => Some(call),
            _ => None,
        },
        Subtask::Command(_) => None,
    })
}

fn detect_recursive_tasks(program: &Program) -> CheckResult<()> {
    let mut finished = HashSet::new();
    for task in program.defined_tasks() {
        let mut stack = Vec::new();
        check_task_cycle(program, task, &mut finished, &mut stack)?;
    }
    Ok(())
}

/// Depth-first search from `task`; `stack` holds the path that led here
fn check_task_cycle<'a>(
    program: &'a Program,
    task: &'a DefinedTask,
    finished: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
) -> CheckResult<()> {
    if finished.contains(task.name.as_str()) {
        return Ok(());
    }

    stack.push(&task.name);
    for call in calls_in(task) {
        // Builtins never call back into user tasks
        let Some(Task::Defined(callee)) = program.get(&call.target) else {
            continue;
        };

        if let Some(start) = stack.iter().position(|name| *name == callee.name) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(&callee.name);
            return Err(SemanticError::RecursiveTask {
                name: callee.name.clone(),
                cycle: cycle.join(" -> "),
                location: call.location,
            });
        }

        check_task_cycle(program, callee, finished, stack)?;
    }
    stack.pop();

    finished.insert(&task.name);
    Ok(())
}

struct Checker<'a> {
    program: &'a Program,
    /// Variables assigned in `startup`; visible to every other task
    globals: HashSet<&'a str>,
}

impl<'a> Checker<'a> {
    fn new(program: &'a Program) -> Self {
        let globals = program
            .startup()
            .map(|startup| startup.assigned_names().into_iter().collect())
            .unwrap_or_default();
        Checker { program, globals }
    }

    fn check_node(&self, node: Node<'a>) -> CheckResult<()> {
        match node {
            Node::Task(Task::Defined(task)) => self.check_task(task),
            Node::Call(call) => self.check_call(call),
            Node::Task(Task::Builtin(_))
            | Node::Program(_)
            | Node::Param(_)
            | Node::Subtask(_)
            | Node::Expr(_)
            | Node::Command(_) => Ok(()),
        }
    }

    fn check_task(&self, task: &'a DefinedTask) -> CheckResult<()> {
        if task.subtasks.is_empty() {
            return Err(SemanticError::EmptyTask {
                name: task.name.clone(),
                location: task.location,
            });
        }

        self.check_definite_assignment(task)?;

        for subtask in &task.subtasks {
            if let Subtask::Assignment(assignment) = subtask {
                if let Expr::Call(call) = &assignment.value {
                    self.check_retval(call)?;
                }
            }
        }
        Ok(())
    }

    fn check_definite_assignment(&self, task: &'a DefinedTask) -> CheckResult<()> {
        let mut defined: HashSet<&str> = if is_startup(&task.name) {
            HashSet::new()
        } else {
            self.globals.clone()
        };

        let mut params = HashSet::new();
        for param in &task.params {
            if !params.insert(param.name.as_str()) {
                return Err(SemanticError::DuplicateParam {
                    name: param.name.clone(),
                    task: task.name.clone(),
                    location: param.location,
                });
            }
            // Defaults are evaluated after the earlier parameters are bound
            if let Some(default) = &param.default {
                require_defined(&defined, default.uses(), &task.name)?;
            }
            defined.insert(param.name.as_str());
        }

        for subtask in &task.subtasks {
            require_defined(&defined, subtask.uses(), &task.name)?;
            if let Some(name) = subtask.defines() {
                defined.insert(name);
            }
        }
        Ok(())
    }

    fn callee(&self, call: &Call) -> CheckResult<&'a Task> {
        self.program
            .get(&call.target)
            .ok_or_else(|| SemanticError::UnknownTask {
                name: call.target.clone(),
                location: call.location,
            })
    }

    fn check_retval(&self, call: &Call) -> CheckResult<()> {
        let callee = self.callee(call)?;
        if !callee.defined_variable_names().contains(RETVAL) {
            return Err(SemanticError::MissingRetval {
                callee: callee.name().to_string(),
                location: call.location,
            });
        }
        Ok(())
    }

    fn check_call(&self, call: &Call) -> CheckResult<()> {
        let callee = self.callee(call)?;
        let given = call.args.len();

        if given > callee.param_count() {
            return Err(SemanticError::TooManyArguments {
                callee: callee.name().to_string(),
                given,
                max: callee.param_count(),
                location: call.location,
            });
        }
        if given < callee.required_param_count() {
            return Err(SemanticError::TooFewArguments {
                callee: callee.name().to_string(),
                given,
                min: callee.required_param_count(),
                location: call.location,
            });
        }
        Ok(())
    }
}

fn require_defined(
    defined: &HashSet<&str>,
    uses: Vec<VariableUse<'_>>,
    task: &str,
) -> CheckResult<()> {
    match uses.into_iter().find(|u| !defined.contains(u.name)) {
        Some(missing) => Err(SemanticError::UninitializedVariable {
            name: missing.name.to_string(),
            task: task.to_string(),
            location: missing.location,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ast::Location;
    use crate::lang::parser::parse_program;

    fn check(source: &str) -> CheckResult<()> {
        let program = parse_program(source).unwrap();
        check_program(&program)
    }

    #[test]
    fn test_valid_program() {
        assert!(check("mytask:\n  $ ls\n").is_ok());
    }

    #[test]
    fn test_no_tasks() {
        assert_eq!(check("# nothing here\n"), Err(SemanticError::NoTasks));
    }

    #[test]
    fn test_empty_task() {
        let err = check("a:\nb:\n  pass\n").unwrap_err();
        assert_eq!(
            err,
            SemanticError::EmptyTask {
                name: "a".to_string(),
                location: Location::new(1, 1),
            }
        );
    }

    #[test]
    fn test_use_before_assignment() {
        let err = check("t:\n  print(X)\n  X = \"late\"\n").unwrap_err();
        assert!(matches!(err, SemanticError::UninitializedVariable { ref name, .. } if name == "X"));
        assert_eq!(err.location(), Some(Location::new(2, 9)));
    }

    #[test]
    fn test_marker_in_command_counts_as_use() {
        let err = check("t:\n  $ echo @MISSING\n").unwrap_err();
        assert!(matches!(err, SemanticError::UninitializedVariable { ref name, .. } if name == "MISSING"));
    }

    #[test]
    fn test_stdin_variable_counts_as_use() {
        assert!(check("t:\n  $ (INPUT) cat\n").is_err());
        assert!(check("t:\n  INPUT = \"x\"\n  $ (INPUT) cat\n").is_ok());
    }

    #[test]
    fn test_params_are_defined() {
        assert!(check("t(A, B=\"b\"):\n  print(\"@A @B\")\n").is_ok());
    }

    #[test]
    fn test_default_may_use_earlier_param_only() {
        assert!(check("t(A, B=A):\n  print(B)\n").is_ok());
        let err = check("t(B=A, A=\"a\"):\n  print(B)\n").unwrap_err();
        assert!(matches!(err, SemanticError::UninitializedVariable { ref name, .. } if name == "A"));
    }

    #[test]
    fn test_duplicate_param() {
        let err = check("t(A, A):\n  pass\n").unwrap_err();
        assert!(matches!(err, SemanticError::DuplicateParam { .. }));
    }

    #[test]
    fn test_startup_assignments_are_global_elsewhere() {
        let source = "startup:\n  X = \"hi\"\ngreet:\n  print(X)\n";
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_startup_does_not_see_its_own_later_assignments() {
        let err = check("startup:\n  print(X)\n  X = \"hi\"\n").unwrap_err();
        assert!(matches!(err, SemanticError::UninitializedVariable { .. }));
    }

    #[test]
    fn test_missing_retval() {
        let err = check("noret:\n  pass\nuse:\n  X = noret\n").unwrap_err();
        assert_eq!(
            err,
            SemanticError::MissingRetval {
                callee: "noret".to_string(),
                location: Location::new(4, 7),
            }
        );
    }

    #[test]
    fn test_retval_present() {
        let source = "add(A, B):\n  RETVAL = \"@A\"\nuse:\n  X = add(\"1\", \"2\")\n";
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_builtin_result_cannot_be_captured() {
        let err = check("t:\n  X = print(\"a\")\n").unwrap_err();
        assert!(matches!(err, SemanticError::MissingRetval { .. }));
    }

    #[test]
    fn test_unknown_task() {
        let err = check("t:\n  nope\n").unwrap_err();
        assert!(matches!(err, SemanticError::UnknownTask { ref name, .. } if name == "nope"));
    }

    #[test]
    fn test_call_is_case_insensitive() {
        assert!(check("Build:\n  pass\nall:\n  BuIlD, build\n").is_ok());
    }

    #[test]
    fn test_too_many_arguments() {
        let err = check("t:\n  print(\"a\", \"b\")\n").unwrap_err();
        assert_eq!(
            err,
            SemanticError::TooManyArguments {
                callee: "print".to_string(),
                given: 2,
                max: 1,
                location: Location::new(2, 3),
            }
        );
    }

    #[test]
    fn test_too_few_arguments() {
        let err = check("f(A, B, C=\"c\"):\n  pass\nt:\n  f(\"a\")\n").unwrap_err();
        assert!(matches!(
            err,
            SemanticError::TooFewArguments { given: 1, min: 2, .. }
        ));
        assert!(check("f(A, B, C=\"c\"):\n  pass\nt:\n  f(\"a\", \"b\")\n").is_ok());
    }

    #[test]
    fn test_task_checks_run_before_call_checks() {
        let err = check("get:\n  RETVAL = \"x\"\nt:\n  print(\"@X\")\n  X = get(\"extra\")\n").unwrap_err();
        assert!(matches!(err, SemanticError::UninitializedVariable { .. }));

        let err = check("get:\n  RETVAL = \"x\"\nt:\n  X = get(\"extra\")\n").unwrap_err();
        assert!(matches!(err, SemanticError::TooManyArguments { .. }));
    }

    #[test]
    fn test_task_calling_itself() {
        match check("a:\n  a\n") {
            Err(SemanticError::RecursiveTask {
                name,
                cycle,
                location,
            }) => {
                assert_eq!(name, "a");
                assert_eq!(cycle, "a -> a");
                assert_eq!(location, Location::new(2, 3));
            }
            other => panic!("expected a recursion error, got {:?}", other),
        }
    }

    #[test]
    fn test_mutual_recursion_through_assignment() {
        let err = check("a:\n  X = b()\nb:\n  a\n  RETVAL = \"b\"\n").unwrap_err();
        assert!(matches!(
            err,
            SemanticError::RecursiveTask { ref name, ref cycle, .. }
                if name == "a" && cycle == "a -> b -> a"
        ));
    }

    #[test]
    fn test_shared_callee_is_not_recursion() {
        assert!(check("leaf:\n  pass\nleft:\n  leaf\nright:\n  leaf\ntop:\n  left\n  right\n").is_ok());
    }
}
