//! Task execution engine
//!
//! The engine walks a checked [`Program`]. Calls are structurally recursive
//! and mirrored one-to-one by the frame stack: a frame is pushed when a task
//! is entered and popped when it finishes, whether it succeeded or not.
//! Entering a task that is already on the stack is an error, so programs that
//! skipped checking cannot recurse without bound.

use crate::error::{BuggeryError, InterpolationError, RuntimeError, RuntimeResult};
use crate::lang::ast::{Command, Expr, Location, Subtask, RETVAL};
use crate::lang::{Program, Task};
use crate::runner::interpolate::interpolate;
use crate::runner::{execute_command, Context, Frames, ProcessResult, Scope, Value};

/// Runs tasks from one program, keeping the global scope between runs
pub struct Engine<'p> {
    program: &'p Program,
    ctx: Context,
    frames: Frames,
}

impl<'p> Engine<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self::with_context(program, Context::new())
    }

    pub fn with_context(program: &'p Program, ctx: Context) -> Self {
        Engine {
            program,
            ctx,
            frames: Frames::new(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// A snapshot of the variables `startup` has defined so far
    pub fn globals(&self) -> Scope {
        self.frames.globals()
    }

    /// Number of tasks currently executing
    pub fn call_depth(&self) -> usize {
        self.frames.depth()
    }

    /// Run `name`, evaluating `args` in the current scope first.
    ///
    /// Returns the task's `RETVAL`, or `None` if it never assigned one.
    pub fn run(&mut self, name: &str, args: &[Expr]) -> RuntimeResult<Option<Value>> {
        self.call(name, args, None)
    }

    /// Run `name` with arguments that are already values
    pub fn run_values(&mut self, name: &str, args: Vec<Value>) -> RuntimeResult<Option<Value>> {
        let task = self.resolve(name, None)?;
        self.invoke(task, args, None)
    }

    fn resolve(&self, name: &str, location: Option<Location>) -> RuntimeResult<&'p Task> {
        let program: &'p Program = self.program;
        program.get(name).ok_or_else(|| {
            RuntimeError::UnknownTask {
                name: name.to_string(),
                location,
            }
            .into()
        })
    }

    fn call(
        &mut self,
        name: &str,
        args: &[Expr],
        location: Option<Location>,
    ) -> RuntimeResult<Option<Value>> {
        let task = self.resolve(name, location)?;

        let mut values = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let value = self.evaluate(arg)?.ok_or_else(|| {
                let name = task
                    .params()
                    .get(index)
                    .map_or_else(|| task.name().to_string(), |p| p.name.clone());
                null_value(name, arg.location())
            })?;
            values.push(value);
        }

        self.invoke(task, values, location)
    }

    fn invoke(
        &mut self,
        task: &'p Task,
        args: Vec<Value>,
        location: Option<Location>,
    ) -> RuntimeResult<Option<Value>> {
        if args.len() > task.param_count() {
            return Err(RuntimeError::TooManyArguments {
                task: task.name().to_string(),
                given: args.len(),
                max: task.param_count(),
                location,
            }
            .into());
        }

        if self.ctx.is_task_in_stack(task.name()) {
            return Err(RuntimeError::RecursiveTask {
                task: task.name().to_string(),
                chain: format!("{} > {}", self.ctx.call_chain(), task.name()),
                location,
            }
            .into());
        }

        self.ctx.enter_task(task.name());
        self.frames.enter(task.name());

        let result = self.execute_task(task, args, location);

        self.frames.leave();
        self.ctx.leave_task(result.is_ok());
        result
    }

    /// Body of a call, run with the callee's frame on top
    fn execute_task(
        &mut self,
        task: &'p Task,
        args: Vec<Value>,
        location: Option<Location>,
    ) -> RuntimeResult<Option<Value>> {
        let mut args = args.into_iter();
        let mut bound = Vec::with_capacity(task.param_count());

        for param in task.params() {
            let value = match (args.next(), &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self
                    .evaluate(default)?
                    .ok_or_else(|| null_value(param.name.clone(), param.location))?,
                (None, None) => {
                    return Err(RuntimeError::TooFewArguments {
                        task: task.name().to_string(),
                        param: param.name.clone(),
                        location,
                    }
                    .into())
                }
            };
            self.frames.assign(&param.name, value.clone());
            bound.push(value);
        }

        match task {
            Task::Builtin(builtin) => {
                builtin.invoke(&mut self.ctx, &bound)?;
                Ok(None)
            }
            Task::Defined(defined) => {
                for subtask in &defined.subtasks {
                    self.execute(subtask)?;
                }
                Ok(self.frames.lookup(RETVAL))
            }
        }
    }

    fn execute(&mut self, subtask: &Subtask) -> RuntimeResult<()> {
        match subtask {
            Subtask::Assignment(assignment) => {
                let value = self.evaluate(&assignment.value)?.ok_or_else(|| {
                    null_value(assignment.target.clone(), assignment.location)
                })?;
                self.frames.assign(&assignment.target, value);
            }
            Subtask::Command(command) => {
                self.run_command(command)?;
            }
            Subtask::Call(call) => {
                self.call(&call.target, &call.args, Some(call.location))?;
            }
        }
        Ok(())
    }

    /// Evaluate an expression in the current scope. Calls to tasks without a
    /// `RETVAL` evaluate to `None`.
    fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Option<Value>> {
        match expr {
            Expr::String(literal) => {
                let text = self.interpolate(&literal.text, literal.location)?;
                Ok(Some(Value::String(text)))
            }
            Expr::Variable(variable) => self
                .lookup(&variable.name, variable.location)
                .map(Some),
            Expr::Call(call) => self.call(&call.target, &call.args, Some(call.location)),
            Expr::Command(command) => Ok(Some(Value::Process(self.run_command(command)?))),
        }
    }

    fn run_command(&mut self, command: &Command) -> RuntimeResult<ProcessResult> {
        let text = self.interpolate(&command.text, command.location)?;
        let stdin = match &command.stdin {
            Some(name) => Some(self.lookup(name, command.location)?.as_string().to_string()),
            None => None,
        };
        execute_command(&text, stdin.as_deref(), &mut self.ctx)
    }

    fn lookup(&self, name: &str, location: Location) -> RuntimeResult<Value> {
        self.frames
            .lookup(name)
            .ok_or_else(|| unknown_variable(name.to_string(), location))
    }

    fn interpolate(&self, text: &str, location: Location) -> RuntimeResult<String> {
        interpolate(text, |name| {
            self.frames.lookup(name).map(|v| v.as_string().to_string())
        })
        .map_err(|InterpolationError::UndefinedVariable(name)| unknown_variable(name, location))
    }
}

fn unknown_variable(name: String, location: Location) -> BuggeryError {
    RuntimeError::UnknownVariable {
        name,
        location: Some(location),
    }
    .into()
}

fn null_value(name: String, location: Location) -> BuggeryError {
    RuntimeError::NullValue {
        name,
        location: Some(location),
    }
    .into()
}

/// Run one task of `program` in a fresh engine
pub fn run(program: &Program, task_name: &str, args: Vec<Value>) -> RuntimeResult<Option<Value>> {
    Engine::new(program).run_values(task_name, args)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::lang::ast::Call;
    use crate::lang::parse_program;
    use crate::runner::Verbosity;
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Buffer(Rc<RefCell<Vec<u8>>>);

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn engine(program: &Program) -> (Engine<'_>, Buffer) {
        let buffer = Buffer::default();
        let ctx = Context::new()
            .with_verbosity(Verbosity::Quiet)
            .with_output(Box::new(buffer.clone()));
        (Engine::with_context(program, ctx), buffer)
    }

    #[test]
    fn test_retval_is_returned() {
        let program = parse_program("add(A, B):\n  RETVAL = A\n").unwrap();
        let (mut engine, _) = engine(&program);
        let value = engine
            .run("add", &[Expr::string("1"), Expr::string("2")])
            .unwrap();
        assert_eq!(value, Some(Value::from("1")));
        assert_eq!(engine.call_depth(), 0);
    }

    #[test]
    fn test_no_retval_returns_none() {
        let program = parse_program("t:\n  X = \"x\"\n").unwrap();
        let (mut engine, _) = engine(&program);
        assert_eq!(engine.run("t", &[]).unwrap(), None);
    }

    #[test]
    fn test_command_value_is_its_stdout() {
        let program = parse_program("t:\n  X = $ echo hi\n  print(\"got @X\")\n").unwrap();
        let (mut engine, out) = engine(&program);
        engine.run("t", &[]).unwrap();
        assert_eq!(out.text(), "got hi\n");
    }

    #[test]
    fn test_default_uses_earlier_param() {
        let program = parse_program("t(A, B=\"@A!\"):\n  print(B)\n").unwrap();
        let (mut engine, out) = engine(&program);
        engine.run_values("t", vec![Value::from("hey")]).unwrap();
        assert_eq!(out.text(), "hey!\n");
    }

    #[test]
    fn test_too_few_arguments_at_runtime() {
        let program = parse_program("t(A):\n  print(A)\n").unwrap();
        let (mut engine, _) = engine(&program);
        let err = engine.run_values("t", vec![]).unwrap_err();
        assert!(matches!(
            err,
            BuggeryError::Runtime(RuntimeError::TooFewArguments { ref param, .. }) if param == "A"
        ));
        assert_eq!(engine.call_depth(), 0);
    }

    #[test]
    fn test_too_many_arguments_at_runtime() {
        let program = parse_program("t:\n  pass\n").unwrap();
        let (mut engine, _) = engine(&program);
        let err = engine.run_values("t", vec![Value::from("x")]).unwrap_err();
        assert!(matches!(
            err,
            BuggeryError::Runtime(RuntimeError::TooManyArguments { given: 1, max: 0, .. })
        ));
    }

    #[test]
    fn test_null_argument_is_rejected() {
        let program = parse_program("nothing:\n  pass\n").unwrap();
        let (mut engine, _) = engine(&program);
        let nothing = Expr::Call(Call {
            target: "nothing".to_string(),
            args: vec![],
            location: Location::new(1, 1),
        });
        let err = engine.run("print", &[nothing]).unwrap_err();
        assert!(matches!(
            err,
            BuggeryError::Runtime(RuntimeError::NullValue { ref name, .. }) if name == "TEXT"
        ));
    }

    #[test]
    fn test_stdin_from_variable() {
        let program = parse_program("t:\n  X = \"abc\"\n  Y = $ (X) tr a-z A-Z\n  print(Y)\n").unwrap();
        let (mut engine, out) = engine(&program);
        engine.run("t", &[]).unwrap();
        assert_eq!(out.text(), "ABC\n");
    }

    #[test]
    fn test_failed_command_pops_frames() {
        let program = parse_program("inner:\n  $ exit 4\nouter:\n  inner\n").unwrap();
        let (mut engine, _) = engine(&program);
        let err = engine.run("outer", &[]).unwrap_err();
        assert_eq!(err.command_failure().unwrap().exit_code(), 4);
        assert_eq!(engine.call_depth(), 0);
        assert!(engine.context().task_stack.is_empty());
    }

    #[test]
    fn test_unchecked_self_call_is_stopped() {
        let program = parse_program("a:\n  a\n").unwrap();
        let (mut engine, _) = engine(&program);
        let err = engine.run("a", &[]).unwrap_err();
        match err {
            BuggeryError::Runtime(RuntimeError::RecursiveTask {
                task,
                chain,
                location,
            }) => {
                assert_eq!(task, "a");
                assert_eq!(chain, "a > a");
                assert_eq!(location, Some(Location::new(2, 3)));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(engine.call_depth(), 0);
        assert!(engine.context().task_stack.is_empty());
    }

    #[test]
    fn test_unchecked_mutual_calls_are_stopped() {
        let program = parse_program("a:\n  b\nb:\n  a\n").unwrap();
        let (mut engine, _) = engine(&program);
        let err = engine.run("a", &[]).unwrap_err();
        assert!(matches!(
            err,
            BuggeryError::Runtime(RuntimeError::RecursiveTask { ref chain, .. }) if chain == "a > b > a"
        ));
        assert_eq!(engine.call_depth(), 0);
    }

    #[test]
    fn test_free_run() {
        let program = parse_program("t:\n  RETVAL = \"done\"\n").unwrap();
        assert_eq!(run(&program, "T", vec![]).unwrap(), Some(Value::from("done")));
    }
}
