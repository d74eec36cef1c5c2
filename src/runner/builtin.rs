//! Native tasks that every program can call

use crate::error::{RuntimeError, RuntimeResult};
use crate::lang::Param;
use crate::runner::{Context, Value};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};

/// Signature of a native task body. Arguments arrive already bound, one per
/// declared parameter.
pub type NativeFn = fn(&mut Context, &[Value]) -> io::Result<()>;

/// A task implemented in Rust
#[derive(Clone)]
pub struct BuiltinTask {
    pub name: &'static str,
    pub params: Vec<Param>,
    func: NativeFn,
}

impl BuiltinTask {
    fn new(name: &'static str, params: &[&str], func: NativeFn) -> Self {
        BuiltinTask {
            name,
            params: params.iter().map(|p| Param::required(p)).collect(),
            func,
        }
    }

    pub fn invoke(&self, ctx: &mut Context, args: &[Value]) -> RuntimeResult<()> {
        (self.func)(ctx, args).map_err(|source| {
            RuntimeError::Builtin {
                task: self.name.to_string(),
                source,
            }
            .into()
        })
    }
}

impl fmt::Debug for BuiltinTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinTask")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// The builtin library
pub fn builtins() -> Vec<BuiltinTask> {
    vec![
        BuiltinTask::new("print", &["TEXT"], print),
        BuiltinTask::new("save", &["PATH", "TEXT"], save),
        BuiltinTask::new("append", &["PATH", "TEXT"], append),
        BuiltinTask::new("pass", &[], pass),
    ]
}

fn arg(args: &[Value], index: usize) -> &str {
    args.get(index).map(Value::as_string).unwrap_or_default()
}

fn print(ctx: &mut Context, args: &[Value]) -> io::Result<()> {
    ctx.write_line(arg(args, 0))
}

fn save(ctx: &mut Context, args: &[Value]) -> io::Result<()> {
    fs::write(ctx.working_dir.join(arg(args, 0)), arg(args, 1))
}

fn append(ctx: &mut Context, args: &[Value]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(ctx.working_dir.join(arg(args, 0)))?;
    file.write_all(arg(args, 1).as_bytes())
}

fn pass(_ctx: &mut Context, _args: &[Value]) -> io::Result<()> {
    Ok(())
}
