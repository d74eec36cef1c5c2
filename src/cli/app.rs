//! Main CLI application

use crate::config::{find_source_file, load_env_file, load_settings};
use crate::error::{BuggeryError, RuntimeError};
use crate::lang::{is_startup, load_program, Program, STARTUP};
use crate::runner::{Context, Engine, Value, Verbosity};
use anyhow::Context as _;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::{generate, Shell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A loaded task file, ready to run
pub struct App {
    /// Parsed and checked program
    program: Program,
    /// Where the program was read from
    source_path: PathBuf,
}

impl App {
    /// Read, parse and check a task file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let program = load_program(&source)?;

        Ok(App {
            program,
            source_path: path.to_path_buf(),
        })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Directory settings and the dotenv file are resolved against
    fn source_dir(&self) -> &Path {
        match self.source_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Print user tasks with their parameters
    pub fn list_tasks(&self) {
        println!("Tasks in {}:", self.source_path.display());
        for task in self.program.tasks().filter(|t| !t.is_builtin()) {
            println!("  {}", task.signature());
        }
    }

    /// Run `task_name` with raw string arguments. `startup` runs first unless
    /// it is the task requested; nothing runs if the task does not exist.
    pub fn run_task(
        &self,
        task_name: &str,
        args: Vec<String>,
        verbosity: Verbosity,
    ) -> anyhow::Result<Option<Value>> {
        if !self.program.contains(task_name) {
            return Err(BuggeryError::from(RuntimeError::UnknownTask {
                name: task_name.to_string(),
                location: None,
            })
            .into());
        }

        let settings = load_settings(self.source_dir())?;
        let ctx = Context::new()
            .with_settings(&settings)
            .with_verbosity(verbosity);

        if let Some(env_path) = load_env_file(&settings, self.source_dir())? {
            ctx.print_debug(&format!("Loaded environment from {}", env_path.display()));
        }

        let mut engine = Engine::with_context(&self.program, ctx);

        if self.program.startup().is_some() && !is_startup(task_name) {
            engine.context().print_info("Running startup");
            engine.run_values(STARTUP, Vec::new())?;
        }

        let args = args.into_iter().map(Value::from).collect();
        let result = engine.run_values(task_name, args)?;
        if let Some(value) = &result {
            engine
                .context()
                .print_debug(&format!("{} returned: {}", task_name, value));
        }
        Ok(result)
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("buggery")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run tasks from a Buggeryfile")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the task file (default: nearest Buggeryfile)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print task output and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no diagnostics")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .value_parser(value_parser!(Shell))
                .help("Print a shell completion script and exit"),
        )
        .arg(
            Arg::new("task")
                .value_name("TASK")
                .help("Task to run; lists tasks when omitted"),
        )
        .arg(
            Arg::new("args")
                .value_name("ARGS")
                .help("Arguments passed to the task, in order")
                .num_args(1..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Run the CLI application with the process arguments
pub fn run() -> anyhow::Result<()> {
    run_with(build_command().get_matches())
}

fn run_with(matches: ArgMatches) -> anyhow::Result<()> {
    if let Some(shell) = matches.get_one::<Shell>("completions") {
        generate(*shell, &mut build_command(), "buggery", &mut io::stdout());
        return Ok(());
    }

    let path = match matches.get_one::<PathBuf>("file") {
        Some(path) => path.clone(),
        None => find_source_file()?,
    };
    let app = App::load(&path)?;

    let Some(task_name) = matches.get_one::<String>("task") else {
        app.list_tasks();
        return Ok(());
    };

    let args: Vec<String> = matches
        .get_many::<String>("args")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    app.run_task(task_name, args, get_verbosity(&matches))?;
    Ok(())
}

/// Print an error the way the binary reports it and return the exit code.
///
/// A failed command exits with the command's own status, after echoing what
/// it wrote to stderr.
pub fn report(error: &anyhow::Error) -> i32 {
    let buggery_error = error.downcast_ref::<BuggeryError>();

    // Library errors already name their cause
    match buggery_error {
        Some(e) => eprintln!("Error: {}", e),
        None => eprintln!("Error: {:#}", error),
    }

    match buggery_error.and_then(BuggeryError::command_failure) {
        Some(failure) => {
            if !failure.result.stderr.is_empty() {
                eprintln!("{}", failure.result.stderr);
            }
            failure.exit_code()
        }
        None => 1,
    }
}
