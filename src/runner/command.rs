//! Command execution
//!
//! This module runs shell text as a child process. Standard output is read
//! line by line as it is produced (and echoed when the context asks for it);
//! standard error is drained on a helper thread and collected whole. If the
//! child dies early, whatever was read up to that point is still returned.

use crate::error::{CommandFailure, RuntimeError, RuntimeResult};
use crate::runner::{Context, ProcessResult};
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use std::thread;

/// Run `command` through the context's interpreter.
///
/// `stdin`, when given, is written to the child's standard input. A non-zero
/// exit becomes a [`CommandFailure`] carrying the full record.
pub fn execute_command(
    command: &str,
    stdin: Option<&str>,
    ctx: &mut Context,
) -> RuntimeResult<ProcessResult> {
    ctx.print_command(command);

    let process_error = |source: std::io::Error| RuntimeError::Process {
        command: command.to_string(),
        source,
    };

    let (program, interpreter_args) = match ctx.interpreter.split_first() {
        Some(split) => split,
        None => {
            return Err(process_error(std::io::Error::new(
                ErrorKind::InvalidInput,
                "no interpreter configured",
            ))
            .into())
        }
    };

    let mut child = StdCommand::new(program)
        .args(interpreter_args)
        .arg(command)
        .current_dir(&ctx.working_dir)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(process_error)?;

    let pid = child.id();

    // Feed stdin from its own thread so a child that writes before it
    // finishes reading cannot deadlock against us.
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_string();
            Some(thread::spawn(move || {
                // A child that exits without reading closes the pipe early
                let _ = pipe.write_all(input.as_bytes());
            }))
        }
        _ => None,
    };

    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let mut stdout = Vec::new();
    if let Some(pipe) = child.stdout.take() {
        stream_lines(pipe, &mut stdout, ctx);
    }

    let status = child.wait().map_err(process_error)?;

    if let Some(writer) = writer {
        let _ = writer.join();
    }
    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    let result = ProcessResult {
        command: command.to_string(),
        stdin: stdin.map(String::from),
        stdout: String::from_utf8_lossy(&stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        exit_code: exit_code(status),
        pid,
    };

    if !result.success() {
        ctx.print_debug(&format!(
            "Command exited with {} (pid {})",
            result.exit_code, result.pid
        ));
        return Err(CommandFailure::new(result).into());
    }

    Ok(result)
}

/// Copy lines from `pipe` into `captured`, echoing each one as it arrives.
/// Stops quietly on a read error, keeping what was read so far.
fn stream_lines<R: Read>(pipe: R, captured: &mut Vec<u8>, ctx: &mut Context) {
    let mut reader = BufReader::new(pipe);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                captured.extend_from_slice(&line);
                if ctx.echoes_output() {
                    let text = String::from_utf8_lossy(&line);
                    if let Err(e) = ctx.write_line(text.trim_end_matches(['\n', '\r'])) {
                        ctx.print_error(&format!("Cannot echo command output: {}", e));
                        ctx.stream_output = false;
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                ctx.print_debug(&format!("Stopped reading command output: {}", e));
                break;
            }
        }
    }
}

/// Exit code of a finished child; signal deaths map to 128 + signal
fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> i32 {
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::BuggeryError;
    use crate::runner::Verbosity;

    fn quiet() -> Context {
        Context::new().with_verbosity(Verbosity::Silent)
    }

    #[test]
    fn test_execute_simple_command() {
        let mut ctx = quiet();
        let result = execute_command("echo test", None, &mut ctx).unwrap();
        assert_eq!(result.stdout, "test");
        assert_eq!(result.exit_code, 0);
        assert!(result.pid > 0);
    }

    #[test]
    fn test_output_is_trimmed() {
        let mut ctx = quiet();
        let result = execute_command("printf '  a\\nb  \\n\\n'; echo ' err ' >&2", None, &mut ctx).unwrap();
        assert_eq!(result.stdout, "a\nb");
        assert_eq!(result.stderr, "err");
    }

    #[test]
    fn test_stdin_is_fed() {
        let mut ctx = quiet();
        let result = execute_command("tr a-z A-Z", Some("shout"), &mut ctx).unwrap();
        assert_eq!(result.stdout, "SHOUT");
        assert_eq!(result.stdin.as_deref(), Some("shout"));
    }

    #[test]
    fn test_execute_failing_command() {
        let mut ctx = quiet();
        let err = execute_command("echo partial; echo bad >&2; exit 3", None, &mut ctx).unwrap_err();
        match err {
            BuggeryError::Command(failure) => {
                assert_eq!(failure.exit_code(), 3);
                assert_eq!(failure.result.stdout, "partial");
                assert_eq!(failure.result.stderr, "bad");
            }
            other => panic!("expected command failure, got {:?}", other),
        }
    }

    #[test]
    fn test_killed_command_keeps_partial_output() {
        let mut ctx = quiet();
        let err = execute_command("echo before; kill -9 $$; echo after", None, &mut ctx).unwrap_err();
        let failure = err.command_failure().unwrap();
        assert_eq!(failure.exit_code(), 128 + 9);
        assert_eq!(failure.result.stdout, "before");
    }

    #[test]
    fn test_custom_interpreter() {
        let mut ctx = quiet().with_interpreter(vec!["bash".to_string(), "-c".to_string()]);
        let result = execute_command("echo ${BASH_VERSION:+bash}", None, &mut ctx).unwrap();
        assert_eq!(result.stdout, "bash");
    }

    #[test]
    fn test_missing_interpreter() {
        let mut ctx = quiet().with_interpreter(vec!["/nonexistent/shell".to_string()]);
        let err = execute_command("true", None, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            BuggeryError::Runtime(RuntimeError::Process { .. })
        ));
    }

    #[test]
    fn test_runs_in_working_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut ctx = quiet().with_working_dir(dir.path().to_path_buf());
        execute_command("echo x > marker.txt", None, &mut ctx).unwrap();
        assert!(dir.path().join("marker.txt").exists());
    }
}
