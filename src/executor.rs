//! Running built commands as child processes.
//!
//! Children inherit the terminal, so SSH password prompts, host-key questions
//! and streaming logs behave exactly as if `ssh` had been typed by hand. The
//! calling thread blocks until the child exits. Ctrl-C is delivered to the
//! child by the terminal; ops-launcher does not install its own handler.
//!
//! Before anything runs, [`launch`] prints a preview of the command line and,
//! for destructive actions, asks for an explicit yes (default no).

use crate::action::BuiltCommand;
use crate::error::{OpsError, Result};
use dialoguer::Confirm;
use dialoguer::console::style;
use dialoguer::theme::ColorfulTheme;
use std::io::ErrorKind;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info};

/// Source of yes/no answers for destructive actions.
pub trait Prompter {
    /// Ask a yes/no question. Must default to "no".
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Asks on the terminal with dialoguer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        Ok(Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(question)
            .default(false)
            .interact()?)
    }
}

/// What happened to a launched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The child ran and exited with this code.
    Exited(i32),
    /// The user declined a destructive action; nothing ran.
    Cancelled,
}

impl Outcome {
    /// Process exit code to report for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Exited(code) => code,
            Outcome::Cancelled => 0,
        }
    }
}

/// Print the command line about to run, dimmed.
pub fn print_preview(cmd: &BuiltCommand) {
    println!("\n  {}\n", style(format!("$ {}", cmd.preview())).dim());
}

/// Preview, confirm if destructive, then run.
///
/// `target` names the host in the confirmation question.
pub fn launch(cmd: &BuiltCommand, target: &str, prompter: &dyn Prompter) -> Result<Outcome> {
    print_preview(cmd);

    if cmd.destructive {
        let question = format!("Run '{}' on {}?", cmd.action, target);
        if !prompter.confirm(&question)? {
            info!(action = %cmd.action, host = target, "cancelled by user");
            return Ok(Outcome::Cancelled);
        }
    }

    run(&cmd.argv).map(Outcome::Exited)
}

/// Run `argv` with inherited stdio and return its exit code.
///
/// # Errors
///
/// - [`OpsError::CommandNotFound`] if the program is not installed
/// - [`OpsError::Io`] if spawning fails for another reason
pub fn run(argv: &[String]) -> Result<i32> {
    let (program, args) = split_argv(argv)?;
    debug!(program, ?args, "spawning");

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| spawn_error(program, e))?;

    let code = exit_code_of(status);
    debug!(program, code, "child exited");
    Ok(code)
}

/// Run `argv` silently and capture its stdout.
///
/// Returns the exit code and trimmed stdout. Used for discovery queries
/// whose output feeds a menu instead of the terminal.
pub fn capture(argv: &[String]) -> Result<(i32, String)> {
    let (program, args) = split_argv(argv)?;
    debug!(program, ?args, "capturing");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(program, e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((exit_code_of(output.status), stdout))
}

fn split_argv(argv: &[String]) -> Result<(&str, &[String])> {
    match argv.split_first() {
        Some((program, args)) => Ok((program.as_str(), args)),
        None => Err(OpsError::CommandNotFound(String::new())),
    }
}

fn spawn_error(program: &str, err: std::io::Error) -> OpsError {
    if err.kind() == ErrorKind::NotFound {
        OpsError::CommandNotFound(program.to_string())
    } else {
        OpsError::Io(err)
    }
}

/// The child's exit code, or `128 + signal` if it was killed by a signal.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    crate::error::exit_code::GENERAL
}
