use std::path::Path;
use std::process::{Command as ProcessCommand, ExitStatus};

use log::debug;
use thiserror::Error;

use crate::commands::node::Invocation;
use crate::env_file::split_env_line;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Command [{0}] has an empty entrypoint")]
    EmptyEntrypoint(String),

    #[error("Failed to start command [{name}]: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// The full argv for an invocation, with a literal `--` dropped from `args`.
#[must_use]
pub fn command_line(invocation: &Invocation, args: &[String]) -> Vec<String> {
    invocation
        .argv
        .iter()
        .chain(args.iter().filter(|arg| *arg != "--"))
        .cloned()
        .collect()
}

/// Runs a resolved command with `args` appended, inheriting stdio.
///
/// The child sees the parent environment plus the invocation's `KEY=VALUE`
/// lines, applied in order so later lines win.
///
/// # Errors
///
/// Returns `ExecError::EmptyEntrypoint` if there is nothing to launch, or
/// `ExecError::Spawn` if the process could not be started.
pub fn run(
    name: &str,
    invocation: &Invocation,
    args: &[String],
    cwd: &Path,
) -> Result<ExitStatus, ExecError> {
    let argv = command_line(invocation, args);
    let (program, program_args) = argv
        .split_first()
        .ok_or_else(|| ExecError::EmptyEntrypoint(name.to_string()))?;

    debug!(
        "===> {name} from {}: {}",
        invocation.source.display(),
        argv.join(" ")
    );

    let mut command = ProcessCommand::new(program);
    command.args(program_args).current_dir(cwd);
    for line in &invocation.env {
        if let Some((key, value)) = split_env_line(line) {
            command.env(key, value);
        }
    }
    command.status().map_err(|source| ExecError::Spawn {
        name: name.to_string(),
        source,
    })
}

/// Maps a child's exit status onto our own; a signal-killed child counts as 1.
#[must_use]
pub fn exit_code(status: ExitStatus) -> u8 {
    status
        .code()
        .map_or(1, |code| u8::try_from(code).unwrap_or(1))
}
