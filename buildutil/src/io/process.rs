//! Helpers for running child processes.

use std::io::{self, Read};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{debug, error, instrument};

use crate::logf;
use crate::logging::Logger;

/// What happens to a child's stdout and stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Merge stdout and stderr into one captured, returned string.
    #[default]
    Capture,
    /// Let the child write straight to this process's streams.
    Inherit,
}

/// Render a command as a shell-like line (`program arg1 arg2`).
pub fn describe_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|arg| arg.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run `cmd` to completion.
///
/// With [`OutputMode::Capture`] the combined output is printed and returned;
/// with [`OutputMode::Inherit`] the result is an empty string. A spawn failure
/// or non-zero exit is printed along with any captured output and returned as
/// an error.
#[instrument(skip_all, fields(command = %describe_command(&cmd), ?mode))]
pub fn run_cmd(log: &Logger, cmd: Command, mode: OutputMode) -> Result<String> {
    let line = describe_command(&cmd);
    logf!(log, "> {line}\n");
    match mode {
        OutputMode::Capture => run_captured(log, cmd, &line),
        OutputMode::Inherit => run_inherited(log, cmd, &line),
    }
}

fn run_captured(log: &Logger, mut cmd: Command, line: &str) -> Result<String> {
    let (mut reader, writer) = io::pipe().context("create output pipe")?;
    let writer_err = writer.try_clone().context("clone output pipe")?;
    cmd.stdin(Stdio::null()).stdout(writer).stderr(writer_err);

    debug!("spawning child process");
    let spawned = cmd.spawn();
    // `cmd` owns the pipe's write ends; the reader sees EOF only once they are gone.
    drop(cmd);
    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            error!(err = %err, "failed to spawn command");
            logf!(log, "cmd '{line}' failed with '{err}'\n");
            return Err(err).with_context(|| format!("spawn {line}"));
        }
    };

    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .with_context(|| format!("read output of {line}"))?;
    let status = child
        .wait()
        .with_context(|| format!("wait for {line}"))?;
    let out = String::from_utf8_lossy(&raw).into_owned();
    debug!(exit_code = ?status.code(), output_bytes = raw.len(), "command finished");

    if status.success() {
        if !out.is_empty() {
            logf!(log, "Output:\n{out}\n");
        }
        return Ok(out);
    }
    logf!(log, "cmd '{line}' failed with '{status}'. Output:\n{out}\n");
    bail!("{line} failed with {status}")
}

fn run_inherited(log: &Logger, mut cmd: Command, line: &str) -> Result<String> {
    cmd.stdin(Stdio::null());
    let status = match cmd.status() {
        Ok(status) => status,
        Err(err) => {
            error!(err = %err, "failed to spawn command");
            logf!(log, "cmd '{line}' failed with '{err}'\n");
            return Err(err).with_context(|| format!("spawn {line}"));
        }
    };
    debug!(exit_code = ?status.code(), "command finished");
    if status.success() {
        return Ok(String::new());
    }
    logf!(log, "cmd '{line}' failed with '{status}'\n");
    bail!("{line} failed with {status}")
}

/// Start `cmd` and return without waiting for it to exit.
#[instrument(skip_all, fields(command = %describe_command(&cmd)))]
pub fn spawn_detached(mut cmd: Command) -> Result<()> {
    let line = describe_command(&cmd);
    let child = cmd.spawn().with_context(|| format!("start {line}"))?;
    debug!(pid = child.id(), "started detached process");
    Ok(())
}
