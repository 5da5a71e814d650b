//! Subprocess helpers shared by the local and remote executors.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ExecError;

/// How a spawned command should be run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Wait for completion however long it takes
    Unbounded,
    /// Fail with [`ExecError::Timeout`] once this elapses
    Deadline(Duration),
}

/// Spawn `program args…` with piped output and wait for it.
///
/// Non-zero exits become [`ExecError::Failed`] carrying trimmed stderr.
pub async fn capture(
    host: &str,
    op: &str,
    program: &str,
    args: &[String],
    dir: Option<&Path>,
    limit: Limit,
) -> Result<Vec<u8>, ExecError> {
    let output = spawn_output(host, op, program, args, dir, limit).await?;
    if !output.status.success() {
        return Err(failure(host, op, &output));
    }
    Ok(output.stdout)
}

async fn spawn_output(
    host: &str,
    op: &str,
    program: &str,
    args: &[String],
    dir: Option<&Path>,
    limit: Limit,
) -> Result<Output, ExecError> {
    debug!(host = %host, program = %program, ?args, "spawning");

    let mut cmd = Command::new(program);
    // A timed-out future is dropped; take the child down with it.
    cmd.kill_on_drop(true)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let spawn_err = |source| ExecError::Spawn {
        host: host.to_string(),
        program: program.to_string(),
        source,
    };

    match limit {
        Limit::Unbounded => cmd.output().await.map_err(spawn_err),
        Limit::Deadline(after) => match timeout(after, cmd.output()).await {
            Ok(result) => result.map_err(spawn_err),
            Err(_) => Err(ExecError::Timeout {
                host: host.to_string(),
                op: op.to_string(),
                after,
            }),
        },
    }
}

/// Run with the caller's terminal wired through; returns once the program exits.
pub async fn interactive(
    host: &str,
    op: &str,
    program: &str,
    args: &[String],
) -> Result<(), ExecError> {
    debug!(host = %host, program = %program, ?args, "handing over terminal");

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|source| ExecError::Spawn {
            host: host.to_string(),
            program: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(ExecError::Failed {
            host: host.to_string(),
            op: op.to_string(),
            status: status.to_string(),
            stderr: String::new(),
        });
    }
    Ok(())
}

fn failure(host: &str, op: &str, output: &Output) -> ExecError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stderr = if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    };
    ExecError::Failed {
        host: host.to_string(),
        op: op.to_string(),
        status: output.status.to_string(),
        stderr,
    }
}

/// Short operation name for error messages: the tmux subcommand or the program
pub fn op_name(program: &str, args: &[String]) -> String {
    match args.first() {
        Some(first) if program == "tmux" => first.clone(),
        _ => program.to_string(),
    }
}

/// Whether `program` resolves to an executable on `PATH`
pub fn on_path(program: &str) -> bool {
    std::env::var_os("PATH").is_some_and(|paths| in_paths(&paths, program))
}

fn in_paths(paths: &OsStr, program: &str) -> bool {
    std::env::split_paths(paths).any(|dir| is_executable(&dir.join(program)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Owned argument vector from borrowed pieces
#[cfg(test)]
pub fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
