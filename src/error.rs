use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;

/// tmux (or the transport in front of it) saying there is nothing to talk to
static RE_NO_SERVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(no server running|failed to connect to server|error connecting to)")
        .unwrap()
});

/// Errors produced by an [`Executor`](crate::executor::Executor)
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be started at all
    #[error("[{}] failed to start {program}: {source}", label(.host))]
    Spawn {
        host: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited non-zero
    #[error("[{}] {op} failed ({status}): {stderr}", label(.host))]
    Failed {
        host: String,
        op: String,
        status: String,
        stderr: String,
    },

    /// The program was still running when the per-command deadline passed
    #[error("[{}] {op} timed out after {}s", label(.host), .after.as_secs())]
    Timeout {
        host: String,
        op: String,
        after: Duration,
    },

    /// Establishing the pooled connection failed; cached for the executor's lifetime
    #[error("[{}] connection setup failed: {reason}", label(.host))]
    Connect { host: String, reason: String },

    /// The task running the query died before reporting
    #[error("[{}] query aborted: {reason}", label(.host))]
    Aborted { host: String, reason: String },
}

impl ExecError {
    /// Whether this failure means "host reachable, tmux server not running".
    ///
    /// Best-effort: matches the messages tmux prints in the C locale.
    pub fn is_no_server(&self) -> bool {
        match self {
            ExecError::Failed { stderr, .. } => is_no_server_message(stderr),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::Timeout { .. })
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, ExecError::Connect { .. })
    }
}

pub fn is_no_server_message(text: &str) -> bool {
    RE_NO_SERVER.is_match(text)
}

fn label(host: &str) -> &str {
    if host.is_empty() {
        "local"
    } else {
        host
    }
}
