//! Deciding how to put the user's terminal into a session, and doing it.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::error::ExecError;
use crate::executor::{Executor, LocalExecutor};
use crate::shell::quote_args;
use crate::tmux::exact_session;

/// Set by tmux inside every client it runs
pub const TMUX_ENV: &str = "TMUX";

/// Policy for remote attach
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AttachStrategy {
    /// New local window when inside tmux, otherwise take over the terminal
    #[default]
    Auto,
    /// Always take over the current terminal
    Replace,
    /// Open a new local tmux window running the remote attach
    NewWindow,
}

impl AttachStrategy {
    /// First match wins: per-call flag, per-host override, global default, `auto`
    pub fn resolve(
        explicit: Option<AttachStrategy>,
        per_host: Option<AttachStrategy>,
        global: Option<AttachStrategy>,
    ) -> AttachStrategy {
        explicit.or(per_host).or(global).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachStrategy::Auto => "auto",
            AttachStrategy::Replace => "replace",
            AttachStrategy::NewWindow => "new-window",
        }
    }
}

impl fmt::Display for AttachStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(AttachStrategy::Auto),
            "replace" => Ok(AttachStrategy::Replace),
            "new-window" => Ok(AttachStrategy::NewWindow),
            other => Err(format!(
                "unknown attach strategy '{other}' (expected auto, replace or new-window)"
            )),
        }
    }
}

/// Whether this process already runs inside a tmux client
pub fn inside_tmux() -> bool {
    std::env::var_os(TMUX_ENV).is_some_and(|v| !v.is_empty())
}

/// What attaching will actually do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachPlan {
    /// Point the current local client at the session
    SwitchClient,
    /// Hand the terminal to `attach-session` on the executor
    Direct,
    /// Open a local window running the given command line
    NewWindow { name: String, command: String },
}

/// Pick the attach path for `session` on `executor`
pub fn plan(
    executor: &dyn Executor,
    session: &str,
    strategy: AttachStrategy,
    in_tmux: bool,
) -> AttachPlan {
    let Some(remote) = executor.as_remote() else {
        return if in_tmux {
            AttachPlan::SwitchClient
        } else {
            AttachPlan::Direct
        };
    };

    match strategy {
        AttachStrategy::Replace => AttachPlan::Direct,
        AttachStrategy::NewWindow | AttachStrategy::Auto if in_tmux => AttachPlan::NewWindow {
            name: format!("{}:{}", remote.host_label(), session),
            command: quote_args(&remote.attach_argv(session)),
        },
        AttachStrategy::NewWindow | AttachStrategy::Auto => AttachPlan::Direct,
    }
}

/// Attach to `session` on `executor` using `strategy`
pub async fn attach(
    session: &str,
    executor: &dyn Executor,
    strategy: AttachStrategy,
) -> Result<(), ExecError> {
    let plan = plan(executor, session, strategy, inside_tmux());
    execute(&plan, session, executor, &LocalExecutor::new()).await
}

/// Carry out `plan`; new windows are opened through `local`
pub async fn execute(
    plan: &AttachPlan,
    session: &str,
    executor: &dyn Executor,
    local: &dyn Executor,
) -> Result<(), ExecError> {
    info!(host = %executor.host_label(), session = %session, ?plan, "attaching");
    match plan {
        AttachPlan::SwitchClient => {
            executor
                .run(&["switch-client".to_string(), "-t".to_string(), exact_session(session)])
                .await
        }
        AttachPlan::Direct => {
            executor
                .interactive(&[
                    "attach-session".to_string(),
                    "-t".to_string(),
                    exact_session(session),
                ])
                .await
        }
        AttachPlan::NewWindow { name, command } => {
            local
                .run(&[
                    "new-window".to_string(),
                    "-n".to_string(),
                    name.clone(),
                    command.clone(),
                ])
                .await
        }
    }
}
