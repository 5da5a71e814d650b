//! Uniform command execution against the local machine or an SSH host.
//!
//! Everything above this module (tree fetching, attach, send-keys) talks to an
//! [`Executor`] and never needs to know where tmux actually runs.

mod local;
pub mod process;
mod remote;

pub use local::LocalExecutor;
pub use remote::{AttachMethod, RemoteExecutor, RemoteTarget};

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, ConfigError, HostConfig};
use crate::error::ExecError;
use crate::shutdown::Shutdown;

/// The multiplexer control program
pub const TMUX: &str = "tmux";

/// Capability set shared by the local and remote backends
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a tmux command, discarding its output
    async fn run(&self, args: &[String]) -> Result<(), ExecError>;

    /// Run a tmux command and return its raw stdout
    async fn output(&self, args: &[String]) -> Result<Vec<u8>, ExecError>;

    /// Like [`Executor::run`] pinned to a working directory
    async fn run_with_dir(&self, dir: &Path, args: &[String]) -> Result<(), ExecError>;

    /// Run a tmux command with the user's terminal wired through
    async fn interactive(&self, args: &[String]) -> Result<(), ExecError>;

    /// Run an arbitrary program (not tmux) and return its stdout
    async fn run_generic(&self, program: &str, args: &[String]) -> Result<Vec<u8>, ExecError>;

    /// Display label: empty for the local machine
    fn host_label(&self) -> &str;

    /// Remote-only view of this executor
    fn as_remote(&self) -> Option<&RemoteExecutor> {
        None
    }

    fn is_remote(&self) -> bool {
        self.as_remote().is_some()
    }

    /// Release held resources. Safe to call more than once.
    fn close(&self);
}

/// Build the local executor plus one remote executor per configured or
/// flagged host, deduplicated by alias-or-host (first occurrence wins).
///
/// Every remote is registered with `shutdown` so an interrupt tears it down.
pub fn build_executors(
    config: &Config,
    flagged_hosts: &[String],
    include_local: bool,
    shutdown: &Shutdown,
) -> Result<Vec<Arc<dyn Executor>>, ConfigError> {
    let mut executors: Vec<Arc<dyn Executor>> = Vec::new();
    if include_local {
        executors.push(Arc::new(LocalExecutor::new()));
    }

    let flagged = flagged_hosts
        .iter()
        .map(|raw| HostConfig::from_flag(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for host in config.hosts.iter().chain(flagged.iter()) {
        let target = RemoteTarget::from(host);
        if !seen.insert(target.alias.clone()) {
            tracing::debug!(alias = %target.alias, "skipping duplicate host");
            continue;
        }
        let remote: Arc<dyn Executor> = Arc::new(RemoteExecutor::new(target));
        shutdown.register(Arc::clone(&remote));
        executors.push(remote);
    }

    Ok(executors)
}

/// Find the executor whose label matches `host` (empty means local)
pub fn find_executor<'a>(
    executors: &'a [Arc<dyn Executor>],
    host: &str,
) -> Option<&'a Arc<dyn Executor>> {
    executors.iter().find(|e| e.host_label() == host)
}
