//! Concurrent session-tree queries across every executor.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ExecError;
use crate::executor::Executor;
use crate::tmux::{TmuxClient, Tree};

/// Outcome of querying one host. Exactly one of `tree`/`error` is set.
#[derive(Debug)]
pub struct HostTreeResult {
    pub host: String,
    pub tree: Option<Tree>,
    pub error: Option<ExecError>,
}

impl HostTreeResult {
    fn from_outcome(host: String, outcome: Result<Tree, ExecError>) -> Self {
        match outcome {
            Ok(tree) => Self {
                host,
                tree: Some(tree),
                error: None,
            },
            // Reachable host with nothing running yet
            Err(e) if e.is_no_server() => {
                debug!(host = %host, "no tmux server; reporting empty tree");
                Self {
                    host,
                    tree: Some(Vec::new()),
                    error: None,
                }
            }
            Err(e) => {
                warn!(host = %host, "tree fetch failed: {e}");
                Self {
                    host,
                    tree: None,
                    error: Some(e),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetch every executor's tree concurrently.
///
/// Results come back in input order; one host failing never affects another.
pub async fn fetch_trees(executors: &[Arc<dyn Executor>]) -> Vec<HostTreeResult> {
    let handles: Vec<_> = executors
        .iter()
        .map(|executor| {
            let client = TmuxClient::new(Arc::clone(executor));
            tokio::spawn(async move { client.tree().await })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (executor, handle) in executors.iter().zip(handles) {
        let host = executor.host_label().to_string();
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => Err(ExecError::Aborted {
                host: host.clone(),
                reason: join_error.to_string(),
            }),
        };
        results.push(HostTreeResult::from_outcome(host, outcome));
    }
    results
}
