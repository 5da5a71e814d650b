use async_trait::async_trait;
use std::path::Path;

use super::process::{self, Limit};
use super::{Executor, TMUX};
use crate::error::ExecError;

/// Runs tmux as a direct child process on this machine
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    /// Path to tmux binary
    tmux_path: String,
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self {
            tmux_path: TMUX.to_string(),
        }
    }

    fn tmux(&self) -> &str {
        &self.tmux_path
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn run(&self, args: &[String]) -> Result<(), ExecError> {
        self.output(args).await.map(|_| ())
    }

    async fn output(&self, args: &[String]) -> Result<Vec<u8>, ExecError> {
        let op = process::op_name(TMUX, args);
        process::capture("", &op, self.tmux(), args, None, Limit::Unbounded).await
    }

    async fn run_with_dir(&self, dir: &Path, args: &[String]) -> Result<(), ExecError> {
        let op = process::op_name(TMUX, args);
        process::capture("", &op, self.tmux(), args, Some(dir), Limit::Unbounded)
            .await
            .map(|_| ())
    }

    async fn interactive(&self, args: &[String]) -> Result<(), ExecError> {
        let op = process::op_name(TMUX, args);
        process::interactive("", &op, self.tmux(), args).await
    }

    async fn run_generic(&self, program: &str, args: &[String]) -> Result<Vec<u8>, ExecError> {
        process::capture("", program, program, args, None, Limit::Unbounded).await
    }

    fn host_label(&self) -> &str {
        ""
    }

    fn close(&self) {}
}
