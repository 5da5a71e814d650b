//! Scripted executor for unit tests.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::ExecError;
use crate::executor::Executor;

#[derive(Clone)]
enum Reply {
    Stdout(String),
    Stderr(String),
    Timeout,
}

/// Answers tmux commands from a prefix table and records every call
pub struct FakeExecutor {
    label: String,
    replies: Vec<(String, Reply)>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    closes: AtomicUsize,
}

impl FakeExecutor {
    pub fn local() -> Self {
        Self::labelled("")
    }

    pub fn labelled(label: &str) -> Self {
        Self {
            label: label.to_string(),
            replies: Vec::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        }
    }

    /// Commands starting with `prefix` print `stdout`
    pub fn reply(mut self, prefix: &str, stdout: &str) -> Self {
        self.replies
            .push((prefix.to_string(), Reply::Stdout(stdout.to_string())));
        self
    }

    /// Commands starting with `prefix` exit 1 with `stderr`
    pub fn fail(mut self, prefix: &str, stderr: &str) -> Self {
        self.replies
            .push((prefix.to_string(), Reply::Stderr(stderr.to_string())));
        self
    }

    /// Commands starting with `prefix` hit the per-command deadline
    pub fn time_out(mut self, prefix: &str) -> Self {
        self.replies.push((prefix.to_string(), Reply::Timeout));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    async fn answer(&self, kind: &str, args: &[String]) -> Result<Vec<u8>, ExecError> {
        let line = args.join(" ");
        self.calls.lock().unwrap().push(format!("{kind} {line}"));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self
            .replies
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone());
        let op = args.first().cloned().unwrap_or_default();
        match reply {
            None => Ok(Vec::new()),
            Some(Reply::Stdout(out)) => Ok(out.into_bytes()),
            Some(Reply::Stderr(stderr)) => Err(ExecError::Failed {
                host: self.label.clone(),
                op,
                status: "exit status: 1".to_string(),
                stderr,
            }),
            Some(Reply::Timeout) => Err(ExecError::Timeout {
                host: self.label.clone(),
                op,
                after: Duration::from_secs(10),
            }),
        }
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn run(&self, args: &[String]) -> Result<(), ExecError> {
        self.answer("run", args).await.map(|_| ())
    }

    async fn output(&self, args: &[String]) -> Result<Vec<u8>, ExecError> {
        self.answer("output", args).await
    }

    async fn run_with_dir(&self, dir: &Path, args: &[String]) -> Result<(), ExecError> {
        self.answer(&format!("run_with_dir {}", dir.display()), args)
            .await
            .map(|_| ())
    }

    async fn interactive(&self, args: &[String]) -> Result<(), ExecError> {
        self.answer("interactive", args).await.map(|_| ())
    }

    async fn run_generic(&self, program: &str, args: &[String]) -> Result<Vec<u8>, ExecError> {
        let mut argv = vec![program.to_string()];
        argv.extend(args.iter().cloned());
        self.answer("generic", &argv).await
    }

    fn host_label(&self) -> &str {
        &self.label
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
