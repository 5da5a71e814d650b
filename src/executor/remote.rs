//! SSH-backed executor with a lazily established, pooled control connection.

use async_trait::async_trait;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::process::{self, Limit};
use super::{Executor, TMUX};
use crate::attach::AttachStrategy;
use crate::config::HostConfig;
use crate::error::ExecError;
use crate::shell::quote_args;
use crate::tmux::exact_session;

pub const DEFAULT_PORT: u16 = 22;

/// How long the control master gets to fail before it is considered up
const CONNECT_GRACE: Duration = Duration::from_secs(2);

/// Deadline for every pooled command
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// How long close waits on `ssh -O exit` and on the master to go away
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Seconds an idle control master stays alive
const CONTROL_PERSIST_SECS: u32 = 300;

/// Client used for interactive attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachMethod {
    #[default]
    Ssh,
    Mosh,
}

impl AttachMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachMethod::Ssh => "ssh",
            AttachMethod::Mosh => "mosh",
        }
    }
}

impl fmt::Display for AttachMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "ssh" => Ok(AttachMethod::Ssh),
            "mosh" => Ok(AttachMethod::Mosh),
            other => Err(format!("unknown attach method '{other}' (expected ssh or mosh)")),
        }
    }
}

/// Where a remote executor points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// `user@host` or an ssh_config alias
    pub host: String,
    pub port: u16,
    pub method: AttachMethod,
    /// Display label; also the identity used for deduplication
    pub alias: String,
    /// Per-host attach strategy override
    pub strategy: Option<AttachStrategy>,
}

impl RemoteTarget {
    /// Port `0` means 22 and an empty alias means the host itself
    pub fn new(
        host: impl Into<String>,
        port: u16,
        method: AttachMethod,
        alias: impl Into<String>,
    ) -> Self {
        let host = host.into();
        let alias = alias.into();
        Self {
            alias: if alias.trim().is_empty() {
                host.clone()
            } else {
                alias
            },
            host,
            port: if port == 0 { DEFAULT_PORT } else { port },
            method,
            strategy: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Option<AttachStrategy>) -> Self {
        self.strategy = strategy;
        self
    }
}

impl From<&HostConfig> for RemoteTarget {
    fn from(host: &HostConfig) -> Self {
        RemoteTarget::new(host.host.clone(), host.port, host.method, host.alias.clone())
            .with_strategy(host.attach_strategy)
    }
}

/// A spawned control master and the directory holding its socket
struct Master {
    dir: TempDir,
    control_path: PathBuf,
    /// `None` once the process has been reaped
    child: Option<Child>,
}

/// Runs tmux on a remote host over SSH.
///
/// The first call of any kind establishes a background control master; every
/// later call reuses its socket. A failed first attempt is cached and replayed
/// to every subsequent caller.
pub struct RemoteExecutor {
    target: RemoteTarget,
    ssh_program: String,
    mosh_available: fn(&str) -> bool,
    /// Uninitialized, in progress (callers wait), or done with its result
    transport: OnceCell<Result<PathBuf, String>>,
    /// Owned from spawn until close, whatever state `transport` is in
    master: Mutex<Option<Master>>,
    closed: AtomicBool,
    attempts: AtomicUsize,
}

impl RemoteExecutor {
    pub fn new(target: RemoteTarget) -> Self {
        Self {
            target,
            ssh_program: "ssh".to_string(),
            mosh_available: process::on_path,
            transport: OnceCell::new(),
            master: Mutex::new(None),
            closed: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    fn with_ssh_program(mut self, program: &str) -> Self {
        self.ssh_program = program.to_string();
        self
    }

    #[cfg(test)]
    fn with_mosh_lookup(mut self, lookup: fn(&str) -> bool) -> Self {
        self.mosh_available = lookup;
        self
    }

    pub fn target(&self) -> &RemoteTarget {
        &self.target
    }

    /// How many times connection establishment actually ran
    #[cfg(test)]
    fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn master_dir(&self) -> Option<PathBuf> {
        self.lock_master().as_ref().map(|m| m.dir.path().to_path_buf())
    }

    #[cfg(test)]
    fn master_pid(&self) -> Option<u32> {
        self.lock_master()
            .as_ref()
            .and_then(|m| m.child.as_ref())
            .and_then(|c| c.id())
    }

    fn lock_master(&self) -> MutexGuard<'_, Option<Master>> {
        self.master.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Options every ssh invocation carries
    fn base_ssh_args(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            "ControlMaster=auto".to_string(),
            "-o".to_string(),
            format!("ControlPersist={CONTROL_PERSIST_SECS}"),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-p".to_string(),
            self.target.port.to_string(),
        ]
    }

    fn pooled_ssh_args(&self, control_path: &Path) -> Vec<String> {
        let mut args = self.base_ssh_args();
        args.push("-o".to_string());
        args.push(format!("ControlPath={}", control_path.display()));
        args
    }

    /// Establish the control master once; later callers get the cached outcome.
    async fn control_path(&self) -> Result<PathBuf, ExecError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.connect_error("connection already closed".to_string()));
        }
        let state = self
            .transport
            .get_or_init(|| async { self.establish().await })
            .await;

        if self.closed.load(Ordering::SeqCst) {
            return Err(self.connect_error("connection already closed".to_string()));
        }
        match state {
            Ok(control_path) => Ok(control_path.clone()),
            Err(reason) => Err(self.connect_error(reason.clone())),
        }
    }

    async fn establish(&self) -> Result<PathBuf, String> {
        if self.closed.load(Ordering::SeqCst) {
            return Err("connection already closed".to_string());
        }
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!(host = %self.target.alias, attempt, "establishing control connection");

        let dir = tempfile::Builder::new()
            .prefix("tmux-fleet-")
            .tempdir()
            .map_err(|e| format!("failed to create control directory: {e}"))?;
        let control_path = dir.path().join("control.sock");
        let log_path = dir.path().join("master.log");
        let log = File::create(&log_path)
            .map_err(|e| format!("failed to create {}: {e}", log_path.display()))?;

        let mut args = self.pooled_ssh_args(&control_path);
        args.push("-N".to_string());
        args.push(self.target.host.clone());

        debug!(host = %self.target.alias, ?args, "spawning control master");
        let child = Command::new(&self.ssh_program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(log)
            .spawn()
            .map_err(|e| format!("failed to start {}: {e}", self.ssh_program))?;

        self.adopt(Master {
            dir,
            control_path: control_path.clone(),
            child: Some(child),
        })?;

        let deadline = Instant::now() + CONNECT_GRACE;
        loop {
            match self.poll_master()? {
                // Still running after the grace window: the master is up.
                None if Instant::now() >= deadline => break,
                None => tokio::time::sleep(POLL_INTERVAL).await,
                // ControlPersist forks the master into the background on success.
                Some(status) if status.success() => break,
                Some(status) => {
                    let detail = std::fs::read_to_string(&log_path).unwrap_or_default();
                    let detail = detail.trim();
                    let reason = if detail.is_empty() {
                        format!("{} exited with {status}", self.ssh_program)
                    } else {
                        detail.to_string()
                    };
                    let master = self.lock_master().take();
                    if let Some(master) = master {
                        self.shut_down(master);
                    }
                    return Err(reason);
                }
            }
        }
        Ok(control_path)
    }

    /// Hand a freshly spawned master to the executor, unless it was closed meanwhile
    fn adopt(&self, master: Master) -> Result<(), String> {
        let mut slot = self.lock_master();
        if self.closed.load(Ordering::SeqCst) {
            drop(slot);
            self.shut_down(master);
            return Err("connection closed during setup".to_string());
        }
        *slot = Some(master);
        Ok(())
    }

    /// Exit status of the master if it has finished, `None` while it runs
    fn poll_master(&self) -> Result<Option<ExitStatus>, String> {
        let mut slot = self.lock_master();
        let Some(master) = slot.as_mut() else {
            return Err("connection closed during setup".to_string());
        };
        let Some(child) = master.child.as_mut() else {
            return Ok(None);
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                master.child = None;
                Ok(Some(status))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(format!("failed waiting for {}: {e}", self.ssh_program)),
        }
    }

    /// Stop the master and remove its directory. Best effort; failures are logged.
    fn shut_down(&self, mut master: Master) {
        if master.control_path.exists() {
            self.exit_control_master(&master.control_path);
        }
        if let Some(mut child) = master.child.take() {
            let reaped = match child.try_wait() {
                Ok(Some(_)) => true,
                Ok(None) => match child.start_kill() {
                    Ok(()) => wait_bounded(|| child.try_wait()),
                    Err(e) => {
                        warn!(host = %self.target.alias, "failed to kill control master: {e}");
                        false
                    }
                },
                Err(e) => {
                    warn!(host = %self.target.alias, "failed to poll control master: {e}");
                    false
                }
            };
            if !reaped {
                warn!(host = %self.target.alias, "control master did not exit");
            }
        }
        if let Err(e) = master.dir.close() {
            warn!(host = %self.target.alias, "failed to remove control directory: {e}");
        }
    }

    /// Ask the master behind `control_path` to exit, giving up after [`CLOSE_TIMEOUT`]
    fn exit_control_master(&self, control_path: &Path) {
        let mut args = self.pooled_ssh_args(control_path);
        args.extend(["-O".to_string(), "exit".to_string(), self.target.host.clone()]);
        let spawned = std::process::Command::new(&self.ssh_program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                if !wait_bounded(|| child.try_wait()) {
                    warn!(host = %self.target.alias, "ssh -O exit timed out");
                    let _ = child.kill();
                    let _ = child.wait();
                }
            }
            Err(e) => warn!(host = %self.target.alias, "failed to stop control master: {e}"),
        }
    }

    fn connect_error(&self, reason: String) -> ExecError {
        ExecError::Connect {
            host: self.target.alias.clone(),
            reason,
        }
    }

    /// Run `remote_argv` over the pooled connection with the per-command deadline
    async fn pooled(&self, op: &str, remote_argv: &[String]) -> Result<Vec<u8>, ExecError> {
        let control_path = self.control_path().await?;
        let mut args = self.pooled_ssh_args(&control_path);
        args.push(self.target.host.clone());
        args.push(quote_args(remote_argv));
        process::capture(
            &self.target.alias,
            op,
            &self.ssh_program,
            &args,
            None,
            Limit::Deadline(COMMAND_TIMEOUT),
        )
        .await
    }

    fn tmux_argv(args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(TMUX.to_string());
        argv.extend(args.iter().cloned());
        argv
    }

    /// The method actually usable here: mosh degrades to ssh when not installed
    fn effective_method(&self) -> AttachMethod {
        match self.target.method {
            AttachMethod::Mosh if !(self.mosh_available)("mosh") => {
                warn!(
                    host = %self.target.alias,
                    "mosh requested but not found on PATH; falling back to ssh"
                );
                AttachMethod::Ssh
            }
            method => method,
        }
    }

    /// Full argv (program first) that runs `tmux args…` on the host in the
    /// foreground with a terminal attached, bypassing the pooled connection.
    pub fn interactive_argv(&self, args: &[String]) -> Vec<String> {
        self.interactive_argv_with(self.effective_method(), args)
    }

    fn interactive_argv_with(&self, method: AttachMethod, args: &[String]) -> Vec<String> {
        let mut argv = Vec::new();
        match method {
            AttachMethod::Mosh => {
                argv.push("mosh".to_string());
                if self.target.port != DEFAULT_PORT {
                    argv.push(format!("--ssh=ssh -p {}", self.target.port));
                }
                argv.push(self.target.host.clone());
                argv.push("--".to_string());
                argv.extend(Self::tmux_argv(args));
            }
            AttachMethod::Ssh => {
                argv.push(self.ssh_program.clone());
                argv.extend(self.base_ssh_args());
                argv.push("-t".to_string());
                argv.push(self.target.host.clone());
                argv.push(quote_args(&Self::tmux_argv(args)));
            }
        }
        argv
    }

    /// Argv that attaches to `session` on this host
    pub fn attach_argv(&self, session: &str) -> Vec<String> {
        self.interactive_argv(&[
            "attach-session".to_string(),
            "-t".to_string(),
            exact_session(session),
        ])
    }
}

#[async_trait]
impl Executor for RemoteExecutor {
    async fn run(&self, args: &[String]) -> Result<(), ExecError> {
        self.output(args).await.map(|_| ())
    }

    async fn output(&self, args: &[String]) -> Result<Vec<u8>, ExecError> {
        let op = process::op_name(TMUX, args);
        self.pooled(&op, &Self::tmux_argv(args)).await
    }

    async fn run_with_dir(&self, dir: &Path, args: &[String]) -> Result<(), ExecError> {
        debug!(
            host = %self.target.alias,
            dir = %dir.display(),
            "working directory ignored on remote host"
        );
        self.run(args).await
    }

    async fn interactive(&self, args: &[String]) -> Result<(), ExecError> {
        let argv = self.interactive_argv(args);
        let op = process::op_name(TMUX, args);
        process::interactive(&self.target.alias, &op, &argv[0], &argv[1..]).await
    }

    async fn run_generic(&self, program: &str, args: &[String]) -> Result<Vec<u8>, ExecError> {
        let mut argv = vec![program.to_string()];
        argv.extend(args.iter().cloned());
        self.pooled(program, &argv).await
    }

    fn host_label(&self) -> &str {
        &self.target.alias
    }

    fn as_remote(&self) -> Option<&RemoteExecutor> {
        Some(self)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let master = self.lock_master().take();
        if let Some(master) = master {
            debug!(host = %self.target.alias, "closing control connection");
            self.shut_down(master);
        }
    }
}

/// Poll `try_wait` until the process exits or [`CLOSE_TIMEOUT`] passes.
/// Returns whether it exited.
fn wait_bounded(mut try_wait: impl FnMut() -> io::Result<Option<ExitStatus>>) -> bool {
    let deadline = Instant::now() + CLOSE_TIMEOUT;
    loop {
        match try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) if Instant::now() < deadline => std::thread::sleep(POLL_INTERVAL),
            Ok(None) | Err(_) => return false,
        }
    }
}

impl Drop for RemoteExecutor {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::process::owned;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;

    fn target() -> RemoteTarget {
        RemoteTarget::new("dev@box", 0, AttachMethod::Ssh, "box")
    }

    #[test]
    fn test_defaults_for_port_and_method() {
        let t = RemoteTarget::new("dev@box", 0, "".parse().unwrap(), "");
        assert_eq!(t.port, 22);
        assert_eq!(t.method, AttachMethod::Ssh);
        assert_eq!(t.method.as_str(), "ssh");
        assert_eq!(t.alias, "dev@box");
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!("telnet".parse::<AttachMethod>().is_err());
        assert_eq!("MOSH".parse::<AttachMethod>().unwrap(), AttachMethod::Mosh);
    }

    #[test]
    fn test_base_ssh_args() {
        let remote = RemoteExecutor::new(RemoteTarget::new("dev@box", 2200, AttachMethod::Ssh, ""));
        assert_eq!(
            remote.base_ssh_args(),
            owned(&[
                "-o",
                "ControlMaster=auto",
                "-o",
                "ControlPersist=300",
                "-o",
                "StrictHostKeyChecking=accept-new",
                "-p",
                "2200",
            ])
        );
        let pooled = remote.pooled_ssh_args(Path::new("/tmp/x/control.sock"));
        assert_eq!(&pooled[8..], &owned(&["-o", "ControlPath=/tmp/x/control.sock"])[..]);
    }

    #[test]
    fn test_ssh_attach_argv() {
        let remote = RemoteExecutor::new(target());
        let argv = remote.interactive_argv_with(
            AttachMethod::Ssh,
            &owned(&["attach-session", "-t", "my sess"]),
        );
        assert_eq!(argv[0], "ssh");
        assert!(argv.contains(&"-t".to_string()));
        assert!(!argv.iter().any(|a| a.starts_with("ControlPath=")));
        assert_eq!(argv[argv.len() - 2], "dev@box");
        assert_eq!(argv[argv.len() - 1], "tmux attach-session -t 'my sess'");
    }

    #[test]
    fn test_mosh_attach_argv() {
        let remote =
            RemoteExecutor::new(RemoteTarget::new("user@host", 2222, AttachMethod::Mosh, ""));
        let argv = remote.interactive_argv_with(
            AttachMethod::Mosh,
            &owned(&["attach-session", "-t", "mysess"]),
        );
        assert_eq!(
            quote_args(&argv),
            "mosh '--ssh=ssh -p 2222' user@host -- tmux attach-session -t mysess"
        );

        let default_port =
            RemoteExecutor::new(RemoteTarget::new("user@host", 22, AttachMethod::Mosh, ""));
        let argv = default_port.interactive_argv_with(AttachMethod::Mosh, &owned(&["ls"]));
        assert_eq!(quote_args(&argv), "mosh user@host -- tmux ls");
    }

    #[tokio::test]
    async fn test_failed_setup_runs_once_and_is_replayed() {
        let remote = Arc::new(
            RemoteExecutor::new(target()).with_ssh_program("/nonexistent/tmux-fleet-ssh"),
        );

        let mut handles = Vec::new();
        for _ in 0..4 {
            let remote = Arc::clone(&remote);
            handles.push(tokio::spawn(async move {
                remote.output(&owned(&["list-sessions"])).await
            }));
        }
        let mut reasons = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Err(ExecError::Connect { reason, .. }) => reasons.push(reason),
                other => panic!("expected connect error, got {other:?}"),
            }
        }
        assert!(remote.run_generic("ps", &[]).await.unwrap_err().is_connect());

        assert_eq!(remote.connect_attempts(), 1);
        assert!(reasons.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_master_exiting_with_error_is_a_connect_failure() {
        let remote = RemoteExecutor::new(target()).with_ssh_program("false");
        let err = remote.run(&owned(&["list-sessions"])).await.unwrap_err();
        assert!(err.is_connect(), "got: {err}");
        assert!(remote.run(&owned(&["list-sessions"])).await.unwrap_err().is_connect());
        assert_eq!(remote.connect_attempts(), 1);
        // Nothing was established; close must still be harmless.
        remote.close();
        remote.close();
    }

    #[tokio::test]
    async fn test_established_connection_is_reused_then_closed() {
        // `true` stands in for an ssh that backgrounds its master and exits 0.
        let remote = RemoteExecutor::new(target()).with_ssh_program("true");
        assert!(remote.output(&owned(&["list-sessions"])).await.unwrap().is_empty());
        remote.run(&owned(&["kill-server"])).await.unwrap();
        assert_eq!(remote.connect_attempts(), 1);

        let dir = remote.master_dir().unwrap();
        assert!(dir.exists());
        assert!(dir.starts_with(std::env::temp_dir()));

        remote.close();
        assert!(!dir.exists());
        remote.close();

        let err = remote.run(&owned(&["list-sessions"])).await.unwrap_err();
        assert!(err.is_connect());
        assert_eq!(remote.connect_attempts(), 1);
    }

    /// Stand-in ssh whose `-N` master stays in the foreground; every other
    /// invocation succeeds with no output.
    fn lingering_ssh(dir: &Path) -> String {
        let path = dir.join("ssh");
        std::fs::write(
            &path,
            concat!(
                "#!/bin/sh\n",
                "for arg in \"$@\"; do\n",
                "  [ \"$arg\" = -N ] && exec sleep 30\n",
                "done\n",
                "exit 0\n",
            ),
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn process_gone(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Err(_) => true,
            // Zombies still have an entry
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .is_some_and(|rest| rest.trim_start().starts_with('Z')),
        }
    }

    #[tokio::test]
    async fn test_master_alive_after_grace_is_established() {
        let bin = tempfile::tempdir().unwrap();
        let remote = RemoteExecutor::new(target()).with_ssh_program(&lingering_ssh(bin.path()));

        let started = Instant::now();
        assert!(remote.output(&owned(&["list-sessions"])).await.unwrap().is_empty());
        assert!(started.elapsed() >= CONNECT_GRACE);

        let again = Instant::now();
        remote.run(&owned(&["kill-server"])).await.unwrap();
        assert!(again.elapsed() < Duration::from_secs(1));
        assert_eq!(remote.connect_attempts(), 1);

        let dir = remote.master_dir().unwrap();
        let pid = remote.master_pid().unwrap();
        remote.close();
        assert!(!dir.exists());
        assert!(process_gone(pid));
    }

    #[tokio::test]
    async fn test_close_during_setup_releases_everything() {
        let bin = tempfile::tempdir().unwrap();
        let remote = Arc::new(
            RemoteExecutor::new(target()).with_ssh_program(&lingering_ssh(bin.path())),
        );

        let pending = {
            let remote = Arc::clone(&remote);
            tokio::spawn(async move { remote.output(&owned(&["list-sessions"])).await })
        };
        tokio::time::sleep(Duration::from_millis(300)).await;

        let dir = remote.master_dir().expect("master spawned");
        let pid = remote.master_pid().expect("master running");
        assert!(dir.exists());

        remote.close();
        assert!(!dir.exists());
        assert!(process_gone(pid));
        assert!(remote.master_dir().is_none());

        let err = pending.await.unwrap().unwrap_err();
        assert!(err.is_connect(), "got: {err}");
        assert_eq!(remote.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn test_closed_before_use_never_connects() {
        let remote = RemoteExecutor::new(target()).with_ssh_program("true");
        remote.close();
        assert!(remote.output(&owned(&["list-sessions"])).await.unwrap_err().is_connect());
        assert_eq!(remote.connect_attempts(), 0);
        assert!(remote.master_dir().is_none());
    }

    #[test]
    fn test_missing_mosh_falls_back_to_ssh() {
        let mosh_target = || RemoteTarget::new("user@host", 2222, AttachMethod::Mosh, "");

        let remote = RemoteExecutor::new(mosh_target()).with_mosh_lookup(|_| false);
        let argv = remote.attach_argv("dev");
        assert_eq!(argv[0], "ssh");
        assert!(argv.contains(&"-t".to_string()));
        assert!(argv.windows(2).any(|w| w[0] == "-p" && w[1] == "2222"));
        assert_eq!(argv[argv.len() - 2], "user@host");
        assert_eq!(argv[argv.len() - 1], "tmux attach-session -t =dev");

        let remote = RemoteExecutor::new(mosh_target()).with_mosh_lookup(|_| true);
        assert_eq!(
            quote_args(&remote.attach_argv("dev")),
            "mosh '--ssh=ssh -p 2222' user@host -- tmux attach-session -t =dev"
        );
    }
}
