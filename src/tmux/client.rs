use std::path::Path;
use std::sync::Arc;

use super::{exact_session, Pane, Session, Tree, Window};
use crate::error::ExecError;
use crate::executor::Executor;

// Free-text field goes last so names containing '|' survive splitn.
const SESSION_FORMAT: &str = "#{session_created}|#{session_attached}|#{session_name}";
const WINDOW_FORMAT: &str = "#{window_index}|#{window_active}|#{window_name}";
const PANE_FORMAT: &str =
    "#{pane_index}|#{pane_active}|#{pane_pid}|#{pane_current_command}|#{pane_current_path}";

/// Typed tmux commands on top of any executor
#[derive(Clone)]
pub struct TmuxClient {
    executor: Arc<dyn Executor>,
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl TmuxClient {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    async fn lines(&self, parts: &[&str]) -> Result<String, ExecError> {
        let out = self.executor.output(&args(parts)).await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// List all tmux sessions, without their windows
    pub async fn list_sessions(&self) -> Result<Vec<Session>, ExecError> {
        let stdout = self.lines(&["list-sessions", "-F", SESSION_FORMAT]).await?;
        Ok(stdout.lines().filter_map(parse_session_line).collect())
    }

    pub async fn list_windows(&self, session: &str) -> Result<Vec<Window>, ExecError> {
        let stdout = self
            .lines(&["list-windows", "-t", &exact_session(session), "-F", WINDOW_FORMAT])
            .await?;
        Ok(stdout.lines().filter_map(parse_window_line).collect())
    }

    pub async fn list_panes(&self, session: &str, window: u32) -> Result<Vec<Pane>, ExecError> {
        let target = format!("{}:{window}", exact_session(session));
        let stdout = self
            .lines(&["list-panes", "-t", &target, "-F", PANE_FORMAT])
            .await?;
        Ok(stdout.lines().filter_map(parse_pane_line).collect())
    }

    /// Full session/window/pane hierarchy
    pub async fn tree(&self) -> Result<Tree, ExecError> {
        let mut sessions = self.list_sessions().await?;
        for session in &mut sessions {
            let mut windows = self.list_windows(&session.name).await?;
            for window in &mut windows {
                window.panes = self.list_panes(&session.name, window.index).await?;
            }
            session.windows = windows;
        }
        Ok(sessions)
    }

    /// Create a detached session, optionally rooted in `dir`
    pub async fn create_session(&self, name: &str, dir: Option<&Path>) -> Result<(), ExecError> {
        let cmd = args(&["new-session", "-d", "-s", name]);
        match dir {
            Some(dir) => self.executor.run_with_dir(dir, &cmd).await,
            None => self.executor.run(&cmd).await,
        }
    }

    /// Kill exactly the session called `name`
    pub async fn kill_session(&self, name: &str) -> Result<(), ExecError> {
        self.executor
            .run(&args(&["kill-session", "-t", &exact_session(name)]))
            .await
    }

    /// Type `keys` into `target`, optionally followed by Enter
    pub async fn send_keys(
        &self,
        target: &str,
        keys: &[String],
        enter: bool,
    ) -> Result<(), ExecError> {
        let mut cmd = args(&["send-keys", "-t", target]);
        cmd.extend(keys.iter().cloned());
        if enter {
            cmd.push("Enter".to_string());
        }
        self.executor.run(&cmd).await
    }

    /// Pid of the tmux server, `None` when no server is running
    pub async fn server_pid(&self) -> Result<Option<u32>, ExecError> {
        match self.lines(&["display-message", "-p", "#{pid}"]).await {
            Ok(out) => Ok(out.trim().parse().ok()),
            Err(e) if e.is_no_server() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resident memory of the tmux server in KiB, `None` when not running
    pub async fn server_rss_kib(&self) -> Result<Option<u64>, ExecError> {
        let Some(pid) = self.server_pid().await? else {
            return Ok(None);
        };
        let out = self
            .executor
            .run_generic("ps", &args(&["-o", "rss=", "-p", &pid.to_string()]))
            .await?;
        Ok(String::from_utf8_lossy(&out).trim().parse().ok())
    }
}

fn parse_session_line(line: &str) -> Option<Session> {
    let parts: Vec<&str> = line.splitn(3, '|').collect();
    if parts.len() < 3 {
        return None;
    }

    let mut session = Session::new(parts[2].to_string());
    session.created_at = parts[0].parse().unwrap_or(0);
    session.attached_clients = parts[1].parse().unwrap_or(0);
    Some(session)
}

fn parse_window_line(line: &str) -> Option<Window> {
    let parts: Vec<&str> = line.splitn(3, '|').collect();
    if parts.len() < 3 {
        return None;
    }

    Some(Window {
        index: parts[0].parse().ok()?,
        active: parts[1] == "1",
        name: parts[2].to_string(),
        panes: Vec::new(),
    })
}

fn parse_pane_line(line: &str) -> Option<Pane> {
    let parts: Vec<&str> = line.splitn(5, '|').collect();
    if parts.len() < 5 {
        return None;
    }

    Some(Pane {
        index: parts[0].parse().ok()?,
        active: parts[1] == "1",
        pid: parts[2].parse().unwrap_or(0),
        command: parts[3].to_string(),
        path: parts[4].to_string(),
    })
}
