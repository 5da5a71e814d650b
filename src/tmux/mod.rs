mod client;

pub use client::TmuxClient;

use serde::{Deserialize, Serialize};

/// Sessions on one host, in tmux's order
pub type Tree = Vec<Session>;

/// Represents a tmux session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session name, unique per host
    pub name: String,
    /// Unix timestamp when session was created
    pub created_at: u64,
    /// Number of attached clients
    pub attached_clients: usize,
    pub windows: Vec<Window>,
}

/// Represents a window inside a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Window index, unique per session
    pub index: u32,
    pub name: String,
    pub active: bool,
    pub panes: Vec<Pane>,
}

/// Represents a pane inside a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pane {
    /// Pane index, unique per window
    pub index: u32,
    pub active: bool,
    pub pid: u32,
    /// Foreground command (e.g., "nvim")
    pub command: String,
    pub path: String,
}

/// Target that matches session `name` exactly, never by prefix or pattern
pub fn exact_session(name: &str) -> String {
    format!("={name}")
}

impl Session {
    pub fn new(name: String) -> Self {
        Self {
            name,
            created_at: 0,
            attached_clients: 0,
            windows: Vec::new(),
        }
    }
}
