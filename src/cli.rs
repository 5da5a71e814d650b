use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::attach::AttachStrategy;

/// Drive tmux sessions on this machine and on SSH hosts as one pool
#[derive(Debug, Parser)]
#[command(name = "tmux-fleet", version, about)]
pub struct Cli {
    /// Config file (default: ~/.config/tmux-fleet/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Extra host as [user@]host[:port]; repeatable
    #[arg(short = 'H', long = "host", global = true)]
    pub hosts: Vec<String>,

    /// Leave the local machine out
    #[arg(long, global = true)]
    pub no_local: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List sessions, windows and panes on every host
    Sessions {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Attach to a session
    Attach {
        session: String,
        /// Host alias to attach on (default: local)
        #[arg(long, default_value = "")]
        on: String,
        #[arg(long, value_enum)]
        strategy: Option<AttachStrategy>,
    },
    /// Type keys into a pane
    Send {
        /// tmux target, e.g. dev:0.1
        target: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        keys: Vec<String>,
        #[arg(long, default_value = "")]
        on: String,
        /// Do not press Enter afterwards
        #[arg(long)]
        no_enter: bool,
    },
    /// Create a detached session
    New {
        name: String,
        #[arg(long, default_value = "")]
        on: String,
        /// Starting directory (local only)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Kill a session
    Kill {
        name: String,
        #[arg(long, default_value = "")]
        on: String,
    },
    /// Resident memory of each host's tmux server
    Footprint,
}
