use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

mod attach;
mod cli;
mod config;
mod error;
mod executor;
mod fetch;
mod shell;
mod shutdown;
#[cfg(test)]
mod testutil;
mod tmux;

use attach::AttachStrategy;
use cli::{Cli, Command};
use config::Config;
use executor::{build_executors, find_executor, Executor};
use fetch::{fetch_trees, HostTreeResult};
use shutdown::Shutdown;
use tmux::TmuxClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries listings
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref()).context("Failed to load config")?;

    let shutdown = Shutdown::new();
    shutdown.install_signal_handler();

    let executors = build_executors(&config, &cli.hosts, !cli.no_local, &shutdown)
        .context("Failed to set up hosts")?;

    let result = dispatch(cli.command, &config, &executors).await;

    // Same teardown the signal handler would run
    shutdown.run();
    result
}

async fn dispatch(
    command: Command,
    config: &Config,
    executors: &[Arc<dyn Executor>],
) -> Result<()> {
    match command {
        Command::Sessions { json } => {
            let results = fetch_trees(executors).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&trees_json(&results))?);
            } else {
                print_trees(&results);
            }
        }
        Command::Attach { session, on, strategy } => {
            let executor = pick(executors, &on)?;
            let per_host = executor.as_remote().and_then(|r| r.target().strategy);
            let strategy = AttachStrategy::resolve(strategy, per_host, config.attach_strategy);
            attach::attach(&session, executor.as_ref(), strategy)
                .await
                .with_context(|| format!("Failed to attach to '{session}'"))?;
        }
        Command::Send { target, keys, on, no_enter } => {
            let client = TmuxClient::new(Arc::clone(pick(executors, &on)?));
            client
                .send_keys(&target, &keys, !no_enter)
                .await
                .with_context(|| format!("Failed to send keys to '{target}'"))?;
        }
        Command::New { name, on, dir } => {
            let client = TmuxClient::new(Arc::clone(pick(executors, &on)?));
            client
                .create_session(&name, dir.as_deref())
                .await
                .with_context(|| format!("Failed to create '{name}'"))?;
        }
        Command::Kill { name, on } => {
            let client = TmuxClient::new(Arc::clone(pick(executors, &on)?));
            client
                .kill_session(&name)
                .await
                .with_context(|| format!("Failed to kill '{name}'"))?;
        }
        Command::Footprint => {
            for executor in executors {
                let client = TmuxClient::new(Arc::clone(executor));
                let label = display_label(executor.host_label());
                match client.server_rss_kib().await {
                    Ok(Some(kib)) => println!("{label}\t{kib} KiB"),
                    Ok(None) => println!("{label}\tnot running"),
                    Err(e) => println!("{label}\tunreachable: {e}"),
                }
            }
        }
    }
    Ok(())
}

fn pick<'a>(executors: &'a [Arc<dyn Executor>], host: &str) -> Result<&'a Arc<dyn Executor>> {
    find_executor(executors, host)
        .with_context(|| format!("Unknown host '{}'", display_label(host)))
}

fn display_label(host: &str) -> &str {
    if host.is_empty() {
        "local"
    } else {
        host
    }
}

fn print_trees(results: &[HostTreeResult]) {
    for result in results {
        let label = display_label(&result.host);
        match (&result.tree, &result.error) {
            (_, Some(e)) if e.is_timeout() => println!("{label} [timed out: {e}]"),
            (_, Some(e)) if e.is_connect() => println!("{label} [unreachable: {e}]"),
            (_, Some(e)) => println!("{label} [error: {e}]"),
            (Some(tree), None) if tree.is_empty() => println!("{label} (no sessions)"),
            (Some(tree), None) => {
                println!("{label}");
                for session in tree {
                    let attached = if session.attached_clients > 0 { " (attached)" } else { "" };
                    println!("  {}{attached}", session.name);
                    for window in &session.windows {
                        let marker = if window.active { "*" } else { "" };
                        println!("    {}: {}{marker}", window.index, window.name);
                        for pane in &window.panes {
                            println!("      {} {} {}", pane.index, pane.command, pane.path);
                        }
                    }
                }
            }
            (None, None) => println!("{label}"),
        }
    }
}

fn trees_json(results: &[HostTreeResult]) -> serde_json::Value {
    serde_json::Value::Array(
        results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "host": r.host,
                    "ok": r.is_ok(),
                    "sessions": r.tree,
                    "error": r.error.as_ref().map(|e| e.to_string()),
                })
            })
            .collect(),
    )
}
