//! Process-wide teardown of open remote executors.
//!
//! The normal exit path and the signal path both end in [`Shutdown::run`],
//! which does its work exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::executor::Executor;

/// Exit status after an interrupt
const INTERRUPTED: i32 = 130;

#[derive(Default)]
struct Inner {
    executors: Mutex<Vec<Arc<dyn Executor>>>,
    done: AtomicBool,
}

/// Cloneable handle to the set of executors that must be closed on exit
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, executor: Arc<dyn Executor>) {
        match self.inner.executors.lock() {
            Ok(mut executors) => executors.push(executor),
            Err(poisoned) => poisoned.into_inner().push(executor),
        }
    }

    /// Number of executors waiting to be closed
    pub fn registered(&self) -> usize {
        self.inner.executors.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Close every registered executor. Returns `false` if already run.
    pub fn run(&self) -> bool {
        if self.inner.done.swap(true, Ordering::SeqCst) {
            return false;
        }
        let executors = match self.inner.executors.lock() {
            Ok(mut executors) => std::mem::take(&mut *executors),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        debug!(count = executors.len(), "closing executors");
        for executor in executors {
            executor.close();
        }
        true
    }

    /// Run the teardown and exit on SIGINT or SIGTERM.
    pub fn install_signal_handler(&self) {
        let shutdown = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("interrupted; closing remote connections");
            shutdown.run();
            std::process::exit(INTERRUPTED);
        });
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!("cannot listen for SIGTERM: {e}");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
