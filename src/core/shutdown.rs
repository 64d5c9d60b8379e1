//! Shutdown coordination for the hosting loop
//!
//! The `run` command keeps bundles alive until a termination signal arrives. The
//! first signal asks for a graceful close of the plugin manager; a second one while
//! the close is still running exits immediately.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Exit status used when a second signal forces termination
pub const FORCED_EXIT_CODE: i32 = 130;

/// Broadcasts a single "stop now" request to every interested task
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
    signal_count: Arc<AtomicUsize>,
}

impl ShutdownCoordinator {
    /// Create a coordinator together with a first receiver
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        let coordinator = Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            signal_count: Arc::new(AtomicUsize::new(0)),
        };
        (coordinator, shutdown_rx)
    }

    /// Additional receiver; must be created before the shutdown is triggered
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Request shutdown programmatically
    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Run `future_fn` with a receiver wired to process signals
    pub async fn guard<F, Fut, R>(future_fn: F) -> R
    where
        F: FnOnce(Self, broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = R>,
    {
        let (coordinator, shutdown_rx) = Self::new();
        coordinator.install_signal_handlers();
        future_fn(coordinator, shutdown_rx).await
    }

    /// Spawn signal listeners on the current tokio runtime
    pub fn install_signal_handlers(&self) {
        #[cfg(unix)]
        {
            // Restore default SIGPIPE so `bundlehost list | head` exits quietly
            unsafe {
                libc::signal(libc::SIGPIPE, libc::SIG_DFL);
            }

            use tokio::signal::unix::{signal, SignalKind};
            let kinds = [
                SignalKind::interrupt(),
                SignalKind::terminate(),
                SignalKind::hangup(),
            ];

            for kind in kinds {
                let tx = self.shutdown_tx.clone();
                let requested = self.shutdown_requested.clone();
                let counter = self.signal_count.clone();

                tokio::spawn(async move {
                    let Ok(mut sig) = signal(kind) else {
                        log::warn!("Could not install handler for {:?}", kind);
                        return;
                    };
                    while sig.recv().await.is_some() {
                        on_signal(&tx, &requested, &counter);
                    }
                });
            }
        }

        #[cfg(not(unix))]
        {
            let tx = self.shutdown_tx.clone();
            let requested = self.shutdown_requested.clone();
            let counter = self.signal_count.clone();
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    on_signal(&tx, &requested, &counter);
                }
            });
        }
    }
}

fn on_signal(tx: &broadcast::Sender<()>, requested: &AtomicBool, counter: &AtomicUsize) {
    let previous = counter.fetch_add(1, Ordering::AcqRel);
    requested.store(true, Ordering::Release);
    if previous >= 1 {
        log::warn!("Second signal received; exiting without cleanup");
        std::process::exit(FORCED_EXIT_CODE);
    }
    log::info!("Shutdown requested; unloading bundles (signal again to force)");
    let _ = tx.send(());
}
