//! Graceful-shutdown coordination.
//!
//! [`ShutdownSignal`] is a cloneable one-shot flag shared by the accept loop
//! and every connection task; [`ConnectionTracker`] counts live connections
//! so shutdown can drain them before the process exits.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Notify};

/// A cloneable one-shot shutdown signal.
///
/// All clones share the same state: once any of them is triggered, every
/// pending and future [`recv`](Self::recv) completes immediately.
///
/// # Example
///
/// ```rust
/// use pylon_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let for_task = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(for_task.is_triggered());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Creates a signal wired to the process termination signals.
    ///
    /// On Unix the signal triggers on SIGTERM or SIGINT; elsewhere on
    /// Ctrl+C.
    ///
    /// # Panics
    ///
    /// Panics if the OS signal handlers cannot be registered.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });

        signal
    }

    /// Triggers the signal, waking every waiter. Idempotent.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // Send may find no receivers; the flag alone carries the state.
            let _ = self.sender.send(());
        }
    }

    /// Whether [`trigger`](Self::trigger) has been called.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Completes once the signal is triggered.
    ///
    /// Completes immediately when the signal has already fired.
    pub async fn recv(&self) {
        if self.is_triggered() {
            return;
        }

        let mut receiver = self.sender.subscribe();

        // trigger() flips the flag before broadcasting, so a trigger racing
        // the subscribe above is caught by this re-check.
        if self.is_triggered() {
            return;
        }

        let _ = receiver.recv().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for an OS termination signal.
async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, shutting down");
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("register Ctrl+C handler");
        tracing::info!("received Ctrl+C, shutting down");
    }
}

/// Counts live connections so shutdown can wait for them to finish.
///
/// Each connection holds a [`ConnectionToken`] for its lifetime; dropping
/// the last token wakes [`drained`](Self::drained).
///
/// # Example
///
/// ```rust
/// use pylon_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Registers a connection; hold the token for its whole lifetime.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// The number of live connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Completes once every token has been dropped.
    ///
    /// Completes immediately when no connection is live.
    pub async fn drained(&self) {
        loop {
            // Register interest before reading the count, otherwise a token
            // dropped between the read and the await would never wake us.
            let notified = self.notify.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Token held for the lifetime of one connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        let prev = self.active.fetch_sub(1, Ordering::SeqCst);
        if prev == 1 {
            self.notify.notify_waiters();
        }
    }
}
