//! Graceful shutdown coordinator
//!
//! One coordinator per process. OS signals (or tests) trigger it; the HTTP
//! server and the store teardown subscribe to it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, warn};

/// Shutdown signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Graceful,
    Immediate,
}

/// Shutdown state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    ShuttingDown,
    Shutdown,
}

/// Graceful shutdown coordinator
pub struct ShutdownCoordinator {
    state: Arc<RwLock<ShutdownState>>,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            state: Arc::new(RwLock::new(ShutdownState::Running)),
            shutdown_tx,
            timeout,
        }
    }

    /// Grace period granted to in-flight work once shutdown starts
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Subscribe to shutdown notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.shutdown_tx.subscribe()
    }

    /// Begin a graceful shutdown. Repeated calls are no-ops.
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        if *state != ShutdownState::Running {
            warn!("Shutdown already in progress");
            return;
        }
        *state = ShutdownState::ShuttingDown;
        drop(state);

        info!(grace = ?self.timeout, "Initiating graceful shutdown");
        if self.shutdown_tx.send(ShutdownSignal::Graceful).is_err() {
            // Nobody subscribed; nothing is waiting to drain
            info!("No components registered for shutdown");
        }
    }

    /// Skip the grace period
    pub async fn shutdown_immediately(&self) {
        warn!("Initiating immediate shutdown");

        *self.state.write().await = ShutdownState::Shutdown;

        if let Err(e) = self.shutdown_tx.send(ShutdownSignal::Immediate) {
            error!("Failed to send immediate shutdown signal: {}", e);
        }
    }

    /// Record that every component has stopped
    pub async fn mark_complete(&self) {
        *self.state.write().await = ShutdownState::Shutdown;
        info!("Shutdown complete");
    }

    pub async fn is_shutting_down(&self) -> bool {
        *self.state.read().await != ShutdownState::Running
    }

    pub async fn state(&self) -> ShutdownState {
        *self.state.read().await
    }

    /// Resolve once a shutdown has been requested
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.subscribe();
        if self.is_shutting_down().await {
            return;
        }
        let _ = rx.recv().await;
    }

    /// Resolve once the grace period has been cancelled by `shutdown_immediately`
    pub async fn wait_for_immediate(&self) {
        let mut rx = self.subscribe();
        if self.state().await == ShutdownState::Shutdown {
            return;
        }
        loop {
            match rx.recv().await {
                Ok(ShutdownSignal::Immediate) => return,
                Ok(ShutdownSignal::Graceful) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                // the sender lives as long as `self`
                Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
            }
        }
    }

    /// Trigger a graceful shutdown on Ctrl+C or SIGTERM; a second Ctrl+C
    /// skips whatever remains of the grace period
    pub async fn listen_for_os_signals(self: Arc<Self>) {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C");
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                    info!("Received terminate signal");
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        self.shutdown().await;

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received second Ctrl+C");
            self.shutdown_immediately().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_notifies_subscribers() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(10));
        let mut rx = coordinator.subscribe();

        assert_eq!(coordinator.state().await, ShutdownState::Running);
        coordinator.shutdown().await;

        assert_eq!(rx.recv().await.unwrap(), ShutdownSignal::Graceful);
        assert_eq!(coordinator.state().await, ShutdownState::ShuttingDown);

        coordinator.mark_complete().await;
        assert_eq!(coordinator.state().await, ShutdownState::Shutdown);
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_after_trigger_returns() {
        let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_millis(10)));
        coordinator.shutdown().await;

        // Late waiters must not hang
        tokio::time::timeout(Duration::from_secs(1), coordinator.wait_for_shutdown())
            .await
            .expect("wait_for_shutdown should resolve");
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_wakes_on_trigger() {
        let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_millis(10)));
        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.wait_for_shutdown().await })
        };

        tokio::task::yield_now().await;
        coordinator.shutdown().await;

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn test_immediate_cuts_grace_period_short() {
        let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_secs(60)));
        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.wait_for_immediate().await })
        };
        tokio::task::yield_now().await;

        coordinator.shutdown().await;
        let graceful_only =
            tokio::time::timeout(Duration::from_millis(50), coordinator.wait_for_immediate()).await;
        assert!(graceful_only.is_err(), "graceful shutdown must not end the grace period");

        coordinator.shutdown_immediately().await;
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("immediate waiter should finish")
            .unwrap();
        assert_eq!(coordinator.state().await, ShutdownState::Shutdown);

        // late callers see the state directly
        tokio::time::timeout(Duration::from_secs(1), coordinator.wait_for_immediate())
            .await
            .expect("late immediate waiter should resolve");
    }

    #[tokio::test]
    async fn test_immediate_without_graceful_wakes_shutdown_waiters() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(60));
        coordinator.shutdown_immediately().await;
        assert!(coordinator.is_shutting_down().await);
        tokio::time::timeout(Duration::from_secs(1), coordinator.wait_for_shutdown())
            .await
            .expect("wait_for_shutdown should resolve");
    }

    #[tokio::test]
    async fn test_double_shutdown_is_noop() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(10));
        coordinator.shutdown().await;
        coordinator.shutdown().await;
        assert!(coordinator.is_shutting_down().await);
    }
}
