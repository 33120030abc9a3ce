//! Graceful shutdown handling
//!
//! One [`ShutdownSignal`] is shared by the HTTP server and the expiry sweep.
//! It is a latch: once tripped it stays tripped, so late waiters return at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

#[derive(Clone)]
pub struct ShutdownSignal {
    latch: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (latch, _) = watch::channel(false);
        Self {
            latch: Arc::new(latch),
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.latch.borrow()
    }

    pub fn trigger(&self) {
        let tripped = self.latch.send_if_modified(|down| {
            if *down {
                return false;
            }
            *down = true;
            true
        });
        if tripped {
            info!("Shutdown signal triggered");
        }
    }

    pub async fn wait(&self) {
        let mut rx = self.latch.subscribe();
        // The sender lives in `self`, so this only returns once tripped.
        let _ = rx.wait_for(|down| *down).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C elsewhere) and trip `shutdown`.
pub async fn listen_for_shutdown_signals(shutdown: ShutdownSignal) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    error!(error = %e, "Failed to install signal handlers");
                    return;
                }
            };

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!(signal = name, "Stopping lounge service");
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }
        info!(signal = "ctrl-c", "Stopping lounge service");
    }

    shutdown.trigger();
}

/// Owns the process-wide signal plus the grace period allowed for in-flight
/// requests and the sweep to wind down.
pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace_secs: u64) -> Self {
        Self {
            signal: ShutdownSignal::new(),
            grace: Duration::from_secs(grace_secs),
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn start_signal_listener(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.signal()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn waiters_wake_on_trigger() {
        let signal = ShutdownSignal::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let s = signal.clone();
                tokio::spawn(async move { s.wait().await })
            })
            .collect();

        signal.trigger();
        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn late_waiter_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();
        assert!(signal.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .unwrap();
    }

    #[test]
    fn coordinator_hands_out_the_same_latch() {
        let coordinator = ShutdownCoordinator::new(5);
        let a = coordinator.signal();
        let b = coordinator.signal();
        a.trigger();
        assert!(b.is_triggered());
        assert_eq!(coordinator.grace(), Duration::from_secs(5));
    }
}
