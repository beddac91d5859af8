// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! Graceful shutdown for the daemon: a clone-able cancellation token, a
//! coordinator enforcing a grace period, and OS signal wiring.
//!
//! The daemon's main task installs the signal listener and then waits on
//! the token; SIGINT or SIGTERM cancels it. Cleanup (closing the processor,
//! running plugin shutdown callbacks) happens after the token fires, bounded
//! by the grace period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

/// Default grace period for cleanup after a shutdown signal
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;

/// Clone-able cancellation token passed to async tasks.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    /// Create a new, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token, waking all waiters
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Check cancellation without blocking
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until the token is cancelled
    pub async fn cancelled(&self) {
        // notify_waiters wakes only registered waiters: enable the waiter
        // before re-checking the flag to avoid a lost wakeup
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Coordinates graceful shutdown with a grace period.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    grace_period: Duration,
    complete: Arc<Notify>,
}

impl ShutdownCoordinator {
    /// Create a coordinator with the given cleanup grace period
    pub fn new(grace_period: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            grace_period,
            complete: Arc::new(Notify::new()),
        }
    }

    /// Token to hand to tasks that should observe shutdown
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// True once shutdown has been initiated
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Initiate shutdown, cancelling every token
    pub fn initiate_shutdown(&self) {
        if !self.token.is_cancelled() {
            tracing::info!(grace_period = ?self.grace_period, "initiating graceful shutdown");
            self.token.cancel();
        }
    }

    /// Signal that cleanup finished
    pub fn complete_shutdown(&self) {
        self.complete.notify_waiters();
    }

    /// Wait for cleanup to complete or the grace period to expire.
    ///
    /// Returns `true` when cleanup finished in time.
    pub async fn wait_for_shutdown(&self) -> bool {
        tokio::select! {
            _ = self.complete.notified() => true,
            _ = tokio::time::sleep(self.grace_period) => {
                tracing::warn!("shutdown grace period expired");
                false
            }
        }
    }

    /// Install an OS signal listener that initiates shutdown on SIGINT or
    /// SIGTERM. Returns immediately; the listener runs in the background.
    pub fn listen_for_signals(&self) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            coordinator.initiate_shutdown();
        });
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS))
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            tracing::error!(%err, "installing SIGTERM handler failed");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received ctrl-c");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
    }

    #[tokio::test]
    async fn test_coordinator_grace_period() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(20));
        coordinator.initiate_shutdown();
        assert!(coordinator.is_shutting_down());
        // nothing calls complete_shutdown, so the grace period expires
        assert!(!coordinator.wait_for_shutdown().await);
    }

    #[tokio::test]
    async fn test_coordinator_completes_in_time() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.initiate_shutdown();
        let signaller = coordinator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            signaller.complete_shutdown();
        });
        assert!(coordinator.wait_for_shutdown().await);
    }
}
