//! One-shot cancellation signal
//!
//! A run owns exactly one [`ShutdownSignal`]. The signal transitions from
//! not-cancelled to cancelled once and never resets; every subscriber
//! observes the transition even if it was already blocked when the signal
//! fired.

use tokio::sync::watch;

/// Broadcast cancellation flag for one run
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    /// Shutdown sender
    tx: watch::Sender<bool>,

    /// Shutdown receiver kept alive for late subscribers
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Create a new, untriggered signal
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Subscribe to the signal
    ///
    /// Waiters should use `wait_for(|cancelled| *cancelled)` so a trigger
    /// that happened before the wait started is still observed.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    /// Trigger cancellation
    ///
    /// Idempotent: only the first call changes state, later calls wake
    /// nobody.
    pub fn trigger(&self) {
        self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        });
    }

    /// Whether cancellation has fired
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Spawn a task that triggers the signal on Ctrl+C
    ///
    /// The task lives for the rest of the process; a second Ctrl+C has no
    /// further effect on the signal.
    pub fn trigger_on_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Interrupt received, stopping admissions");
                    signal.trigger();
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {e}");
                }
            }
        });
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_untriggered() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
    }

    #[tokio::test]
    async fn test_trigger_is_observed() {
        let signal = ShutdownSignal::new();
        let mut rx = signal.subscribe();

        signal.trigger();
        assert!(signal.is_triggered());
        rx.wait_for(|cancelled| *cancelled).await.unwrap();
    }

    #[tokio::test]
    async fn test_trigger_before_subscribe_is_not_missed() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        // A waiter arriving after the trigger must still see it.
        let mut rx = signal.subscribe();
        rx.wait_for(|cancelled| *cancelled).await.unwrap();
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let signal = ShutdownSignal::new();
        let mut rx = signal.subscribe();

        signal.trigger();
        signal.trigger();
        signal.trigger();

        rx.wait_for(|cancelled| *cancelled).await.unwrap();
        assert!(signal.is_triggered());

        // The second and third triggers must not have queued another change.
        assert!(!rx.has_changed().unwrap());
    }
}
