//! # Signal
//!
//! A single-slot rendezvous flag with two states, unset and set.
//!
//! - `set` moves it to set and wakes the waiter; setting it again is a no-op
//! - `clear` returns it to unset
//! - `wait` resolves as soon as the flag is set (immediately if it already is)
//!
//! Built on `tokio::sync::watch`, so a waiter sleeps until the value changes
//! instead of polling a boolean. Every signal in this crate has exactly one
//! waiter: the interview task.

use tokio::sync::watch;

#[derive(Debug)]
pub struct Signal {
    state: watch::Sender<bool>,
}

impl Signal {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    /// Set the flag. Returns `false` if it was already set.
    pub fn set(&self) -> bool {
        self.state.send_if_modified(|set| {
            if *set {
                false
            } else {
                *set = true;
                true
            }
        })
    }

    /// Return the flag to unset. Returns `true` if it was set.
    pub fn clear(&self) -> bool {
        self.state.send_if_modified(|set| std::mem::replace(set, false))
    }

    pub fn is_set(&self) -> bool {
        *self.state.borrow()
    }

    /// Suspend until the flag is set.
    pub async fn wait(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = receiver.wait_for(|set| *set).await;
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_set_is_idempotent() {
        let signal = Signal::new();
        assert!(!signal.is_set());
        assert!(signal.set());
        assert!(!signal.set());
        assert!(signal.is_set());
    }

    #[test]
    fn test_clear() {
        let signal = Signal::new();
        assert!(!signal.clear());
        signal.set();
        assert!(signal.clear());
        assert!(!signal.is_set());
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_set() {
        let signal = Signal::new();
        signal.set();
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("wait should not block on a set signal");
    }

    #[tokio::test]
    async fn test_set_wakes_waiter() {
        let signal = Arc::new(Signal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.wait().await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        signal.set();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_clear_does_not_wake_waiter() {
        let signal = Arc::new(Signal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.wait().await })
        };

        tokio::task::yield_now().await;
        signal.clear();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        signal.set();
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }
}
