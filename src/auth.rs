// ABOUTME: Authentication signal consumed by the synchronization layer
// ABOUTME: Watch channel carrying a single is-authenticated flag
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use tokio::sync::watch;

/// "Is the user authenticated" signal shared between the login flow and the sync layer.
///
/// Losing authentication is a reset trigger for every component, not an error.
#[derive(Clone, Debug)]
pub struct AuthSignal {
    tx: watch::Sender<bool>,
}

impl AuthSignal {
    /// Create a signal with the given initial state
    #[must_use]
    pub fn new(authenticated: bool) -> Self {
        let (tx, _rx) = watch::channel(authenticated);
        Self { tx }
    }

    /// Publish a new state; repeated identical values are not re-announced
    pub fn set_authenticated(&self, authenticated: bool) {
        self.tx.send_if_modified(|current| {
            if *current == authenticated {
                false
            } else {
                *current = authenticated;
                true
            }
        });
    }

    /// Current state
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver that observes every change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for AuthSignal {
    fn default() -> Self {
        Self::new(false)
    }
}
