// ABOUTME: Typed publish/subscribe broadcaster used by every synchronization component
// ABOUTME: Listener snapshots make subscribe/unsubscribe from inside a callback safe
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Event Broadcasting
//!
//! [`Broadcaster`] holds a registry of callbacks and fans every event out to the
//! listeners registered at the moment of emission. The listener list is copied
//! before iteration and the registry lock is released before any callback runs,
//! so a callback may subscribe, unsubscribe (for example a component tearing down
//! mid-notify) or emit again without deadlocking or disturbing the current fan-out.
//!
//! [`Subscription`] is the lifetime-scoped handle a consumer keeps; dropping it
//! unsubscribes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener<E>)>>,
}

impl<E> Registry<E> {
    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Listener<E>)>> {
        self.listeners.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Event listener registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn remove(&self, id: u64) {
        self.lock().retain(|(listener_id, _)| *listener_id != id);
    }
}

/// Synchronous fan-out of typed events to registered callbacks
pub struct Broadcaster<E> {
    registry: Arc<Registry<E>>,
}

impl<E> Clone for Broadcaster<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E> Default for Broadcaster<E> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl<E: 'static> Broadcaster<E> {
    /// Create an empty broadcaster
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it stays registered until the returned handle is dropped
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.lock().push((id, Arc::new(callback)));

        let registry: Weak<Registry<E>> = Arc::downgrade(&self.registry);
        Subscription {
            id,
            dispose: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.remove(id);
                }
            })),
        }
    }

    /// Deliver `event` to every listener registered right now
    pub fn emit(&self, event: &E) {
        let listeners: Vec<Listener<E>> = self
            .registry
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    /// Number of registered listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Drop every listener; outstanding [`Subscription`]s become no-ops
    pub fn clear(&self) {
        self.registry.lock().clear();
    }
}

/// Handle for one registered callback; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    dispose: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Unsubscribe now
    pub fn unsubscribe(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }

    /// Keep the callback registered for the broadcaster's whole lifetime
    pub fn detach(mut self) {
        self.dispose = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.dispose.is_some())
            .finish()
    }
}
