use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::NativeError;
use crate::traits::capture_backend::{FailureListener, ListenerToken};

/// Failure-listener registry for backends to embed.
#[derive(Default)]
pub struct FailureListeners {
    inner: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    next_token: u64,
    entries: Vec<(ListenerToken, FailureListener)>,
}

impl FailureListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: FailureListener) -> ListenerToken {
        let mut registry = self.inner.lock();
        registry.next_token += 1;
        let token = ListenerToken(registry.next_token);
        registry.entries.push((token, listener));
        token
    }

    /// Returns false if the token was not registered.
    pub fn unsubscribe(&self, token: ListenerToken) -> bool {
        let mut registry = self.inner.lock();
        let before = registry.entries.len();
        registry.entries.retain(|(t, _)| *t != token);
        registry.entries.len() != before
    }

    /// Invoke every registered listener. Listeners run outside the lock so
    /// they may unsubscribe.
    pub fn notify(&self, error: &NativeError) {
        let listeners: Vec<FailureListener> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(error);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
