//! One-shot completions for asynchronous native steps.
//!
//! Backends hand out a [`Pending`] for every asynchronous step and resolve it
//! through the paired [`Completer`] from whichever thread the platform
//! completes on. The capture session joins on each one in turn, which turns
//! chained native completions into blocking calls.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::error::NativeError;

enum Slot<T> {
    Waiting,
    Done(Result<T, NativeError>),
    Taken,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn resolve(&self, result: Result<T, NativeError>) {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Waiting) {
            *slot = Slot::Done(result);
            self.ready.notify_all();
        }
    }
}

/// The waiting side of an asynchronous step.
#[must_use = "a pending operation does nothing unless waited on"]
pub struct Pending<T> {
    shared: Arc<Shared<T>>,
}

/// The resolving side of an asynchronous step.
///
/// Dropping a completer without calling [`complete`](Self::complete)
/// resolves the operation as abandoned.
pub struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Pending<T> {
    /// Create an unresolved operation and its completer.
    pub fn channel() -> (Completer<T>, Pending<T>) {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot::Waiting),
            ready: Condvar::new(),
        });
        (
            Completer {
                shared: Some(Arc::clone(&shared)),
            },
            Pending { shared },
        )
    }

    /// An operation that has already resolved.
    pub fn ready(result: Result<T, NativeError>) -> Self {
        let (completer, pending) = Self::channel();
        completer.complete(result);
        pending
    }

    pub fn is_complete(&self) -> bool {
        !matches!(*self.shared.slot.lock(), Slot::Waiting)
    }

    /// Block until the operation resolves, or until `timeout` elapses.
    pub fn wait(self, timeout: Option<Duration>) -> Result<T, NativeError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut slot = self.shared.slot.lock();

        while matches!(*slot, Slot::Waiting) {
            match deadline {
                Some(deadline) => {
                    if self.shared.ready.wait_until(&mut slot, deadline).timed_out()
                        && matches!(*slot, Slot::Waiting)
                    {
                        return Err(NativeError::timed_out());
                    }
                }
                None => self.shared.ready.wait(&mut slot),
            }
        }

        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Done(result) => result,
            Slot::Waiting | Slot::Taken => Err(NativeError::abandoned()),
        }
    }
}

impl<T: Send + 'static> Pending<T> {
    /// Run `step` on a named background thread and resolve with its result.
    pub fn spawn<F>(name: &str, step: F) -> Self
    where
        F: FnOnce() -> Result<T, NativeError> + Send + 'static,
    {
        let (completer, pending) = Self::channel();
        let spawned = thread::Builder::new()
            .name(name.into())
            .spawn(move || completer.complete(step()));

        match spawned {
            Ok(_) => pending,
            Err(e) => Self::ready(Err(NativeError::failed(format!(
                "failed to spawn {} thread: {}",
                name, e
            )))),
        }
    }
}

impl<T> Completer<T> {
    pub fn complete(mut self, result: Result<T, NativeError>) {
        if let Some(shared) = self.shared.take() {
            shared.resolve(result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.resolve(Err(NativeError::abandoned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_resolves_immediately() {
        let pending = Pending::ready(Ok(7));
        assert!(pending.is_complete());
        assert_eq!(pending.wait(None), Ok(7));
    }

    #[test]
    fn completes_from_another_thread() {
        let (completer, pending) = Pending::<&str>::channel();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.complete(Ok("done"));
        });

        assert_eq!(pending.wait(None), Ok("done"));
        handle.join().unwrap();
    }

    #[test]
    fn dropped_completer_abandons() {
        let (completer, pending) = Pending::<()>::channel();
        drop(completer);
        assert_eq!(pending.wait(None), Err(NativeError::abandoned()));
    }

    #[test]
    fn wait_times_out() {
        let (_completer, pending) = Pending::<()>::channel();
        let result = pending.wait(Some(Duration::from_millis(10)));
        assert!(result.unwrap_err().is_timeout());
    }

    #[test]
    fn spawn_propagates_failure() {
        let pending: Pending<u32> = Pending::spawn("test-step", || Err(NativeError::failed("boom")));
        assert_eq!(pending.wait(None), Err(NativeError::failed("boom")));

        let pending = Pending::spawn("test-step", || Ok(42u32));
        assert_eq!(pending.wait(Some(Duration::from_secs(5))), Ok(42));
    }
}
