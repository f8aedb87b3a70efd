//! Serialized access from many threads.
//!
//! Every call through [`SharedCustody::execute`] holds the engine lock for its
//! whole duration, so operations from different threads land on one total
//! order and nobody observes a half-finished call.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::clock::SystemClock;
use crate::custody::Custody;
use crate::events::TracingSink;

/// A cloneable handle to one engine.
pub struct SharedCustody<T, C = SystemClock, S = TracingSink> {
    inner: Arc<Mutex<Custody<T, C, S>>>,
}

impl<T, C, S> SharedCustody<T, C, S> {
    /// Wrap an engine.
    #[must_use]
    pub fn new(custody: Custody<T, C, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(custody)),
        }
    }

    /// Run `f` as one indivisible step on the shared timeline.
    pub fn execute<R>(&self, f: impl FnOnce(&mut Custody<T, C, S>) -> R) -> R {
        let mut custody = self.inner.lock();
        f(&mut custody)
    }

    /// Run a read-only query.
    pub fn read<R>(&self, f: impl FnOnce(&Custody<T, C, S>) -> R) -> R {
        let custody = self.inner.lock();
        f(&custody)
    }
}

impl<T, C, S> Clone for SharedCustody<T, C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
