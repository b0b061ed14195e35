#![forbid(unsafe_code)]

//! One-shot disposal scopes for reactive subscriptions.
//!
//! A [`CancelScope`] collects the [`Subscription`] guards created during one
//! logical lifetime (in the runtime: one component mount) so they can all be
//! severed by a single [`cancel`](CancelScope::cancel) call. The scope is a
//! shared handle: every listener and synchronizer installed during the
//! lifetime holds the same scope by reference.
//!
//! # Invariants
//!
//! 1. `cancel()` is idempotent: the second and later calls do nothing.
//! 2. Cancellation drops every held guard in one operation; guards that
//!    already self-dropped are simply gone and do not affect the others.
//! 3. `hold()` on a cancelled scope drops the guard immediately, so late
//!    registrations are inert rather than leaked.
//! 4. Cancellation does not retroactively undo effects already delivered.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::signal::Subscription;

struct ScopeInner {
    cancelled: Cell<bool>,
    held: RefCell<Vec<Subscription>>,
}

/// A shared, idempotent cancellation scope.
///
/// Cloning a `CancelScope` creates a new handle to the **same** scope.
#[derive(Clone)]
pub struct CancelScope {
    inner: Rc<ScopeInner>,
}

impl CancelScope {
    /// Create a fresh, un-cancelled scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                cancelled: Cell::new(false),
                held: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register a subscription guard with this scope.
    ///
    /// If the scope is already cancelled the guard is dropped on the spot.
    pub fn hold(&self, sub: Subscription) {
        if self.inner.cancelled.get() {
            drop(sub);
            return;
        }
        self.inner.held.borrow_mut().push(sub);
    }

    /// Cancel the scope, dropping every held guard.
    ///
    /// Idempotent: only the first call releases anything.
    pub fn cancel(&self) {
        if self.inner.cancelled.replace(true) {
            return;
        }
        // Move the guards out before dropping them so a Drop impl that
        // re-enters the scope observes a consistent (empty) state.
        let drained = self.inner.held.take();
        drop(drained);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    /// Number of guards currently held.
    #[must_use]
    pub fn held_count(&self) -> usize {
        self.inner.held.borrow().len()
    }

    /// Whether the scope holds no guards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.held.borrow().is_empty()
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelScope")
            .field("cancelled", &self.inner.cancelled.get())
            .field("held", &self.inner.held.borrow().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
