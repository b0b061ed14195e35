#![forbid(unsafe_code)]

//! Observable value cells with synchronous change notification.
//!
//! # Design
//!
//! [`Signal<T>`] is a shared handle (`Clone` shares state) over an
//! `Rc<RefCell<..>>` interior. Each subscriber callback is owned by the
//! [`Subscription`] guard returned from [`subscribe`](Signal::subscribe);
//! the signal itself keeps only a `Weak` reference. Dropping the guard
//! therefore removes the subscriber without touching the signal, and a
//! subscriber that removes itself mid-notification cannot corrupt the
//! in-progress loop: the weak pointer simply stops upgrading.
//!
//! # Invariants
//!
//! 1. [`set`](Signal::set) with an equal value performs no notification and
//!    no version bump.
//! 2. Live subscribers are notified synchronously, in registration order,
//!    with a reference to the new value.
//! 3. A panicking subscriber is isolated: the panic is caught and logged,
//!    and the remaining subscribers still run.
//! 4. Notification completes before `set` returns to the writer.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use crate::scope::CancelScope;

type Callback<T> = Box<dyn Fn(&T)>;

struct SignalInner<T> {
    value: T,
    /// Bumped once per mutation that changes the value.
    version: u64,
    /// Weak halves of the subscriber callbacks, in registration order.
    subscribers: Vec<Weak<Callback<T>>>,
    /// Notification nesting depth; dead entries are pruned only at depth 0
    /// so re-entrant writes never shift indices under an in-progress loop.
    notify_depth: Cell<u32>,
}

/// RAII guard for a registered subscriber.
///
/// The guard owns the callback; dropping it removes the subscriber before
/// the next notification cycle. Guards are type-erased so a
/// [`CancelScope`] can hold subscriptions from signals of mixed types.
pub struct Subscription {
    _anchor: Rc<dyn Any>,
}

impl Subscription {
    pub(crate) fn new(anchor: Rc<dyn Any>) -> Self {
        Self { _anchor: anchor }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

/// A shared observable value cell.
///
/// Cloning a `Signal` creates a new handle to the **same** cell; writes
/// through any handle notify subscribers registered through every handle.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.borrow().value.fmt(f)
    }
}

impl<T: Default + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: 'static> Signal<T> {
    /// Create a new signal holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                version: 0,
                subscribers: Vec::new(),
                notify_depth: Cell::new(0),
            })),
        }
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Register `callback` to run on every value change.
    ///
    /// Returns the RAII guard owning the callback. Dropping the guard
    /// unsubscribes.
    #[must_use]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(Box::new(callback));
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Register `callback` against `scope`: the subscription lives until
    /// the scope is cancelled.
    pub fn subscribe_scoped(&self, callback: impl Fn(&T) + 'static, scope: &CancelScope) {
        scope.hold(self.subscribe(callback));
    }

    /// Version counter. Increments by exactly 1 per value change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of currently live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Return a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Store `value` and notify subscribers.
    ///
    /// If `value` equals the current value this is a complete no-op: no
    /// version bump, no notifications.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Read-modify-write through the same equality gate as [`set`](Self::set).
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Subscribe `callback`, then immediately invoke it once with the
    /// current value.
    ///
    /// The eager initial run lets callers establish initial state and react
    /// to later changes through one code path.
    #[must_use]
    pub fn effect(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback = Rc::new(callback);
        let sub = self.subscribe({
            let callback = Rc::clone(&callback);
            move |value: &T| (*callback)(value)
        });
        let current = self.get();
        (*callback)(&current);
        sub
    }

    /// [`effect`](Self::effect) registered against `scope`.
    pub fn effect_scoped(&self, callback: impl Fn(&T) + 'static, scope: &CancelScope) {
        scope.hold(self.effect(callback));
    }

    /// Invoke every live subscriber with the current value, in registration
    /// order.
    ///
    /// Each weak entry is upgraded immediately before its call, so a
    /// subscriber removed mid-notification (including by an earlier
    /// subscriber) is skipped. Subscribers registered mid-notification are
    /// not invoked until the next cycle. No borrow is held while a callback
    /// runs, so callbacks may freely read, write, subscribe, or
    /// unsubscribe.
    fn notify(&self) {
        let (value, count) = {
            let inner = self.inner.borrow();
            inner.notify_depth.set(inner.notify_depth.get() + 1);
            (inner.value.clone(), inner.subscribers.len())
        };
        for index in 0..count {
            let callback = {
                let inner = self.inner.borrow();
                inner.subscribers.get(index).and_then(Weak::upgrade)
            };
            let Some(callback) = callback else { continue };
            if catch_unwind(AssertUnwindSafe(|| (*callback)(&value))).is_err() {
                tracing::error!("signal subscriber panicked; continuing notification");
            }
        }
        let mut inner = self.inner.borrow_mut();
        inner.notify_depth.set(inner.notify_depth.get() - 1);
        if inner.notify_depth.get() == 0 {
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
