#![forbid(unsafe_code)]

//! Reactive primitives for Weft.
//!
//! This crate provides the change-tracking core the rest of the runtime is
//! built on:
//!
//! - [`Signal`]: a shared observable value cell with synchronous change
//!   notification via subscriber callbacks.
//! - [`Computed`]: a derived value recomputed eagerly whenever one of its
//!   declared dependency signals changes.
//! - [`Subscription`]: RAII guard that removes a subscriber when dropped.
//! - [`CancelScope`]: a one-shot disposal scope; every subscription held by
//!   the scope is severed by a single idempotent [`CancelScope::cancel`].
//!
//! # Architecture
//!
//! `Signal<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification; the strong half lives in the [`Subscription`] guard.
//!
//! `Computed<T>` subscribes to each declared dependency and pushes the
//! recomputed result through the normal `Signal` setter, so it inherits the
//! equality short-circuit and notification fan-out.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. A panic in one subscriber does not prevent later subscribers from
//!    running.
//! 6. All propagation triggered by a write completes before control returns
//!    to the writer. There is no batching: N writes are N full passes.

pub mod computed;
pub mod scope;
pub mod signal;

pub use computed::Computed;
pub use scope::CancelScope;
pub use signal::{Signal, Subscription};
