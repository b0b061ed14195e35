#![forbid(unsafe_code)]

//! Derived values recomputed eagerly from [`Signal`] dependencies.
//!
//! # Design
//!
//! [`Computed<T>`] pairs a pure function with an explicit, fixed list of
//! dependency signals. Construction evaluates the function once to seed the
//! output; every dependency change re-evaluates it against the *current*
//! values of *all* declared dependencies and assigns the result through the
//! normal [`Signal::set`], so the output inherits the equality
//! short-circuit and the notification fan-out.
//!
//! Propagation is synchronous: the recomputation (and any notification it
//! causes) completes before control returns to whoever wrote the
//! dependency. There is no dirty flag and no deferral. Dependency values
//! are snapshotted before the function runs, so the function never executes
//! under a live borrow of its inputs.
//!
//! The output cell is an ordinary signal, exposed via
//! [`signal`](Computed::signal), so further `Computed`s and direct
//! subscribers can observe it to arbitrary depth.
//!
//! # Dependency cycles
//!
//! Dependency lists are fixed at construction and can only name signals
//! that already exist, so two `Computed`s cannot be made to depend on each
//! other. The one remaining hazard is a compute function that writes one of
//! its own dependencies; a re-entrancy guard detects the nested recompute,
//! reports it as a configuration error, and skips it instead of recursing.
//!
//! # Failure Modes
//!
//! - **Compute function panics during recompute**: the panic is caught and
//!   logged; the output keeps its previous value and later dependency
//!   changes retry normally.
//! - **Computed handle dropped**: the output signal stays alive for anyone
//!   holding it but stops updating, because the dependency subscriptions
//!   live in the handle.

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use crate::scope::CancelScope;
use crate::signal::{Signal, Subscription};

/// A derived signal kept consistent by eager recomputation.
///
/// Cloning a `Computed` creates a new handle to the **same** output cell
/// and keeps the same dependency subscriptions alive.
pub struct Computed<T> {
    out: Signal<T>,
    _deps: Rc<Vec<Subscription>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            out: self.out.clone(),
            _deps: Rc::clone(&self._deps),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed").field("value", &self.out).finish()
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.out.fmt(f)
    }
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    /// Derive from a single signal.
    pub fn from_signal<S: Clone + PartialEq + 'static>(
        source: &Signal<S>,
        f: impl Fn(&S) -> T + 'static,
    ) -> Self {
        let seed = f(&source.get());
        let out = Signal::new(seed);

        let compute = {
            let source = source.clone();
            move || f(&source.get())
        };
        let recompute = guarded(out.clone(), compute);

        let sub = source.subscribe(on_change(&recompute));
        Self {
            out,
            _deps: Rc::new(vec![sub]),
        }
    }

    /// Derive from two signals.
    pub fn from2<S1, S2>(
        d1: &Signal<S1>,
        d2: &Signal<S2>,
        f: impl Fn(&S1, &S2) -> T + 'static,
    ) -> Self
    where
        S1: Clone + PartialEq + 'static,
        S2: Clone + PartialEq + 'static,
    {
        let seed = f(&d1.get(), &d2.get());
        let out = Signal::new(seed);

        let compute = {
            let d1 = d1.clone();
            let d2 = d2.clone();
            move || f(&d1.get(), &d2.get())
        };
        let recompute = guarded(out.clone(), compute);

        let subs = vec![
            d1.subscribe(on_change(&recompute)),
            d2.subscribe(on_change(&recompute)),
        ];
        Self {
            out,
            _deps: Rc::new(subs),
        }
    }

    /// Derive from three signals.
    pub fn from3<S1, S2, S3>(
        d1: &Signal<S1>,
        d2: &Signal<S2>,
        d3: &Signal<S3>,
        f: impl Fn(&S1, &S2, &S3) -> T + 'static,
    ) -> Self
    where
        S1: Clone + PartialEq + 'static,
        S2: Clone + PartialEq + 'static,
        S3: Clone + PartialEq + 'static,
    {
        let seed = f(&d1.get(), &d2.get(), &d3.get());
        let out = Signal::new(seed);

        let compute = {
            let d1 = d1.clone();
            let d2 = d2.clone();
            let d3 = d3.clone();
            move || f(&d1.get(), &d2.get(), &d3.get())
        };
        let recompute = guarded(out.clone(), compute);

        let subs = vec![
            d1.subscribe(on_change(&recompute)),
            d2.subscribe(on_change(&recompute)),
            d3.subscribe(on_change(&recompute)),
        ];
        Self {
            out,
            _deps: Rc::new(subs),
        }
    }

    /// Handle to the output cell, for chaining further `Computed`s or
    /// subscribing downstream consumers.
    #[must_use]
    pub fn signal(&self) -> Signal<T> {
        self.out.clone()
    }

    /// Current derived value.
    #[must_use]
    pub fn get(&self) -> T {
        self.out.get()
    }

    /// Access the current derived value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.out.with(f)
    }

    /// Subscribe to changes of the derived value.
    #[must_use]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.out.subscribe(callback)
    }

    /// Scoped variant of [`subscribe`](Self::subscribe).
    pub fn subscribe_scoped(&self, callback: impl Fn(&T) + 'static, scope: &CancelScope) {
        self.out.subscribe_scoped(callback, scope);
    }

    /// Subscribe and run once eagerly with the current derived value.
    #[must_use]
    pub fn effect(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.out.effect(callback)
    }

    /// Scoped variant of [`effect`](Self::effect).
    pub fn effect_scoped(&self, callback: impl Fn(&T) + 'static, scope: &CancelScope) {
        self.out.effect_scoped(callback, scope);
    }

    /// Version counter of the output cell.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.out.version()
    }
}

/// Wrap `compute` so a recomputation can neither re-enter itself nor tear
/// down the graph when the compute function panics.
fn guarded<T: Clone + PartialEq + 'static>(
    out: Signal<T>,
    compute: impl Fn() -> T + 'static,
) -> Rc<dyn Fn()> {
    let busy = Cell::new(false);
    Rc::new(move || {
        if busy.replace(true) {
            tracing::error!("computed recomputation re-entered its own dependency; skipping");
            return;
        }
        let result = catch_unwind(AssertUnwindSafe(&compute));
        busy.set(false);
        match result {
            Ok(next) => out.set(next),
            Err(_) => {
                tracing::error!("compute function panicked; keeping previous value");
            }
        }
    })
}

/// Adapter from a dependency's typed notification to the untyped recompute.
fn on_change<S: 'static>(recompute: &Rc<dyn Fn()>) -> impl Fn(&S) + 'static {
    let recompute = Rc::clone(recompute);
    move |_value: &S| (*recompute)()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn single_dep_computed() {
        let source = Signal::new(10);
        let doubled = Computed::from_signal(&source, |v| v * 2);
        assert_eq!(doubled.get(), 20);

        source.set(5);
        assert_eq!(doubled.get(), 10);
    }

    #[test]
    fn multi_dep_recomputes_against_all_current_values() {
        let width = Signal::new(10);
        let height = Signal::new(20);
        let area = Computed::from2(&width, &height, |w, h| w * h);
        assert_eq!(area.get(), 200);

        width.set(5);
        assert_eq!(area.get(), 100);
        height.set(30);
        assert_eq!(area.get(), 150);
    }

    #[test]
    fn three_dep_computed() {
        let a = Signal::new(1);
        let b = Signal::new(2);
        let c = Signal::new(3);
        let sum = Computed::from3(&a, &b, &c, |x, y, z| x + y + z);
        assert_eq!(sum.get(), 6);

        a.set(10);
        assert_eq!(sum.get(), 15);
        c.set(100);
        assert_eq!(sum.get(), 112);
    }

    #[test]
    fn recompute_is_synchronous_and_precedes_later_observers() {
        // A subscriber registered on the dependency *after* the computed
        // must already see the recomputed value when it runs.
        let source = Signal::new(1);
        let tripled = Computed::from_signal(&source, |v| v * 3);

        let observed = Rc::new(Cell::new(0));
        let o = Rc::clone(&observed);
        let t = tripled.clone();
        let _sub = source.subscribe(move |_| o.set(t.get()));

        source.set(4);
        assert_eq!(observed.get(), 12);
    }

    #[test]
    fn inherits_equality_short_circuit() {
        let source = Signal::new(2);
        // Collapses distinct inputs onto the same output.
        let parity = Computed::from_signal(&source, |v| v % 2);

        let fired = Rc::new(Cell::new(0u32));
        let f = Rc::clone(&fired);
        let _sub = parity.subscribe(move |_| f.set(f.get() + 1));

        source.set(4); // parity unchanged: no downstream notification
        assert_eq!(fired.get(), 0);
        source.set(5); // parity flips
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn chains_of_computeds() {
        let base = Signal::new(1);
        let plus_one = Computed::from_signal(&base, |v| v + 1);
        let doubled = Computed::from_signal(&plus_one.signal(), |v| v * 2);
        let described = Computed::from_signal(&doubled.signal(), |v| format!("= {v}"));

        assert_eq!(described.get(), "= 4");
        base.set(10);
        assert_eq!(plus_one.get(), 11);
        assert_eq!(doubled.get(), 22);
        assert_eq!(described.get(), "= 22");
    }

    #[test]
    fn diamond_dependency_settles() {
        let a = Signal::new(10);
        let b = Computed::from_signal(&a, |v| v + 1);
        let c = Computed::from_signal(&a, |v| v * 2);
        let d = Computed::from2(&b.signal(), &c.signal(), |x, y| x + y);

        assert_eq!(d.get(), 31);
        a.set(5);
        assert_eq!(b.get(), 6);
        assert_eq!(c.get(), 10);
        assert_eq!(d.get(), 16);
    }

    #[test]
    fn effect_on_computed_is_eager() {
        let source = Signal::new(2);
        let squared = Computed::from_signal(&source, |v| v * v);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = squared.effect(move |v| s.borrow_mut().push(*v));

        assert_eq!(*seen.borrow(), vec![4]);
        source.set(3);
        assert_eq!(*seen.borrow(), vec![4, 9]);
    }

    #[test]
    fn clone_shares_output() {
        let source = Signal::new(1);
        let c1 = Computed::from_signal(&source, |v| v + 1);
        let c2 = c1.clone();

        source.set(5);
        assert_eq!(c1.get(), 6);
        assert_eq!(c2.get(), 6);
    }

    #[test]
    fn dropping_handle_stops_updates_but_keeps_output_alive() {
        let source = Signal::new(1);
        let out = {
            let computed = Computed::from_signal(&source, |v| v * 10);
            computed.signal()
        };
        // The computed handle (and its dependency subscriptions) are gone.
        assert_eq!(out.get(), 10);
        source.set(2);
        assert_eq!(out.get(), 10);
    }

    #[test]
    fn string_computed() {
        let first = Signal::new("John".to_string());
        let last = Signal::new("Doe".to_string());
        let full = Computed::from2(&first, &last, |f, l| format!("{f} {l}"));

        assert_eq!(full.get(), "John Doe");
        first.set("Jane".to_string());
        assert_eq!(full.get(), "Jane Doe");
        last.set("Smith".to_string());
        assert_eq!(full.get(), "Jane Smith");
    }

    #[test]
    fn panicking_compute_keeps_previous_value() {
        let source = Signal::new(2);
        let halved = Computed::from_signal(&source, |v| {
            assert!(v % 2 == 0, "odd input");
            v / 2
        });
        assert_eq!(halved.get(), 1);

        source.set(3); // compute panics; caught and logged
        assert_eq!(halved.get(), 1);

        source.set(8); // recomputation resumes
        assert_eq!(halved.get(), 4);
    }

    #[test]
    fn compute_fn_writing_its_own_dependency_is_cut_short() {
        let source = Signal::new(1);
        let sig = source.clone();
        // Pathological: the compute function writes its own dependency.
        let computed = Computed::from_signal(&source, move |v| {
            if *v == 5 {
                sig.set(v + 100);
            }
            *v
        });

        source.set(5);
        // The guard stops the nested recompute; no unbounded recursion.
        assert_eq!(computed.get(), 5);
        assert_eq!(source.get(), 105);
    }
}
