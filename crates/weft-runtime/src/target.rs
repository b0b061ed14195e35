#![forbid(unsafe_code)]

//! The bind-target capability: what a host exposes to the binder.
//!
//! The original's directives name dynamic properties on the host object.
//! Rust has no property reflection, so a host instead publishes an ordered
//! directory of named [`Member`]s:
//!
//! - `Handler` — a callable invoked with the triggering [`Event`];
//! - `Cell` — a reactive value cell (a [`Signal`] or [`Computed`]) with a
//!   settable value and an effect-style hook;
//! - `Value` — a plain snapshot value with no change notification of its
//!   own.
//!
//! Plain members participate in updates through the conventional change
//! notification: the host calls [`Members::mark_changed`] after mutating
//! them, and every synchronizer subscribed via
//! [`BindTarget::subscribe_change`] re-reads.

use std::cell::RefCell;
use std::rc::Rc;

use weft_dom::{Event, Value};
use weft_reactive::{CancelScope, Computed, Signal};

// ---------------------------------------------------------------------------
// Value conversion
// ---------------------------------------------------------------------------

/// Conversion between a host-side type and the binder's [`Value`].
///
/// `from_value` is allowed to fail (e.g. non-numeric text written into a
/// numeric cell); the write is then dropped with a diagnostic.
pub trait ValueConvert: Clone + PartialEq + 'static {
    fn to_value(&self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

impl ValueConvert for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl ValueConvert for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.to_text())
    }
}

impl ValueConvert for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl ValueConvert for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(v) => Some(*v as f64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl ValueConvert for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            Value::Text(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ValueCell — type-erased reactive cell
// ---------------------------------------------------------------------------

/// Object-safe view of a reactive value cell.
pub trait ValueCell {
    /// Current value, converted for the binder.
    fn read(&self) -> Value;

    /// Write a value into the cell, converting from [`Value`]. Writes that
    /// fail conversion are dropped with a diagnostic.
    fn write(&self, value: &Value);

    /// Register `setter` to run eagerly now and again on every future
    /// change, until `scope` is cancelled.
    fn bind(&self, setter: Rc<dyn Fn(&Value)>, scope: &CancelScope);
}

impl<T: ValueConvert> ValueCell for Signal<T> {
    fn read(&self) -> Value {
        self.with(ValueConvert::to_value)
    }

    fn write(&self, value: &Value) {
        match T::from_value(value) {
            Some(converted) => self.set(converted),
            None => tracing::warn!(value = %value, "unconvertible write into signal cell dropped"),
        }
    }

    fn bind(&self, setter: Rc<dyn Fn(&Value)>, scope: &CancelScope) {
        self.effect_scoped(move |v| (*setter)(&v.to_value()), scope);
    }
}

impl<T: ValueConvert> ValueCell for Computed<T> {
    fn read(&self) -> Value {
        self.with(ValueConvert::to_value)
    }

    fn write(&self, value: &Value) {
        // Writing through a derived cell is permitted (the next dependency
        // change overwrites it), mirroring the output being a plain signal.
        self.signal().write(value);
    }

    fn bind(&self, setter: Rc<dyn Fn(&Value)>, scope: &CancelScope) {
        self.effect_scoped(move |v| (*setter)(&v.to_value()), scope);
    }
}

// ---------------------------------------------------------------------------
// Member and BindTarget
// ---------------------------------------------------------------------------

/// One named capability a host exposes to directives.
#[derive(Clone)]
pub enum Member {
    Handler(Rc<dyn Fn(&Event)>),
    Cell(Rc<dyn ValueCell>),
    Value(Value),
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler"),
            Self::Cell(cell) => f.debug_tuple("Cell").field(&cell.read()).finish(),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

/// The capability the binder resolves directive references against.
pub trait BindTarget {
    /// Exact-name member lookup.
    fn member(&self, name: &str) -> Option<Member>;

    /// Member names in registration order, for case-insensitive property
    /// resolution.
    fn member_names(&self) -> Vec<String>;

    /// Write a raw value to a member (the default event-directive path).
    /// Writes into a `Cell` go through the cell; anything else becomes a
    /// plain `Value` member.
    fn write_member(&self, name: &str, value: &Value);

    /// Subscribe to the conventional change notification for plain
    /// members. Returns false when the target has none.
    fn subscribe_change(&self, callback: Rc<dyn Fn()>, scope: &CancelScope) -> bool;

    /// Current readable value of a member, if it has one.
    fn read_member(&self, name: &str) -> Option<Value> {
        match self.member(name)? {
            Member::Cell(cell) => Some(cell.read()),
            Member::Value(value) => Some(value),
            Member::Handler(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Members — the concrete host-state directory
// ---------------------------------------------------------------------------

/// Ordered directory of named members, plus the revision pulse backing the
/// conventional change notification.
pub struct Members {
    entries: RefCell<Vec<(String, Member)>>,
    revision: Signal<u64>,
}

impl Members {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            revision: Signal::new(0),
        }
    }

    /// Register a handler member.
    #[must_use]
    pub fn with_handler(self, name: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        self.insert(name, Member::Handler(Rc::new(handler)));
        self
    }

    /// Register a reactive cell member.
    #[must_use]
    pub fn with_cell(self, name: impl Into<String>, cell: impl ValueCell + 'static) -> Self {
        self.insert(name, Member::Cell(Rc::new(cell)));
        self
    }

    /// Register a plain value member.
    #[must_use]
    pub fn with_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, Member::Value(value.into()));
        self
    }

    /// Insert or replace a member under `name`.
    pub fn insert(&self, name: impl Into<String>, member: Member) {
        let name = name.into();
        let mut entries = self.entries.borrow_mut();
        if let Some(slot) = entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = member;
        } else {
            entries.push((name, member));
        }
    }

    /// Announce that plain members changed; re-runs every synchronizer
    /// subscribed through [`BindTarget::subscribe_change`].
    pub fn mark_changed(&self) {
        self.revision.update(|r| *r += 1);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Default for Members {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Members {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Members")
            .field("names", &self.member_names())
            .finish()
    }
}

impl BindTarget for Members {
    fn member(&self, name: &str) -> Option<Member> {
        self.entries
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m.clone())
    }

    fn member_names(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    fn write_member(&self, name: &str, value: &Value) {
        if let Some(Member::Cell(cell)) = self.member(name) {
            cell.write(value);
            return;
        }
        // Plain (or absent) member: store the raw value. No notification —
        // plain writes are announced explicitly via `mark_changed`.
        self.insert(name, Member::Value(value.clone()));
    }

    fn subscribe_change(&self, callback: Rc<dyn Fn()>, scope: &CancelScope) -> bool {
        self.revision
            .subscribe_scoped(move |_| (*callback)(), scope);
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn signal_cell_roundtrip() {
        let signal = Signal::new(String::from("a"));
        let cell: &dyn ValueCell = &signal;
        assert_eq!(cell.read(), Value::Text("a".into()));

        cell.write(&Value::Text("b".into()));
        assert_eq!(signal.get(), "b");
    }

    #[test]
    fn numeric_cell_parses_text_payloads() {
        let signal = Signal::new(0i64);
        let cell: &dyn ValueCell = &signal;
        cell.write(&Value::Text(" 42 ".into()));
        assert_eq!(signal.get(), 42);

        // Unconvertible writes are dropped.
        cell.write(&Value::Text("not a number".into()));
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn cell_bind_is_eager_and_scoped() {
        let signal = Signal::new(1i64);
        let scope = CancelScope::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let cell: &dyn ValueCell = &signal;
        cell.bind(Rc::new(move |v| s.borrow_mut().push(v.clone())), &scope);

        assert_eq!(*seen.borrow(), vec![Value::Int(1)]);
        signal.set(2);
        assert_eq!(*seen.borrow(), vec![Value::Int(1), Value::Int(2)]);

        scope.cancel();
        signal.set(3);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn computed_cell_reads_derived_value() {
        let base = Signal::new(2i64);
        let doubled = Computed::from_signal(&base, |v| v * 2);
        let cell: &dyn ValueCell = &doubled;
        assert_eq!(cell.read(), Value::Int(4));

        base.set(5);
        assert_eq!(cell.read(), Value::Int(10));
    }

    #[test]
    fn members_lookup_and_order() {
        let members = Members::new()
            .with_value("first", "1")
            .with_handler("poke", |_| {})
            .with_cell("count", Signal::new(0i64));

        assert_eq!(members.member_names(), vec!["first", "poke", "count"]);
        assert!(matches!(members.member("poke"), Some(Member::Handler(_))));
        assert!(members.member("missing").is_none());
        assert_eq!(members.read_member("first"), Some(Value::Text("1".into())));
        assert_eq!(members.read_member("poke"), None);
    }

    #[test]
    fn write_member_routes_through_cells() {
        let count = Signal::new(0i64);
        let members = Members::new().with_cell("count", count.clone());

        members.write_member("count", &Value::Int(9));
        assert_eq!(count.get(), 9);

        // Absent member: stored as a plain value.
        members.write_member("note", &Value::Text("hi".into()));
        assert_eq!(members.read_member("note"), Some(Value::Text("hi".into())));
    }

    #[test]
    fn mark_changed_drives_change_subscribers() {
        let members = Members::new().with_value("label", "a");
        let scope = CancelScope::new();
        let fired = Rc::new(Cell::new(0u32));
        let f = Rc::clone(&fired);
        assert!(members.subscribe_change(Rc::new(move || f.set(f.get() + 1)), &scope));

        members.mark_changed();
        members.mark_changed();
        assert_eq!(fired.get(), 2);

        scope.cancel();
        members.mark_changed();
        assert_eq!(fired.get(), 2);
    }
}
