#![forbid(unsafe_code)]

//! Event payloads delivered to element listeners.

use crate::value::Value;

/// A synchronous UI event.
///
/// `value` models the input payload of the originating control (what a
/// browser would surface as the target's current value); listeners that
/// write state into signals copy it out.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    value: Value,
}

impl Event {
    /// Create an event carrying a payload value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a payload-less event (clicks, focus changes, and the like).
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::Null,
        }
    }

    /// Create an `input` event carrying the control's current text.
    #[must_use]
    pub fn input(text: impl Into<String>) -> Self {
        Self::new("input", text.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}
