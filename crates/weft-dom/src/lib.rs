#![forbid(unsafe_code)]

//! Detached element tree, markup parsing, and entity encoding for Weft.
//!
//! The runtime binds templates against this tree instead of a live browser
//! DOM: elements carry attributes, typed properties, children, and event
//! listeners, and event delivery is an explicit synchronous
//! [`Element::emit`] call. That keeps every binder and lifecycle rule
//! observable from plain unit tests.
//!
//! Modules:
//!
//! - [`value`]: the payload type properties and event payloads travel as.
//! - [`escape`]: entity encoding, [`SafeHtml`] tagging, and the [`html!`]
//!   interpolation macro.
//! - [`node`]: [`Element`], [`Node`], and [`Fragment`].
//! - [`event`]: the [`Event`] payload type.
//! - [`parser`]: markup text to [`Fragment`].

pub mod escape;
pub mod event;
pub mod node;
pub mod parser;
pub mod value;

pub use escape::{SafeHtml, encode};
pub use event::Event;
pub use node::{Element, Fragment, Node};
pub use parser::{ParseError, parse_fragment};
pub use value::Value;
