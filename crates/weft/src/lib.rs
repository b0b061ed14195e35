#![forbid(unsafe_code)]

//! Weft public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use weft_dom::html;

pub mod prelude {
    pub use weft_dom as dom;
    pub use weft_reactive as reactive;
    pub use weft_runtime as runtime;

    pub use weft_dom::{Element, Event, Fragment, Node, SafeHtml, Value, encode, html};
    pub use weft_reactive::{CancelScope, Computed, Signal, Subscription};
    pub use weft_runtime::{
        BindTarget, Component, HostSpec, Markup, Member, Members, MountRoot, PlatformCaps,
        Registry, RuntimeError, bind,
    };
}
