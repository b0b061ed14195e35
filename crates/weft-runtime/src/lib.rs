#![forbid(unsafe_code)]

//! Template binding and component lifecycle for Weft.
//!
//! The runtime connects markup to host state:
//!
//! - [`target`]: the bind-target capability — hosts expose named
//!   [`Member`]s (handlers, reactive cells, plain values) instead of
//!   relying on property reflection.
//! - [`binder`]: [`bind`] walks a fragment, wires `@event` and
//!   `:attribute` directives against the target, registers everything with
//!   one [`CancelScope`](weft_reactive::CancelScope), and strips the
//!   directive attributes.
//! - [`component`]: the connect/disconnect lifecycle around an isolated
//!   [`MountRoot`], with one fresh cancel scope per mount.
//! - [`registry`]: idempotent tag-name registration and instantiation.
//!
//! # Propagation model
//!
//! Everything is synchronous and single-threaded: an emitted event runs its
//! listeners, listener writes to signals run their subscribers and any
//! dependent computed values, and bound elements are updated before control
//! returns to the emitter. Unmounting cancels the mount's scope, which
//! deactivates every listener and synchronizer from that mount in one
//! operation.

pub mod binder;
pub mod component;
pub mod error;
pub mod registry;
pub mod target;

pub use binder::{Markup, bind};
pub use component::{Component, HostSpec, MountRoot, Stylesheet};
pub use error::{Result, RuntimeError};
pub use registry::{PlatformCaps, Registry};
pub use target::{BindTarget, Member, Members, ValueCell, ValueConvert};
