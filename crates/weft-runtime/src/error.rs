#![forbid(unsafe_code)]

//! Runtime error taxonomy.
//!
//! Only configuration mistakes surface as hard errors; everything else in
//! the binder degrades gracefully and is reported through `tracing`.

use thiserror::Error;

use weft_dom::ParseError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The host was asked to mount but supplies no render contract. This is
    /// a programmer error: it fails the mount attempt immediately and is
    /// not retried.
    #[error("host for <{tag}> does not supply a render contract")]
    MissingRenderContract { tag: String },

    /// Component tag names follow the custom-element grammar: lowercase,
    /// starting with a letter, containing a dash.
    #[error("invalid component tag name {name:?}")]
    InvalidTagName { name: String },

    #[error("markup parse error: {0}")]
    Parse(#[from] ParseError),
}
