#![forbid(unsafe_code)]

//! Explicit component registry with idempotent tag registration.
//!
//! Wraps tag-name → host-factory registration behind an object that can be
//! constructed per test or per application, instead of a global registry.
//! Tag names follow the custom-element grammar (lowercase, leading letter,
//! at least one dash). Registering a tag that is already defined is
//! silently ignored, so repeated module initialization is harmless.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::component::{Component, HostSpec, MountRoot};
use crate::error::{Result, RuntimeError};

/// Capabilities of the rendering platform, fixed per registry.
#[derive(Debug, Clone, Copy)]
pub struct PlatformCaps {
    /// Whether mount roots support adopted (constructible) stylesheets.
    pub adopted_stylesheets: bool,
}

impl Default for PlatformCaps {
    fn default() -> Self {
        Self {
            adopted_stylesheets: true,
        }
    }
}

pub type HostFactory = Rc<dyn Fn() -> HostSpec>;

/// Tag-name → host-factory registry.
pub struct Registry {
    entries: RefCell<AHashMap<String, HostFactory>>,
    caps: PlatformCaps,
}

impl Registry {
    #[must_use]
    pub fn new(caps: PlatformCaps) -> Self {
        Self {
            entries: RefCell::new(AHashMap::new()),
            caps,
        }
    }

    #[must_use]
    pub fn caps(&self) -> PlatformCaps {
        self.caps
    }

    /// Register `factory` under `name`.
    ///
    /// Returns `Ok(true)` when the tag was newly defined, `Ok(false)` when
    /// the tag was already defined (the existing definition wins), and an
    /// error for names outside the custom-element grammar.
    pub fn define(&self, name: &str, factory: impl Fn() -> HostSpec + 'static) -> Result<bool> {
        let tag = name.to_ascii_lowercase();
        if !is_valid_tag(&tag) {
            return Err(RuntimeError::InvalidTagName { name: name.into() });
        }
        let mut entries = self.entries.borrow_mut();
        if entries.contains_key(&tag) {
            tracing::debug!(tag = %tag, "tag already defined; ignoring re-registration");
            return Ok(false);
        }
        entries.insert(tag, Rc::new(factory));
        Ok(true)
    }

    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.entries
            .borrow()
            .contains_key(&name.to_ascii_lowercase())
    }

    /// Create a component for a defined tag, with a mount root honoring
    /// the registry's platform capabilities.
    #[must_use]
    pub fn instantiate(&self, name: &str) -> Option<Component> {
        let tag = name.to_ascii_lowercase();
        let factory = Rc::clone(self.entries.borrow().get(&tag)?);
        let spec = (*factory)();
        Some(Component::new(spec, MountRoot::new(self.caps.adopted_stylesheets)).with_tag(tag))
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

impl Default for Registry {
    fn default() -> Self {
        Self::new(PlatformCaps::default())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.entries.borrow().len())
            .field("caps", &self.caps)
            .finish()
    }
}

/// Custom-element tag grammar: starts with an ASCII letter, contains only
/// lowercase letters, digits, and dashes, and has at least one dash.
fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_lowercase()
        && tag.contains('-')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
