#![forbid(unsafe_code)]

//! Component lifecycle: render contract, isolated mount root, and the
//! connect/disconnect transitions.
//!
//! A [`HostSpec`] carries the host's capabilities: its bind target, an
//! optional render contract (a function producing markup), and optional
//! style rules. A [`Component`] pairs a spec with a [`MountRoot`] and moves
//! between Unmounted and Mounted:
//!
//! - [`connect`](Component::connect) fails fast when the spec has no
//!   render contract, otherwise creates a fresh [`CancelScope`], binds the
//!   rendered markup, installs styles (a shared [`Stylesheet`] when the
//!   root supports adoption, a literal `<style>` element otherwise), and
//!   inserts the bound fragment into the cleared root.
//! - [`disconnect`](Component::disconnect) cancels the scope, which
//!   synchronously deactivates every listener and synchronizer from that
//!   mount in one idempotent operation.
//!
//! Reconnection is fully fresh: a new binder pass, a new scope, no
//! carried-over subscriptions. Connecting an already-mounted component
//! performs a full remount (the old scope is cancelled first), so there is
//! never more than one live scope per component.

use std::cell::RefCell;
use std::rc::Rc;

use weft_dom::{Element, Fragment, Node};
use weft_reactive::CancelScope;

use crate::binder::{Markup, bind};
use crate::error::{Result, RuntimeError};
use crate::target::BindTarget;

pub type RenderFn = Rc<dyn Fn() -> Markup>;

/// A host's capabilities: bind target, render contract, style rules.
pub struct HostSpec {
    target: Rc<dyn BindTarget>,
    render: Option<RenderFn>,
    styles: Option<String>,
}

impl HostSpec {
    /// Start a spec around a bind target.
    #[must_use]
    pub fn new(target: impl BindTarget + 'static) -> Self {
        Self::from_shared(Rc::new(target))
    }

    /// Start a spec around an already-shared bind target.
    #[must_use]
    pub fn from_shared(target: Rc<dyn BindTarget>) -> Self {
        Self {
            target,
            render: None,
            styles: None,
        }
    }

    /// Supply the render contract.
    #[must_use]
    pub fn render<M: Into<Markup>>(mut self, render: impl Fn() -> M + 'static) -> Self {
        self.render = Some(Rc::new(move || render().into()));
        self
    }

    /// Supply style rules scoped to the mount root.
    #[must_use]
    pub fn styles(mut self, css: impl Into<String>) -> Self {
        self.styles = Some(css.into());
        self
    }

    #[must_use]
    pub fn target(&self) -> &Rc<dyn BindTarget> {
        &self.target
    }

    #[must_use]
    pub fn has_render(&self) -> bool {
        self.render.is_some()
    }

    fn render_fn(&self) -> Option<RenderFn> {
        self.render.clone()
    }

    fn style_rules(&self) -> Option<&str> {
        self.styles.as_deref()
    }
}

impl std::fmt::Debug for HostSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSpec")
            .field("has_render", &self.render.is_some())
            .field("has_styles", &self.styles.is_some())
            .finish()
    }
}

/// A shared, replaceable set of style rules (the constructible-stylesheet
/// analogue).
#[derive(Debug)]
pub struct Stylesheet {
    rules: RefCell<String>,
}

impl Stylesheet {
    #[must_use]
    pub fn new(rules: impl Into<String>) -> Self {
        Self {
            rules: RefCell::new(rules.into()),
        }
    }

    #[must_use]
    pub fn rules(&self) -> String {
        self.rules.borrow().clone()
    }

    /// Replace the rules in place; every adopting root sees the change.
    pub fn replace(&self, rules: impl Into<String>) {
        *self.rules.borrow_mut() = rules.into();
    }
}

/// The isolated rendering root a component mounts into.
#[derive(Debug)]
pub struct MountRoot {
    children: RefCell<Vec<Node>>,
    adopted: RefCell<Vec<Rc<Stylesheet>>>,
    supports_adopted: bool,
}

impl MountRoot {
    /// Create a root, stating whether the platform supports adopted
    /// (constructible) stylesheets.
    #[must_use]
    pub fn new(supports_adopted_stylesheets: bool) -> Self {
        Self {
            children: RefCell::new(Vec::new()),
            adopted: RefCell::new(Vec::new()),
            supports_adopted: supports_adopted_stylesheets,
        }
    }

    #[must_use]
    pub fn supports_adopted_stylesheets(&self) -> bool {
        self.supports_adopted
    }

    /// Adopt `sheet` as the root's stylesheet list.
    pub fn adopt(&self, sheet: Rc<Stylesheet>) {
        *self.adopted.borrow_mut() = vec![sheet];
    }

    #[must_use]
    pub fn adopted(&self) -> Vec<Rc<Stylesheet>> {
        self.adopted.borrow().clone()
    }

    /// Insert a bound fragment's nodes at the end of the root.
    pub fn insert(&self, fragment: Fragment) {
        self.children.borrow_mut().extend(fragment.into_nodes());
    }

    /// Remove all content (adopted stylesheets stay).
    pub fn clear(&self) {
        self.children.borrow_mut().clear();
    }

    /// Snapshot of the root's nodes.
    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.children.borrow().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }

    /// First element with the given tag, depth-first across the root.
    #[must_use]
    pub fn query_tag(&self, tag: &str) -> Option<Element> {
        self.children.borrow().iter().find_map(|node| match node {
            Node::Element(el) => el.query_tag(tag),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text of the mounted content.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in self.children.borrow().iter() {
            match node {
                Node::Element(el) => out.push_str(&el.text()),
                Node::Text(text) => out.push_str(text),
            }
        }
        out
    }
}

/// A component instance: one spec, one root, at most one live mount.
pub struct Component {
    spec: HostSpec,
    root: MountRoot,
    tag: Option<String>,
    scope: RefCell<Option<CancelScope>>,
    sheet: RefCell<Option<Rc<Stylesheet>>>,
}

impl Component {
    #[must_use]
    pub fn new(spec: HostSpec, root: MountRoot) -> Self {
        Self {
            spec,
            root,
            tag: None,
            scope: RefCell::new(None),
            sheet: RefCell::new(None),
        }
    }

    /// Attach the registered tag name (used in diagnostics).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    #[must_use]
    pub fn spec(&self) -> &HostSpec {
        &self.spec
    }

    #[must_use]
    pub fn root(&self) -> &MountRoot {
        &self.root
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.scope.borrow().is_some()
    }

    /// Mount: render, bind, style, insert.
    ///
    /// Fails fast with [`RuntimeError::MissingRenderContract`] when the
    /// spec has no render capability. On an already-mounted component this
    /// performs a full fresh remount.
    pub fn connect(&self) -> Result<()> {
        let Some(render) = self.spec.render_fn() else {
            let tag = self.tag.clone().unwrap_or_else(|| "anonymous".to_string());
            tracing::error!(tag = %tag, "component host supplies no render contract");
            return Err(RuntimeError::MissingRenderContract { tag });
        };

        // Remount: sever the previous mount's bindings first so there is
        // never more than one live scope.
        if let Some(old) = self.scope.borrow_mut().take() {
            old.cancel();
        }
        self.root.clear();

        let scope = CancelScope::new();
        let mut fragment = bind((*render)(), self.spec.target(), &scope)?;

        if let Some(rules) = self.spec.style_rules() {
            if self.root.supports_adopted_stylesheets() {
                let sheet = Rc::clone(
                    self.sheet
                        .borrow_mut()
                        .get_or_insert_with(|| Rc::new(Stylesheet::new(rules))),
                );
                self.root.adopt(sheet);
            } else {
                let style = Element::new("style");
                style.set_text(rules);
                fragment.prepend(Node::Element(style));
            }
        }

        self.root.insert(fragment);
        *self.scope.borrow_mut() = Some(scope);
        Ok(())
    }

    /// Unmount: cancel the mount's scope.
    ///
    /// Safe to call when already unmounted. Mounted content stays in the
    /// root (inert) until the next connect clears it.
    pub fn disconnect(&self) {
        if let Some(scope) = self.scope.borrow_mut().take() {
            scope.cancel();
        }
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("tag", &self.tag)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
