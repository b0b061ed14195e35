#![forbid(unsafe_code)]

//! The detached element tree the binder operates on.
//!
//! [`Element`] is a shared handle: cloning it yields another handle to the
//! same node, which is what lets binder-installed setter closures keep
//! mutating an element after the fragment has been inserted into a mount
//! root. [`Fragment::deep_clone`] is the template re-stamp operation and
//! produces fresh element identities with no listeners or properties.
//!
//! # Event delivery
//!
//! Listeners are registered per element with the event name and the
//! [`CancelScope`] of the mount that installed them. [`Element::emit`]
//! invokes matching listeners synchronously in registration order, skipping
//! (and eventually pruning) listeners whose scope has been cancelled.
//! Dispatch iterates an index snapshot, so a listener that adds or removes
//! listeners mid-dispatch cannot corrupt the loop; listeners added during
//! dispatch run from the next emit onward.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weft_reactive::CancelScope;

use crate::escape::escape_text;
use crate::event::Event;
use crate::parser::{self, ParseError};
use crate::value::Value;

/// Element names that never have children or a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

type Listener = Rc<dyn Fn(&Event)>;

struct ListenerEntry {
    event: String,
    callback: Listener,
    scope: CancelScope,
}

struct ElementInner {
    tag: String,
    /// Attributes in document order; names are ASCII-lowercased.
    attrs: RefCell<Vec<(String, String)>>,
    /// Properties written through the binder; names keep their original
    /// spelling, lookup is case-insensitive.
    props: RefCell<Vec<(String, Value)>>,
    children: RefCell<Vec<Node>>,
    listeners: RefCell<Vec<ListenerEntry>>,
    /// Dispatch nesting depth; cancelled listeners are pruned only at
    /// depth 0 so nested emits never shift indices under an outer loop.
    dispatch_depth: Cell<u32>,
}

/// A node in a detached tree: an element or a run of text.
#[derive(Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Element(el) => el.fmt(f),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

/// A shared handle to one element.
///
/// Cloning shares the node; use [`deep_clone`](Element::deep_clone) for a
/// fresh copy.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.inner.tag)
            .field("attrs", &*self.inner.attrs.borrow())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

impl Element {
    /// Create an element. The tag name is ASCII-lowercased.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                tag: tag.into().to_ascii_lowercase(),
                attrs: RefCell::new(Vec::new()),
                props: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
                dispatch_depth: Cell::new(0),
            }),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Whether this element can have children.
    #[must_use]
    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.inner.tag.as_str())
    }

    /// Whether two handles refer to the same node.
    #[must_use]
    pub fn same_node(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -- attributes ---------------------------------------------------------

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.inner
            .attrs
            .borrow()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        let mut attrs = self.inner.attrs.borrow_mut();
        if let Some(slot) = attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            attrs.push((name, value));
        }
    }

    /// Remove an attribute; returns whether it was present.
    pub fn remove_attr(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let mut attrs = self.inner.attrs.borrow_mut();
        let before = attrs.len();
        attrs.retain(|(n, _)| *n != name);
        attrs.len() != before
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Snapshot of the attributes in document order.
    #[must_use]
    pub fn attrs(&self) -> Vec<(String, String)> {
        self.inner.attrs.borrow().clone()
    }

    // -- properties ---------------------------------------------------------

    /// Write a property. Lookup is case-insensitive; an existing entry
    /// keeps its original spelling.
    pub fn set_property(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut props = self.inner.props.borrow_mut();
        if let Some(slot) = props
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            slot.1 = value;
        } else {
            props.push((name, value));
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<Value> {
        self.inner
            .props
            .borrow()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.inner
            .props
            .borrow()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    // -- children and text --------------------------------------------------

    pub fn append_child(&self, node: Node) {
        self.inner.children.borrow_mut().push(node);
    }

    /// Snapshot of the child nodes.
    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.inner.children.borrow().clone()
    }

    pub fn clear_children(&self) {
        self.inner.children.borrow_mut().clear();
    }

    /// Replace all children with a single text node (empty text clears).
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        let mut children = self.inner.children.borrow_mut();
        children.clear();
        if !text.is_empty() {
            children.push(Node::Text(text));
        }
    }

    /// Concatenated descendant text, in document order.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.inner.children.borrow(), &mut out);
        out
    }

    /// Parse `markup` and replace all children with the result.
    pub fn set_inner_html(&self, markup: &str) -> Result<(), ParseError> {
        let fragment = parser::parse_fragment(markup)?;
        *self.inner.children.borrow_mut() = fragment.children;
        Ok(())
    }

    /// First descendant element with the given tag, depth-first, including
    /// this element itself.
    #[must_use]
    pub fn query_tag(&self, tag: &str) -> Option<Element> {
        let tag = tag.to_ascii_lowercase();
        if self.inner.tag == tag {
            return Some(self.clone());
        }
        query_tag_in(&self.inner.children.borrow(), &tag)
    }

    /// Fresh copy of this element and its subtree.
    ///
    /// Listeners and properties are not copied, matching how template
    /// content is re-stamped before each bind pass.
    #[must_use]
    pub fn deep_clone(&self) -> Element {
        let copy = Element::new(self.inner.tag.clone());
        *copy.inner.attrs.borrow_mut() = self.inner.attrs.borrow().clone();
        let children = self
            .inner
            .children
            .borrow()
            .iter()
            .map(Node::deep_clone)
            .collect();
        *copy.inner.children.borrow_mut() = children;
        copy
    }

    // -- events -------------------------------------------------------------

    /// Register `callback` for events named `event`, tied to `scope`.
    ///
    /// Cancelling the scope deactivates the listener; there is no
    /// individual removal.
    pub fn add_listener(
        &self,
        event: impl Into<String>,
        callback: impl Fn(&Event) + 'static,
        scope: &CancelScope,
    ) {
        self.inner.listeners.borrow_mut().push(ListenerEntry {
            event: event.into(),
            callback: Rc::new(callback),
            scope: scope.clone(),
        });
    }

    /// Number of listeners whose scope is still live.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|entry| !entry.scope.is_cancelled())
            .count()
    }

    /// Deliver `event` to matching live listeners, synchronously, in
    /// registration order.
    pub fn emit(&self, event: &Event) {
        {
            let depth = &self.inner.dispatch_depth;
            depth.set(depth.get() + 1);
        }
        let count = self.inner.listeners.borrow().len();
        for index in 0..count {
            let callback = {
                let listeners = self.inner.listeners.borrow();
                listeners.get(index).and_then(|entry| {
                    (entry.event == event.name() && !entry.scope.is_cancelled())
                        .then(|| Rc::clone(&entry.callback))
                })
            };
            let Some(callback) = callback else { continue };
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (*callback)(event)))
                .is_err()
            {
                tracing::error!(event = event.name(), "event listener panicked; continuing dispatch");
            }
        }
        let depth = &self.inner.dispatch_depth;
        depth.set(depth.get() - 1);
        if depth.get() == 0 {
            self.inner
                .listeners
                .borrow_mut()
                .retain(|entry| !entry.scope.is_cancelled());
        }
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.inner.tag);
        for (name, value) in self.inner.attrs.borrow().iter() {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_text(value));
            out.push('"');
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        for child in self.inner.children.borrow().iter() {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.inner.tag);
        out.push('>');
    }
}

impl Node {
    /// Fresh copy (see [`Element::deep_clone`]).
    #[must_use]
    pub fn deep_clone(&self) -> Node {
        match self {
            Self::Element(el) => Self::Element(el.deep_clone()),
            Self::Text(text) => Self::Text(text.clone()),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Element(el) => el.write_html(out),
            Self::Text(text) => out.push_str(&escape_text(text)),
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.inner.children.borrow(), out),
        }
    }
}

fn query_tag_in(nodes: &[Node], tag: &str) -> Option<Element> {
    for node in nodes {
        if let Node::Element(el) = node {
            if el.inner.tag == tag {
                return Some(el.clone());
            }
            if let Some(found) = query_tag_in(&el.inner.children.borrow(), tag) {
                return Some(found);
            }
        }
    }
    None
}

/// A detached, ordered list of nodes (the parse and bind unit).
#[derive(Debug, Default)]
pub struct Fragment {
    pub(crate) children: Vec<Node>,
}

impl Fragment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn prepend(&mut self, node: Node) {
        self.children.insert(0, node);
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Every element in the fragment, depth-first in document order.
    #[must_use]
    pub fn elements(&self) -> Vec<Element> {
        let mut out = Vec::new();
        collect_elements(&self.children, &mut out);
        out
    }

    /// First top-level or descendant element with the given tag.
    #[must_use]
    pub fn query_tag(&self, tag: &str) -> Option<Element> {
        query_tag_in(&self.children, &tag.to_ascii_lowercase())
    }

    /// Concatenated text of the whole fragment.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Consume the fragment, yielding its nodes (the insertion operation).
    #[must_use]
    pub fn into_nodes(self) -> Vec<Node> {
        self.children
    }

    /// Fresh copy with new element identities, no listeners, no properties.
    #[must_use]
    pub fn deep_clone(&self) -> Fragment {
        Fragment {
            children: self.children.iter().map(Node::deep_clone).collect(),
        }
    }

    /// Serialize to markup with entity escaping.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }
}

fn collect_elements(nodes: &[Node], out: &mut Vec<Element>) {
    for node in nodes {
        if let Node::Element(el) = node {
            out.push(el.clone());
            collect_elements(&el.inner.children.borrow(), out);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
