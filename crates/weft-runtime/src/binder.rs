#![forbid(unsafe_code)]

//! The template binder: directives to listeners and synchronizers.
//!
//! [`bind`] normalizes its input to a detached fragment, walks every
//! element, and classifies each attribute by a one-character prefix:
//!
//! - `@event="member"` installs an event listener resolved against the
//!   target: a `Handler` member is invoked with the event; a `Cell` member
//!   receives the event payload; anything else falls back to writing the
//!   raw payload through [`BindTarget::write_member`].
//! - `:name="member"` installs a property synchronizer: the element
//!   property is resolved through the shorthand table, then a
//!   case-insensitive match against the target's member names, then a
//!   literal attribute. The setter runs once immediately; a `Cell` member
//!   re-runs it through its effect hook, anything else re-reads on the
//!   target's conventional change notification.
//!
//! Both directive kinds register against the supplied
//! [`CancelScope`] and remove their attribute from the element, so the
//! bound fragment never leaks directive markup.
//!
//! Failures stay local: an unresolvable member reference degrades to the
//! documented default for its directive kind, and a bad write (such as
//! unparsable inner markup) is logged without aborting the binding of
//! sibling elements. Elements inserted later through the inner-markup
//! property are not scanned for directives.

use std::rc::Rc;

use weft_dom::{Element, Event, Fragment, SafeHtml, Value, parse_fragment};
use weft_reactive::CancelScope;

use crate::error::Result;
use crate::target::{BindTarget, Member};

/// Binder input: markup text or an already-parsed fragment.
#[derive(Debug)]
pub enum Markup {
    Html(SafeHtml),
    Fragment(Fragment),
}

impl From<SafeHtml> for Markup {
    fn from(html: SafeHtml) -> Self {
        Self::Html(html)
    }
}

impl From<&str> for Markup {
    fn from(markup: &str) -> Self {
        Self::Html(SafeHtml::raw(markup))
    }
}

impl From<String> for Markup {
    fn from(markup: String) -> Self {
        Self::Html(SafeHtml::raw(markup))
    }
}

impl From<Fragment> for Markup {
    fn from(fragment: Fragment) -> Self {
        Self::Fragment(fragment)
    }
}

impl From<&Fragment> for Markup {
    /// Re-stamp a template fragment: the clone gets fresh element
    /// identities with no listeners or properties.
    fn from(template: &Fragment) -> Self {
        Self::Fragment(template.deep_clone())
    }
}

/// Parse/normalize `markup`, wire every directive against `target` under
/// `scope`, and return the bound fragment ready for insertion.
pub fn bind(
    markup: impl Into<Markup>,
    target: &Rc<dyn BindTarget>,
    scope: &CancelScope,
) -> Result<Fragment> {
    let fragment = match markup.into() {
        Markup::Html(html) => parse_fragment(html.as_str())?,
        Markup::Fragment(fragment) => fragment,
    };

    for element in fragment.elements() {
        for (name, member_name) in element.attrs() {
            if let Some(event) = name.strip_prefix('@') {
                bind_event(target, &element, event, &member_name, scope);
                element.remove_attr(&name);
            } else if let Some(attr) = name.strip_prefix(':') {
                bind_attribute(target, &element, attr, &member_name, scope);
                element.remove_attr(&name);
            }
        }
    }

    Ok(fragment)
}

/// Install the listener for one `@event="member"` directive.
fn bind_event(
    target: &Rc<dyn BindTarget>,
    element: &Element,
    event: &str,
    member_name: &str,
    scope: &CancelScope,
) {
    match target.member(member_name) {
        Some(Member::Handler(handler)) => {
            element.add_listener(event, move |e: &Event| (*handler)(e), scope);
        }
        Some(Member::Cell(cell)) => {
            element.add_listener(event, move |e: &Event| cell.write(e.value()), scope);
        }
        other => {
            if other.is_none() {
                tracing::debug!(
                    member = member_name,
                    "event directive references no member; raw payload will be stored"
                );
            }
            let target = Rc::clone(target);
            let member_name = member_name.to_string();
            element.add_listener(
                event,
                move |e: &Event| target.write_member(&member_name, e.value()),
                scope,
            );
        }
    }
}

/// Where a `:name` directive writes on the element.
enum ResolvedProp {
    Text,
    InnerHtml,
    Property(String),
    Attribute(String),
}

/// Shorthand table, then case-insensitive member-name match (canonical
/// spelling wins), then literal attribute.
fn resolve_property(target: &Rc<dyn BindTarget>, name: &str) -> ResolvedProp {
    match name.to_ascii_lowercase().as_str() {
        "text" | "textcontent" => ResolvedProp::Text,
        "html" | "innerhtml" => ResolvedProp::InnerHtml,
        _ => target
            .member_names()
            .into_iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(name))
            .map_or_else(
                || ResolvedProp::Attribute(name.to_string()),
                ResolvedProp::Property,
            ),
    }
}

/// Install the synchronizer for one `:name="member"` directive.
fn bind_attribute(
    target: &Rc<dyn BindTarget>,
    element: &Element,
    name: &str,
    member_name: &str,
    scope: &CancelScope,
) {
    let setter: Rc<dyn Fn(&Value)> = {
        let element = element.clone();
        match resolve_property(target, name) {
            ResolvedProp::Text => Rc::new(move |value| element.set_text(value.to_text())),
            ResolvedProp::InnerHtml => Rc::new(move |value| {
                if let Err(err) = element.set_inner_html(&value.to_text()) {
                    tracing::warn!(error = %err, "inner markup failed to parse; content unchanged");
                }
            }),
            ResolvedProp::Property(prop) => {
                Rc::new(move |value| element.set_property(prop.clone(), value.clone()))
            }
            ResolvedProp::Attribute(attr) => {
                Rc::new(move |value| element.set_attr(attr.clone(), value.to_text()))
            }
        }
    };

    match target.member(member_name) {
        Some(Member::Cell(cell)) => {
            // The effect hook runs the setter eagerly, covering the
            // initial state, and again on every change until cancellation.
            cell.bind(setter, scope);
        }
        other => {
            if !matches!(other, Some(Member::Value(_))) {
                tracing::debug!(
                    member = member_name,
                    "attribute directive references no readable member"
                );
            }
            let read = {
                let target = Rc::clone(target);
                let member_name = member_name.to_string();
                move || target.read_member(&member_name).unwrap_or(Value::Null)
            };
            (*setter)(&read());
            let resync = {
                let setter = Rc::clone(&setter);
                Rc::new(move || (*setter)(&read()))
            };
            target.subscribe_change(resync, scope);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
