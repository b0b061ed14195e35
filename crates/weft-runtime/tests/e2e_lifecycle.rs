//! End-to-end lifecycle pass: registry definition, mount, user
//! interaction, derived-state propagation, unmount, and remount.
//!
//! Drives a small item-tally component the way an embedding application
//! would: events arrive through `Element::emit`, state lives in signals
//! owned by the host factory, and the display is kept consistent by the
//! binder's synchronizers alone (no manual DOM writes anywhere).

use pretty_assertions::assert_eq;
use weft_dom::{Event, html};
use weft_reactive::{Computed, Signal};
use weft_runtime::{HostSpec, Members, PlatformCaps, Registry, RuntimeError};

const TALLY_STYLES: &str = "output { font-weight: bold; }";

fn define_tally(registry: &Registry) {
    registry
        .define("x-tally", || {
            let count = Signal::new(0i64);
            let step = Signal::new(1i64);
            let summary = Computed::from2(&count, &step, |count, step| {
                format!("{count} (step {step})")
            });

            let members = Members::new()
                .with_cell("count", count.clone())
                .with_cell("step", step.clone())
                .with_cell("summary", summary.clone())
                .with_handler("add", {
                    let count = count.clone();
                    let step = step.clone();
                    move |_| count.update(|n| *n += step.get())
                })
                .with_handler("reset", move |_| count.set(0));

            HostSpec::new(members)
                .render(|| {
                    html!(
                        r#"<div class="tally">
                            <button @click="add">add</button>
                            <button class="reset" @click="reset">reset</button>
                            <input @input="step" :value="step">
                            <output :text="summary"></output>
                        </div>"#
                    )
                })
                .styles(TALLY_STYLES)
        })
        .expect("tag definition");
}

#[test]
fn full_mount_interact_unmount_remount_cycle() {
    let registry = Registry::default();
    define_tally(&registry);
    let component = registry.instantiate("x-tally").unwrap();

    // Mount.
    component.connect().unwrap();
    let root = component.root();
    let output = root.query_tag("output").unwrap();
    assert_eq!(output.text(), "0 (step 1)");
    assert_eq!(root.adopted().len(), 1, "styles adopted, not inlined");
    assert!(root.query_tag("style").is_none());

    // No directive markup survives binding.
    for element in [
        root.query_tag("button").unwrap(),
        root.query_tag("input").unwrap(),
        output.clone(),
    ] {
        for (name, _) in element.attrs() {
            assert!(!name.starts_with('@') && !name.starts_with(':'));
        }
    }

    // Interact: clicks mutate state through the handler member, and the
    // computed summary propagates synchronously.
    let add = root.query_tag("button").unwrap();
    add.emit(&Event::named("click"));
    add.emit(&Event::named("click"));
    assert_eq!(output.text(), "2 (step 1)");

    // Typing into the step input writes the payload into the step signal,
    // and the :value synchronizer reflects it back onto the element.
    let input = root.query_tag("input").unwrap();
    assert_eq!(input.attr("value"), Some("1".into()));
    input.emit(&Event::input("5"));
    assert_eq!(input.attr("value"), Some("5".into()));
    add.emit(&Event::named("click"));
    assert_eq!(output.text(), "7 (step 5)");

    // Unmount: one cancellation severs every listener and synchronizer.
    component.disconnect();
    add.emit(&Event::named("click"));
    input.emit(&Event::input("9"));
    assert_eq!(output.text(), "7 (step 5)", "no DOM mutation after unmount");

    // Remount: fresh binder pass over fresh elements, state carried by the
    // host's signals, bindings live again.
    component.connect().unwrap();
    let output2 = component.root().query_tag("output").unwrap();
    assert!(!output2.same_node(&output));
    assert_eq!(output2.text(), "7 (step 5)");

    let add2 = component.root().query_tag("button").unwrap();
    add2.emit(&Event::named("click"));
    assert_eq!(output2.text(), "12 (step 5)");
}

#[test]
fn reset_button_targets_its_own_handler() {
    let registry = Registry::default();
    define_tally(&registry);
    let component = registry.instantiate("x-tally").unwrap();
    component.connect().unwrap();
    let root = component.root();

    let add = root.query_tag("button").unwrap();
    add.emit(&Event::named("click"));
    add.emit(&Event::named("click"));
    assert_eq!(root.query_tag("output").unwrap().text(), "2 (step 1)");

    let div = root.query_tag("div").unwrap();
    let reset = div
        .children()
        .iter()
        .find_map(|node| match node {
            weft_dom::Node::Element(el) if el.attr("class").as_deref() == Some("reset") => {
                Some(el.clone())
            }
            _ => None,
        })
        .expect("reset button");

    reset.emit(&Event::named("click"));
    assert_eq!(root.query_tag("output").unwrap().text(), "0 (step 1)");
}

#[test]
fn literal_style_fallback_on_limited_platforms() {
    let registry = Registry::new(PlatformCaps {
        adopted_stylesheets: false,
    });
    define_tally(&registry);
    let component = registry.instantiate("x-tally").unwrap();
    component.connect().unwrap();

    let style = component.root().query_tag("style").unwrap();
    assert_eq!(style.text(), TALLY_STYLES);
    assert!(component.root().adopted().is_empty());
}

#[test]
fn missing_render_contract_fails_the_mount() {
    let registry = Registry::default();
    registry
        .define("x-hollow", || HostSpec::new(Members::new()))
        .unwrap();
    let component = registry.instantiate("x-hollow").unwrap();
    let err = component.connect().unwrap_err();
    assert!(matches!(err, RuntimeError::MissingRenderContract { tag } if tag == "x-hollow"));
}

#[test]
fn interpolated_render_markup_is_entity_safe() {
    let registry = Registry::default();
    registry
        .define("x-greeting", || {
            let name = String::from("A < B & C");
            HostSpec::new(Members::new()).render(move || html!("<p>hello {}</p>", name))
        })
        .unwrap();

    let component = registry.instantiate("x-greeting").unwrap();
    component.connect().unwrap();
    assert_eq!(component.root().text(), "hello A < B & C");
    assert_eq!(
        component.root().query_tag("p").unwrap().text(),
        "hello A < B & C"
    );
}
