//! Minimal counter component driven from the command line.
//!
//! Run with `cargo run -p weft --example counter`. Events are injected
//! programmatically; the printed markup shows the binder keeping the
//! rendered tree consistent with the signals.

use weft::prelude::*;

fn main() -> Result<(), RuntimeError> {
    let registry = Registry::default();

    registry.define("x-counter", || {
        let count = Signal::new(0i64);
        let label = Computed::from_signal(&count, |n| format!("clicked {n} times"));

        let members = Members::new()
            .with_cell("count", count.clone())
            .with_cell("label", label.clone())
            .with_handler("bump", move |_| count.update(|n| *n += 1));

        HostSpec::new(members)
            .render(|| html!(r#"<button @click="bump" :text="label"></button>"#))
            .styles("button { cursor: pointer; }")
    })?;

    let counter = registry.instantiate("x-counter").expect("defined tag");
    counter.connect()?;

    let button = counter.root().query_tag("button").expect("rendered button");
    println!("mounted:  {}", button.text());

    for _ in 0..3 {
        button.emit(&Event::named("click"));
        println!("clicked:  {}", button.text());
    }

    counter.disconnect();
    button.emit(&Event::named("click"));
    println!("unmounted: {} (event ignored)", button.text());

    Ok(())
}
