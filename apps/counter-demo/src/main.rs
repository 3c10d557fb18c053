use std::rc::Rc;

use anyhow::{anyhow, Result};
use fiber_core::{deps, Callback, EffectCleanup, Element, Hooks, Node, PropValue, Props};
use fiber_macros::component;
use fiber_testing::TestRoot;

#[component]
fn Counter(hooks: &mut Hooks<'_>, props: &Props) -> Node {
    let label = props
        .get("label")
        .and_then(PropValue::as_str)
        .unwrap_or("count")
        .to_string();
    let (count, set_count) = hooks.use_state(|| 0i64);

    hooks.use_effect(
        move || {
            log::info!("{label} is now {count}");
            EffectCleanup::new(move || log::debug!("leaving count {count}"))
        },
        Some(deps![count]),
    );

    let increment: Callback = {
        let set_count = set_count.clone();
        Rc::new(move || set_count.update(|n| n + 1))
    };
    let decrement: Callback = Rc::new(move || set_count.update(|n| n - 1));

    Element::host("div")
        .attr("class", "counter")
        .child(Element::host("button").attr("id", "dec").attr("onClick", decrement).child("-"))
        .child(Element::host("span").attr("id", "value").child(count))
        .child(Element::host("button").attr("id", "inc").attr("onClick", increment).child("+"))
        .into()
}

#[component]
fn TodoList(hooks: &mut Hooks<'_>, _props: &Props) -> Node {
    let (items, set_items) = hooks.use_state(|| vec!["write", "test", "ship"]);

    let rotate: Callback = Rc::new(move || {
        set_items.update(|items| {
            let mut next = items.clone();
            next.rotate_left(1);
            next
        })
    });

    Element::host("section")
        .child(Element::host("button").attr("id", "rotate").attr("onClick", rotate).child("rotate"))
        .child(
            Element::host("ul").children(
                items
                    .iter()
                    .map(|&item| Node::from(Element::host("li").key(item).child(item))),
            ),
        )
        .into()
}

#[component]
fn App(_hooks: &mut Hooks<'_>, _props: &Props) -> Node {
    Element::host("main")
        .child(Element::component(&Counter()).attr("label", "clicks"))
        .child(Element::component(&TodoList()))
        .into()
}

fn click(root: &TestRoot, id: &str) -> Result<()> {
    let node = root
        .find("id", id)
        .ok_or_else(|| anyhow!("no element with id {id}"))?;
    if !root.fire(node, "onClick") {
        return Err(anyhow!("element {id} has no click handler"));
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Fiber-RS Counter Demo ===");
    let root = TestRoot::new();
    root.render(Element::component(&App()))?;
    println!("{}", root.dump());

    for _ in 0..3 {
        click(&root, "inc")?;
    }
    click(&root, "dec")?;
    println!("after +3 -1:\n{}", root.dump());

    root.take_ops();
    click(&root, "rotate")?;
    let moves = root
        .take_ops()
        .into_iter()
        .filter(|op| op.is_structural())
        .count();
    println!("rotating the list took {moves} host move(s):\n{}", root.dump());

    println!("committed fibers:\n{}", root.committed_tree());

    root.unmount()?;
    println!("after unmount:\n{}", root.dump());
    Ok(())
}
