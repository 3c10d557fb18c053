use std::cell::RefCell;
use std::rc::Rc;

use fiber_core::{
    Callback, Element, Hooks, Node, PropValue, Props, ReconcileError, RootOptions, SetState,
};
use fiber_macros::component;
use fiber_testing::TestRoot;

thread_local! {
    static SETTER: RefCell<Option<SetState<i64>>> = RefCell::new(None);
}

fn render(root: &TestRoot, node: impl Into<Node>) {
    if let Err(err) = root.render(node) {
        panic!("render failed: {err}");
    }
}

#[component]
fn Counter(hooks: &mut Hooks<'_>, _props: &Props) -> Node {
    let (count, set_count) = hooks.use_state(|| 0i64);
    let increment: Callback = Rc::new(move || set_count.update(|n| n + 1));
    Element::host("button")
        .attr("id", "inc")
        .attr("onClick", increment)
        .child(count)
        .into()
}

/// Publishes its setter so tests can call it from outside a render.
#[component]
fn Holder(hooks: &mut Hooks<'_>, _props: &Props) -> Node {
    let (value, set_value) = hooks.use_state(|| 1i64);
    SETTER.with(|slot| *slot.borrow_mut() = Some(set_value));
    Node::from(value)
}

fn setter() -> SetState<i64> {
    SETTER
        .with(|slot| slot.borrow().clone())
        .expect("Holder has rendered")
}

#[derive(Clone, Copy)]
enum Step {
    Add(i64),
    Reset,
}

#[component]
fn Tally(hooks: &mut Hooks<'_>, _props: &Props) -> Node {
    let (total, dispatch) = hooks.use_reducer(
        |total: &i64, step: Step| match step {
            Step::Add(n) => total + n,
            Step::Reset => 0,
        },
        || 0i64,
    );
    let renders = hooks.use_ref(|| 0usize);
    renders.update(|n| *n += 1);

    let add: Callback = {
        let dispatch = dispatch.clone();
        Rc::new(move || {
            dispatch.dispatch(Step::Add(2));
            dispatch.dispatch(Step::Add(3));
        })
    };
    let reset: Callback = Rc::new(move || dispatch.dispatch(Step::Reset));
    Element::host("div")
        .child(Element::host("button").attr("id", "add").attr("onClick", add))
        .child(Element::host("button").attr("id", "reset").attr("onClick", reset))
        .child(Element::host("span").attr("renders", renders.with(|n| *n as i64)).child(total))
        .into()
}

/// Calls a different number of hooks depending on `extra`.
#[component]
fn Shifty(hooks: &mut Hooks<'_>, props: &Props) -> Node {
    let (a, _) = hooks.use_state(|| 1i64);
    if props.get("extra").and_then(PropValue::as_bool) == Some(true) {
        let (b, _) = hooks.use_state(|| 2i64);
        return Node::from(a + b);
    }
    Node::from(a)
}

/// Sets state from an effect after every commit, forever.
#[component]
fn Runaway(hooks: &mut Hooks<'_>, _props: &Props) -> Node {
    let (count, set_count) = hooks.use_state(|| 0i64);
    hooks.use_effect(move || set_count.set(count + 1), None);
    Node::from(count)
}

/// Sets state from an effect until it reaches `target`.
#[component]
fn Settles(hooks: &mut Hooks<'_>, props: &Props) -> Node {
    let target = props.get("target").and_then(PropValue::as_int).unwrap_or(0);
    let (count, set_count) = hooks.use_state(|| 0i64);
    hooks.use_effect(
        move || {
            if count < target {
                set_count.set(count + 1);
            }
        },
        None,
    );
    Node::from(count)
}

fn shifty(extra: bool) -> Element {
    Element::component(&Shifty()).attr("extra", extra)
}

#[test]
fn three_clicks_count_to_three() {
    let root = TestRoot::new();
    render(&root, Element::component(&Counter()));
    assert_eq!(root.text(), "0");

    let button = root.find("id", "inc").expect("button rendered");
    for _ in 0..3 {
        assert!(root.fire(button, "onClick"));
    }

    assert_eq!(root.text(), "3");
    assert_eq!(root.find("id", "inc"), Some(button));
}

#[test]
fn queued_actions_apply_in_order() {
    let root = TestRoot::new();
    render(&root, Element::component(&Tally()));
    let add = root.find("id", "add").expect("add button");
    let reset = root.find("id", "reset").expect("reset button");

    root.fire(add, "onClick");
    assert_eq!(root.text(), "5");
    root.fire(add, "onClick");
    assert_eq!(root.text(), "10");
    root.fire(reset, "onClick");
    assert_eq!(root.text(), "0");
}

#[test]
fn refs_persist_across_renders() {
    let root = TestRoot::new();
    render(&root, Element::component(&Tally()));
    let add = root.find("id", "add").expect("add button");
    root.fire(add, "onClick");
    root.fire(add, "onClick");

    let span = root.with_host(|host| {
        let div = host.children(root.container())[0];
        host.children(div)[2]
    });
    let renders = root.with_host(|host| host.attribute(span, "renders").and_then(PropValue::as_int));
    // Two dispatches per click, one render per dispatch.
    assert_eq!(renders, Some(5));
}

#[test]
fn leading_conditional_child_keeps_sibling_state() {
    let root = TestRoot::new();
    let page = |banner: bool| -> Node {
        Element::host("div")
            .child(banner.then(|| Element::host("h1").child("banner")))
            .child(Element::component(&Counter()))
            .into()
    };

    render(&root, page(false));
    let button = root.find("id", "inc").expect("button rendered");
    root.fire(button, "onClick");
    root.fire(button, "onClick");
    assert_eq!(root.text(), "2");

    render(&root, page(true));
    assert_eq!(root.text(), "banner2");
    assert_eq!(root.find("id", "inc"), Some(button));

    render(&root, page(false));
    assert_eq!(root.text(), "2");
}

#[test]
fn setter_works_while_mounted_and_is_ignored_after_unmount() {
    let root = TestRoot::new();
    render(&root, Element::component(&Holder()));
    assert_eq!(root.text(), "1");

    setter().set(2);
    assert_eq!(root.text(), "2");

    assert!(root.unmount().is_ok());
    root.take_ops();

    setter().set(3);
    assert!(root.take_ops().is_empty());
    assert_eq!(root.text(), "");
}

#[test]
fn state_survives_unrelated_parent_renders() {
    let root = TestRoot::new();
    let tree = |label: &str| -> Node {
        Element::host("section")
            .attr("label", label)
            .child(Element::component(&Holder()))
            .into()
    };

    render(&root, tree("first"));
    setter().set(7);
    render(&root, tree("second"));

    assert_eq!(root.text(), "7");
}

#[test]
#[should_panic(expected = "Rendered more hooks than during the previous render.")]
fn calling_more_hooks_than_last_render_panics() {
    let root = TestRoot::new();
    render(&root, shifty(false));
    let _ = root.render(shifty(true));
}

#[test]
#[should_panic(expected = "Rendered fewer hooks than expected.")]
fn calling_fewer_hooks_than_last_render_panics() {
    let root = TestRoot::new();
    render(&root, shifty(true));
    let _ = root.render(shifty(false));
}

#[test]
fn effect_updates_that_never_settle_hit_the_limit() {
    let root = TestRoot::with_options(RootOptions {
        nested_update_limit: 5,
    });

    let result = root.render(Element::component(&Runaway()));
    assert!(matches!(
        result,
        Err(ReconcileError::NestedUpdateLimit { limit: 5 })
    ));
}

#[test]
fn effect_updates_that_settle_are_flushed_before_render_returns() {
    let root = TestRoot::new();
    render(&root, Element::component(&Settles()).attr("target", 4));
    assert_eq!(root.text(), "4");
}
