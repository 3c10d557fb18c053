use std::cell::RefCell;

use fiber_core::{deps, EffectCleanup, Element, Hooks, Node, PropValue, Props};
use fiber_macros::component;
use fiber_testing::TestRoot;

thread_local! {
    static LOG: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

fn record(entry: impl Into<String>) {
    LOG.with(|log| log.borrow_mut().push(entry.into()));
}

fn take_log() -> Vec<String> {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

fn render(root: &TestRoot, node: impl Into<Node>) {
    if let Err(err) = root.render(node) {
        panic!("render failed: {err}");
    }
}

fn name_of(props: &Props) -> String {
    props
        .get("name")
        .and_then(PropValue::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Logs its effect every render.
#[component]
fn Tagged(hooks: &mut Hooks<'_>, props: &Props) -> Node {
    let name = name_of(props);
    hooks.use_effect(
        move || {
            record(format!("create {name}"));
            EffectCleanup::new(move || record(format!("cleanup {name}")))
        },
        None,
    );
    props.children().clone()
}

/// Logs its effect only when `value` changes.
#[component]
fn Watcher(hooks: &mut Hooks<'_>, props: &Props) -> Node {
    let value = props.get("value").and_then(PropValue::as_int).unwrap_or(0);
    hooks.use_effect(
        move || {
            record(format!("create {value}"));
            EffectCleanup::new(move || record(format!("cleanup {value}")))
        },
        Some(deps![value]),
    );
    Node::from(value)
}

/// Effect that runs once after mount.
#[component]
fn MountOnce(hooks: &mut Hooks<'_>, _props: &Props) -> Node {
    hooks.use_effect(|| record("mounted"), Some(deps![]));
    Node::Empty
}

#[component]
fn Exploding(hooks: &mut Hooks<'_>, _props: &Props) -> Node {
    hooks.use_effect(|| -> EffectCleanup { panic!("effect exploded") }, None);
    Node::Empty
}

fn tagged(name: &str) -> Element {
    Element::component(&Tagged()).key(name).attr("name", name)
}

fn watcher(value: i64) -> Element {
    Element::component(&Watcher()).attr("value", value)
}

#[test]
fn effect_reruns_only_when_a_dependency_changes() {
    let root = TestRoot::new();

    render(&root, watcher(1));
    assert_eq!(take_log(), ["create 1"]);

    render(&root, watcher(1));
    assert!(take_log().is_empty());

    render(&root, watcher(2));
    assert_eq!(take_log(), ["cleanup 1", "create 2"]);
    assert_eq!(root.text(), "2");

    assert!(root.unmount().is_ok());
    assert_eq!(take_log(), ["cleanup 2"]);
}

#[test]
fn effect_without_dependencies_runs_after_every_commit() {
    let root = TestRoot::new();

    render(&root, tagged("a"));
    render(&root, tagged("a"));
    render(&root, tagged("a"));

    assert_eq!(
        take_log(),
        ["create a", "cleanup a", "create a", "cleanup a", "create a"]
    );
}

#[test]
fn empty_dependency_list_runs_once() {
    let root = TestRoot::new();
    for _ in 0..3 {
        render(&root, Element::component(&MountOnce()));
    }
    assert_eq!(take_log(), ["mounted"]);
}

#[test]
fn deleted_component_cleans_up_before_new_effects_run() {
    let root = TestRoot::new();

    render(&root, Node::list([tagged("a").into(), tagged("s").into()]));
    assert_eq!(take_log(), ["create a", "create s"]);

    render(&root, Node::list([tagged("b").into(), tagged("s").into()]));
    assert_eq!(
        take_log(),
        ["cleanup a", "cleanup s", "create b", "create s"]
    );
}

#[test]
fn child_effects_run_before_parent_effects() {
    let root = TestRoot::new();
    render(&root, tagged("parent").child(tagged("child")));

    assert_eq!(take_log(), ["create child", "create parent"]);
}

#[test]
fn unmount_runs_every_cleanup_parents_first() {
    let root = TestRoot::new();
    render(&root, tagged("parent").child(tagged("child")));
    take_log();

    assert!(root.unmount().is_ok());
    assert_eq!(take_log(), ["cleanup parent", "cleanup child"]);
    assert_eq!(root.root().fiber_count(), 2);
}

#[test]
fn panicking_effect_does_not_stop_the_commit() {
    let root = TestRoot::new();
    let tree = Node::list([
        Element::component(&Exploding()).into(),
        tagged("after").into(),
    ]);

    assert!(root.render(tree).is_ok());
    assert_eq!(take_log(), ["create after"]);
}
