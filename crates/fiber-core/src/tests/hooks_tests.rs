use super::*;
use std::cell::{Cell, RefCell};

use crate::element::Element;
use crate::fiber::FiberProps;
use crate::flags::Lane;

#[derive(Default)]
struct RecordingScheduler {
    scheduled: RefCell<Vec<FiberId>>,
}

impl ScheduleUpdate for RecordingScheduler {
    fn schedule_update_on_fiber(&self, fiber: FiberId, _lane: Lane) {
        self.scheduled.borrow_mut().push(fiber);
    }
}

struct Harness {
    arena: FiberArena,
    current: Option<FiberId>,
    fiber: FiberId,
    component: Component,
    scheduler: Rc<RecordingScheduler>,
}

impl Harness {
    fn new(component: Component) -> Self {
        let mut arena = FiberArena::new();
        let fiber = arena.create_fiber_from_element(&Element::component(&component));
        Self {
            arena,
            current: None,
            fiber,
            component,
            scheduler: Rc::new(RecordingScheduler::default()),
        }
    }

    /// Render once, treating the previous result as the committed fiber.
    fn render(&mut self) -> Node {
        let wip = match self.current {
            None => self.fiber,
            Some(current) => self.arena.create_work_in_progress(current, FiberProps::None),
        };
        let scheduler: Weak<dyn ScheduleUpdate> = Rc::downgrade(&self.scheduler) as Weak<dyn ScheduleUpdate>;
        let node = render_with_hooks(
            &mut self.arena,
            self.current,
            wip,
            &self.component,
            &Props::new(),
            &scheduler,
        );
        self.current = Some(wip);
        node
    }

    fn flags(&self) -> Flags {
        self.arena[self.current.expect("rendered")].flags
    }

    fn effect_tags(&self) -> Vec<HookFlags> {
        match &self.arena[self.current.expect("rendered")].update_queue {
            FiberUpdateQueue::Effects(list) => list.iter().map(|e| e.with(|e| e.tag)).collect(),
            _ => Vec::new(),
        }
    }
}

fn text_of(node: &Node) -> String {
    match node {
        Node::Text(text) => text.to_string(),
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn state_updates_fold_in_enqueue_order() {
    let setter: Rc<RefCell<Option<SetState<i32>>>> = Rc::default();
    let component = Component::new("Counter", {
        let setter = setter.clone();
        move |hooks: &mut Hooks<'_>, _: &Props| {
            let (count, set) = hooks.use_state(|| 0);
            *setter.borrow_mut() = Some(set);
            Node::text(count.to_string())
        }
    });
    let mut harness = Harness::new(component);
    assert_eq!(text_of(&harness.render()), "0");

    let set = setter.borrow().clone().expect("setter captured");
    set.update(|c| c + 1);
    set.update(|c| c * 10);
    set.set(7);
    set.update(|c| c + 1);
    assert_eq!(harness.scheduled_count(), 4);

    assert_eq!(text_of(&harness.render()), "8");
    // The queue was drained; another render keeps the value.
    assert_eq!(text_of(&harness.render()), "8");
}

impl Harness {
    fn scheduled_count(&self) -> usize {
        self.scheduler.scheduled.borrow().len()
    }
}

#[test]
fn reducer_applies_actions_with_the_current_reducer() {
    enum Action {
        Push(&'static str),
        Clear,
    }
    let dispatch: Rc<RefCell<Option<Dispatch<Action>>>> = Rc::default();
    let component = Component::new("Log", {
        let dispatch = dispatch.clone();
        move |hooks: &mut Hooks<'_>, _: &Props| {
            let (items, send) = hooks.use_reducer(
                |items: &Vec<&'static str>, action: Action| match action {
                    Action::Push(item) => {
                        let mut next = items.clone();
                        next.push(item);
                        next
                    }
                    Action::Clear => Vec::new(),
                },
                Vec::new,
            );
            *dispatch.borrow_mut() = Some(send);
            Node::text(items.join(","))
        }
    });
    let mut harness = Harness::new(component);
    harness.render();

    let send = dispatch.borrow().clone().expect("dispatch captured");
    send.dispatch(Action::Push("a"));
    send.dispatch(Action::Clear);
    send.dispatch(Action::Push("b"));
    send.dispatch(Action::Push("c"));
    assert_eq!(text_of(&harness.render()), "b,c");
}

#[test]
fn effect_is_flagged_only_when_a_dependency_changes() {
    let dep = Rc::new(Cell::new(1));
    let component = Component::new("Effectful", {
        let dep = dep.clone();
        move |hooks: &mut Hooks<'_>, _: &Props| {
            let value = dep.get();
            hooks.use_effect(|| {}, Some(crate::deps![value]));
            Node::Empty
        }
    });
    let mut harness = Harness::new(component);

    harness.render();
    assert!(harness.flags().contains(Flags::PASSIVE));
    assert_eq!(
        harness.effect_tags(),
        vec![HookFlags::HAS_EFFECT | HookFlags::PASSIVE]
    );

    harness.render();
    assert!(!harness.flags().contains(Flags::PASSIVE));
    assert_eq!(harness.effect_tags(), vec![HookFlags::PASSIVE]);

    dep.set(2);
    harness.render();
    assert!(harness.flags().contains(Flags::PASSIVE));
    assert_eq!(
        harness.effect_tags(),
        vec![HookFlags::HAS_EFFECT | HookFlags::PASSIVE]
    );
}

#[test]
fn effect_without_dependencies_fires_every_render() {
    let component = Component::new("Always", |hooks: &mut Hooks<'_>, _: &Props| {
        hooks.use_effect(|| {}, None);
        Node::Empty
    });
    let mut harness = Harness::new(component);
    harness.render();
    harness.render();
    assert_eq!(
        harness.effect_tags(),
        vec![HookFlags::HAS_EFFECT | HookFlags::PASSIVE]
    );
}

#[test]
fn effect_records_share_one_destroy_slot_across_renders() {
    let component = Component::new("Stable", |hooks: &mut Hooks<'_>, _: &Props| {
        hooks.use_effect(|| {}, Some(crate::deps![]));
        Node::Empty
    });
    let mut harness = Harness::new(component);
    harness.render();
    let first = harness.instances();
    harness.render();
    let second = harness.instances();
    assert_eq!(first.len(), 1);
    assert!(first[0].ptr_eq(&second[0]));
}

impl Harness {
    fn instances(&self) -> Vec<Owned<EffectInstance>> {
        match &self.arena[self.current.expect("rendered")].update_queue {
            FiberUpdateQueue::Effects(list) => list.iter().map(|e| e.with(|e| e.instance())).collect(),
            _ => Vec::new(),
        }
    }
}

#[test]
fn ref_cell_persists_without_scheduling() {
    let component = Component::new("Refs", |hooks: &mut Hooks<'_>, _: &Props| {
        let renders = hooks.use_ref(|| 0);
        renders.update(|n| *n += 1);
        Node::text(renders.with(|n| n.to_string()))
    });
    let mut harness = Harness::new(component);
    harness.render();
    harness.render();
    assert_eq!(text_of(&harness.render()), "3");
    assert_eq!(harness.scheduled_count(), 0);
}

#[test]
#[should_panic(expected = "Rendered more hooks than during the previous render.")]
fn calling_more_hooks_than_last_render_panics() {
    let extra = Rc::new(Cell::new(false));
    let component = Component::new("Grows", {
        let extra = extra.clone();
        move |hooks: &mut Hooks<'_>, _: &Props| {
            hooks.use_state(|| 1);
            if extra.get() {
                hooks.use_state(|| 2);
            }
            Node::Empty
        }
    });
    let mut harness = Harness::new(component);
    harness.render();
    extra.set(true);
    harness.render();
}

#[test]
#[should_panic(expected = "Rendered fewer hooks than expected.")]
fn calling_fewer_hooks_than_last_render_panics() {
    let skip = Rc::new(Cell::new(false));
    let component = Component::new("Shrinks", {
        let skip = skip.clone();
        move |hooks: &mut Hooks<'_>, _: &Props| {
            hooks.use_state(|| 1);
            if !skip.get() {
                hooks.use_state(|| 2);
            }
            Node::Empty
        }
    });
    let mut harness = Harness::new(component);
    harness.render();
    skip.set(true);
    harness.render();
}

#[test]
fn dispatch_after_the_root_is_gone_is_a_no_op() {
    let setter: Rc<RefCell<Option<SetState<i32>>>> = Rc::default();
    let component = Component::new("Orphan", {
        let setter = setter.clone();
        move |hooks: &mut Hooks<'_>, _: &Props| {
            let (_, set) = hooks.use_state(|| 0);
            *setter.borrow_mut() = Some(set);
            Node::Empty
        }
    });
    let mut harness = Harness::new(component);
    harness.render();
    drop(harness);

    let set = setter.borrow().clone().expect("setter captured");
    set.set(5);
}

#[test]
fn dependency_lists_compare_by_value() {
    let name = String::from("a");
    assert_eq!(crate::deps![1, String::from("a")], crate::deps![1, name]);
    assert_eq!(name, "a", "deps! clones its values");
    assert_ne!(crate::deps![1], crate::deps![2]);
    assert_ne!(crate::deps![1i64], crate::deps![1i32]);
    assert_ne!(crate::deps![1], crate::deps![1, 2]);
    assert!(are_hook_inputs_equal(&crate::deps![1, 2], &crate::deps![1]));
}

#[test]
fn dependency_entries_compare_values_not_digests() {
    #[derive(PartialEq)]
    struct Point(f64, f64);

    let origin = Rc::new(Point(0.0, 0.0));
    let same = Deps::new().with(Point(0.0, 0.0)).with(origin.clone());
    assert_eq!(same, Deps::new().with(Point(0.0, 0.0)).with(Rc::new(Point(0.0, 0.0))));
    assert_ne!(same, Deps::new().with(Point(0.0, 1e-300)).with(origin));
}
