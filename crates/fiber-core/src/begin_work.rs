use std::rc::Weak;

use crate::child_fiber::{MOUNT_CHILD_FIBERS, RECONCILE_CHILD_FIBERS};
use crate::element::{ElementType, Node};
use crate::fiber::{FiberArena, FiberId, FiberState, WorkTag};
use crate::flags::{Flags, NO_LANES};
use crate::hooks::render_with_hooks;
use crate::scheduler::ScheduleUpdate;
use crate::update_queue::process_update_queue;

/// Compute the next children of `wip` and return its first child.
pub(crate) fn begin_work(
    arena: &mut FiberArena,
    scheduler: &Weak<dyn ScheduleUpdate>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Option<FiberId> {
    arena[wip].lanes = NO_LANES;

    match arena[wip].tag {
        WorkTag::HostRoot => update_host_root(arena, current, wip),
        WorkTag::HostComponent => update_host_component(arena, current, wip),
        WorkTag::HostText => None,
        WorkTag::FunctionComponent => update_function_component(arena, scheduler, current, wip),
    }
}

fn update_host_root(arena: &mut FiberArena, current: Option<FiberId>, wip: FiberId) -> Option<FiberId> {
    process_update_queue(arena, wip);
    let next_children = match &arena[wip].memoized_state {
        FiberState::Root(state) => state.element.clone(),
        _ => Node::Empty,
    };
    reconcile_children(arena, current, wip, &next_children);
    arena[wip].child
}

fn update_host_component(
    arena: &mut FiberArena,
    current: Option<FiberId>,
    wip: FiberId,
) -> Option<FiberId> {
    let next_children = arena[wip]
        .pending_props
        .as_props()
        .map(|props| props.children().clone())
        .unwrap_or_default();
    reconcile_children(arena, current, wip, &next_children);
    arena[wip].child
}

fn update_function_component(
    arena: &mut FiberArena,
    scheduler: &Weak<dyn ScheduleUpdate>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Option<FiberId> {
    let fiber = &arena[wip];
    let Some(ElementType::Component(component)) = fiber.element_type.clone() else {
        log::warn!("function component fiber {wip:?} has no component; rendering nothing");
        reconcile_children(arena, current, wip, &Node::Empty);
        return arena[wip].child;
    };
    let props = fiber.pending_props.as_props().cloned().unwrap_or_default();

    log::trace!("render {} ({wip:?})", component.name());
    let next_children = render_with_hooks(arena, current, wip, &component, &props, scheduler);
    arena[wip].flags |= Flags::PERFORMED_WORK;
    reconcile_children(arena, current, wip, &next_children);
    arena[wip].child
}

fn reconcile_children(
    arena: &mut FiberArena,
    current: Option<FiberId>,
    wip: FiberId,
    next_children: &Node,
) {
    let child = match current {
        // A fresh parent is placed whole, so its children skip placement.
        None => MOUNT_CHILD_FIBERS.reconcile_child_fibers(arena, wip, None, next_children),
        Some(current) => {
            let current_child = arena[current].child;
            RECONCILE_CHILD_FIBERS.reconcile_child_fibers(arena, wip, current_child, next_children)
        }
    };
    arena[wip].child = child;
}
