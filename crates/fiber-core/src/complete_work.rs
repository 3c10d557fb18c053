use crate::error::ReconcileError;
use crate::fiber::{FiberArena, FiberId, StateNode, WorkTag};
use crate::flags::{merge_lanes, Flags, NO_LANES};
use crate::host::{host_tag, HostConfig};
use crate::NodeId;

pub(crate) fn complete_work<H: HostConfig>(
    arena: &mut FiberArena,
    host: &mut H,
    current: Option<FiberId>,
    wip: FiberId,
) -> Result<(), ReconcileError> {
    match arena[wip].tag {
        WorkTag::HostComponent => complete_host_component(arena, host, current, wip)?,
        WorkTag::HostText => complete_host_text(arena, host, current, wip),
        WorkTag::HostRoot | WorkTag::FunctionComponent => {}
    }
    bubble_properties(arena, wip);
    Ok(())
}

fn complete_host_component<H: HostConfig>(
    arena: &mut FiberArena,
    host: &mut H,
    current: Option<FiberId>,
    wip: FiberId,
) -> Result<(), ReconcileError> {
    let fiber = &arena[wip];
    let props = fiber.memoized_props.as_props().cloned().unwrap_or_default();

    if let (Some(current), Some(_)) = (current, fiber.host_node()) {
        let unchanged = arena[current]
            .memoized_props
            .as_props()
            .is_some_and(|old| old.attributes_eq(&props));
        if !unchanged {
            arena[wip].flags |= Flags::UPDATE;
        }
        return Ok(());
    }

    let tag = host_tag(fiber.element_type.as_ref()).to_string();
    let instance = host.create_instance(&tag, &props);
    log::trace!("created <{tag}> as host node {instance}");
    append_all_children(arena, host, instance, wip)?;
    arena[wip].state_node = Some(StateNode::Host(instance));
    if host.finalize_initial_children(instance, &tag, &props) {
        arena[wip].flags |= Flags::UPDATE;
    }
    Ok(())
}

fn complete_host_text<H: HostConfig>(
    arena: &mut FiberArena,
    host: &mut H,
    current: Option<FiberId>,
    wip: FiberId,
) {
    let fiber = &arena[wip];
    let text = fiber.memoized_props.as_text().unwrap_or("").to_string();

    if let (Some(current), Some(_)) = (current, fiber.host_node()) {
        if arena[current].memoized_props.as_text() != Some(text.as_str()) {
            arena[wip].flags |= Flags::UPDATE;
        }
        return;
    }

    let instance = host.create_text_instance(&text);
    arena[wip].state_node = Some(StateNode::Host(instance));
}

/// Append the nearest host descendants of `wip` to a fresh host instance,
/// looking through function components.
fn append_all_children<H: HostConfig>(
    arena: &FiberArena,
    host: &mut H,
    parent: NodeId,
    wip: FiberId,
) -> Result<(), ReconcileError> {
    let mut node = arena[wip].child;
    while let Some(n) = node {
        let fiber = &arena[n];
        if fiber.tag.is_host_node() {
            if let Some(child) = fiber.host_node() {
                host.append_child(parent, child)?;
            }
        } else if let Some(child) = fiber.child {
            node = Some(child);
            continue;
        }

        let mut cursor = n;
        loop {
            if let Some(sibling) = arena[cursor].sibling {
                node = Some(sibling);
                break;
            }
            match arena[cursor].return_fiber {
                Some(up) if up != wip => cursor = up,
                _ => return Ok(()),
            }
        }
    }
    Ok(())
}

/// Fold the children's flags and lanes into `wip`.
pub(crate) fn bubble_properties(arena: &mut FiberArena, wip: FiberId) {
    let mut subtree_flags = Flags::NONE;
    let mut child_lanes = NO_LANES;

    let mut child = arena[wip].child;
    while let Some(c) = child {
        let fiber = &mut arena[c];
        subtree_flags |= fiber.subtree_flags | fiber.flags;
        child_lanes = merge_lanes(child_lanes, merge_lanes(fiber.lanes, fiber.child_lanes));
        fiber.return_fiber = Some(wip);
        child = fiber.sibling;
    }

    let fiber = &mut arena[wip];
    fiber.subtree_flags |= subtree_flags;
    fiber.child_lanes = child_lanes;
}
