//! Synchronous render loop: begin on the way down, complete on the way up.

use std::cell::Cell;
use std::rc::Weak;

use crate::begin_work::begin_work;
use crate::commit::commit_root;
use crate::complete_work::complete_work;
use crate::error::ReconcileError;
use crate::fiber::{FiberArena, FiberId, FiberProps, FiberRoot, WorkTag};
use crate::flags::{Lane, NO_LANES};
use crate::host::HostConfig;
use crate::scheduler::{ExecutionContext, ScheduleUpdate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RenderStatus {
    Idle,
    InProgress,
    Completed,
}

/// Cursor and status of the render in flight.
pub(crate) struct RenderContext {
    work_in_progress: Option<FiberId>,
    status: RenderStatus,
    scheduler: Weak<dyn ScheduleUpdate>,
}

impl RenderContext {
    pub(crate) fn new(scheduler: Weak<dyn ScheduleUpdate>) -> Self {
        Self {
            work_in_progress: None,
            status: RenderStatus::Idle,
            scheduler,
        }
    }
}

/// Record `lane` on `fiber` and on every ancestor's `child_lanes`.
///
/// Returns the HostRoot fiber reached, or `None` when the fiber is no
/// longer part of a mounted tree.
pub(crate) fn mark_update_lane_from_fiber_to_root(
    arena: &mut FiberArena,
    fiber: FiberId,
    lane: Lane,
) -> Option<FiberId> {
    let source = arena.get_mut(fiber)?;
    source.lanes |= lane;
    let alternate = source.alternate;
    let mut parent = source.return_fiber;
    if let Some(alt) = alternate.and_then(|alt| arena.get_mut(alt)) {
        alt.lanes |= lane;
    }

    let mut node = fiber;
    while let Some(p) = parent {
        let ancestor = arena.get_mut(p)?;
        ancestor.child_lanes |= lane;
        let alternate = ancestor.alternate;
        parent = ancestor.return_fiber;
        if let Some(alt) = alternate.and_then(|alt| arena.get_mut(alt)) {
            alt.child_lanes |= lane;
        }
        node = p;
    }

    (arena[node].tag == WorkTag::HostRoot).then_some(node)
}

fn prepare_fresh_stack(root: &mut FiberRoot, arena: &mut FiberArena, cx: &mut RenderContext) -> FiberId {
    root.finished_work = None;
    arena.begin_render();
    let wip = arena.create_work_in_progress(root.current, FiberProps::None);
    cx.work_in_progress = Some(wip);
    cx.status = RenderStatus::InProgress;
    wip
}

/// Throw away a render that errored or unwound before its commit swapped
/// the tree, so the arena holds only the committed tree and its alternates.
pub(crate) fn abandon_render(root: &mut FiberRoot, arena: &mut FiberArena, cx: &mut RenderContext) {
    root.finished_work = None;
    cx.work_in_progress = None;
    cx.status = RenderStatus::Idle;
    let freed = arena.discard_render();
    log::debug!("render abandoned; freed {freed} fibers, {} alive", arena.len());
}

/// Render the whole tree and commit it.
pub(crate) fn perform_sync_work_on_root<H: HostConfig>(
    root: &mut FiberRoot,
    arena: &mut FiberArena,
    host: &mut H,
    cx: &mut RenderContext,
    execution_context: &Cell<ExecutionContext>,
) -> Result<(), ReconcileError> {
    execution_context.set(ExecutionContext::Render);
    let finished = prepare_fresh_stack(root, arena, cx);
    log::debug!("render started");
    work_loop_sync(arena, host, cx)?;
    debug_assert_eq!(cx.status, RenderStatus::Completed);

    root.finished_work = Some(finished);
    execution_context.set(ExecutionContext::Commit);
    commit_root(root, arena, host)?;
    root.pending_lanes = NO_LANES;
    cx.status = RenderStatus::Idle;
    Ok(())
}

fn work_loop_sync<H: HostConfig>(
    arena: &mut FiberArena,
    host: &mut H,
    cx: &mut RenderContext,
) -> Result<(), ReconcileError> {
    while let Some(unit) = cx.work_in_progress {
        perform_unit_of_work(arena, host, cx, unit)?;
    }
    Ok(())
}

fn perform_unit_of_work<H: HostConfig>(
    arena: &mut FiberArena,
    host: &mut H,
    cx: &mut RenderContext,
    unit: FiberId,
) -> Result<(), ReconcileError> {
    let current = arena[unit].alternate;
    let next = begin_work(arena, &cx.scheduler, current, unit);

    let fiber = &mut arena[unit];
    fiber.memoized_props = fiber.pending_props.clone();

    match next {
        Some(child) => cx.work_in_progress = Some(child),
        None => complete_unit_of_work(arena, host, cx, unit)?,
    }
    Ok(())
}

fn complete_unit_of_work<H: HostConfig>(
    arena: &mut FiberArena,
    host: &mut H,
    cx: &mut RenderContext,
    unit: FiberId,
) -> Result<(), ReconcileError> {
    let mut completed = Some(unit);
    while let Some(fiber) = completed {
        let current = arena[fiber].alternate;
        complete_work(arena, host, current, fiber)?;

        if let Some(sibling) = arena[fiber].sibling {
            cx.work_in_progress = Some(sibling);
            return Ok(());
        }
        completed = arena[fiber].return_fiber;
        cx.work_in_progress = completed;
    }
    cx.status = RenderStatus::Completed;
    Ok(())
}
