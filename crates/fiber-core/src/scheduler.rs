//! Synchronous update scheduling for one root.
//!
//! Triggers that arrive while a render or commit is running are only queued;
//! the flush loop that is already on the stack drains them before returning.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::rc::Weak;

use crate::error::ReconcileError;
use crate::fiber::{FiberArena, FiberId, FiberRoot};
use crate::flags::Lane;
use crate::host::HostConfig;
use crate::work_loop::{
    abandon_render, mark_update_lane_from_fiber_to_root, perform_sync_work_on_root, RenderContext,
};

/// Entry point used by hook dispatchers to request a render.
pub trait ScheduleUpdate {
    fn schedule_update_on_fiber(&self, fiber: FiberId, lane: Lane);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExecutionContext {
    Idle,
    Render,
    Commit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UpdateTarget {
    Root,
    Fiber(FiberId),
}

/// Tunables of a root.
#[derive(Clone, Debug)]
pub struct RootOptions {
    /// Consecutive renders one flush may perform before giving up.
    pub nested_update_limit: usize,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            nested_update_limit: 50,
        }
    }
}

pub(crate) struct RootInner<H> {
    pub(crate) root: FiberRoot,
    pub(crate) arena: FiberArena,
    pub(crate) host: H,
    pub(crate) render: RenderContext,
}

pub(crate) struct RootShared<H> {
    pub(crate) inner: RefCell<RootInner<H>>,
    execution_context: Cell<ExecutionContext>,
    pending: RefCell<Vec<(UpdateTarget, Lane)>>,
    options: RootOptions,
}

struct IdleGuard<'a>(&'a Cell<ExecutionContext>);

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        self.0.set(ExecutionContext::Idle);
    }
}

impl<H: HostConfig> RootShared<H> {
    pub(crate) fn new(
        root: FiberRoot,
        arena: FiberArena,
        host: H,
        scheduler: Weak<dyn ScheduleUpdate>,
        options: RootOptions,
    ) -> Self {
        Self {
            inner: RefCell::new(RootInner {
                root,
                arena,
                host,
                render: RenderContext::new(scheduler),
            }),
            execution_context: Cell::new(ExecutionContext::Idle),
            pending: RefCell::new(Vec::new()),
            options,
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.execution_context.get() == ExecutionContext::Idle
    }

    /// Queue a render request and flush it unless a flush is already running.
    pub(crate) fn schedule(&self, target: UpdateTarget, lane: Lane) -> Result<(), ReconcileError> {
        self.pending.borrow_mut().push((target, lane));
        if self.is_idle() {
            self.flush_sync_work()
        } else {
            log::trace!("update on {target:?} deferred until the running flush drains");
            Ok(())
        }
    }

    fn flush_sync_work(&self) -> Result<(), ReconcileError> {
        let _idle = IdleGuard(&self.execution_context);
        let mut renders = 0;
        loop {
            let batch = std::mem::take(&mut *self.pending.borrow_mut());
            if batch.is_empty() {
                return Ok(());
            }

            let mut inner = self.inner.borrow_mut();
            let RootInner {
                root,
                arena,
                host,
                render,
            } = &mut *inner;

            let mut needs_render = false;
            for (target, lane) in batch {
                match target {
                    UpdateTarget::Root => {
                        root.pending_lanes |= lane;
                        needs_render = true;
                    }
                    UpdateTarget::Fiber(fiber) => {
                        if mark_update_lane_from_fiber_to_root(arena, fiber, lane).is_some() {
                            root.pending_lanes |= lane;
                            needs_render = true;
                        } else {
                            log::trace!("ignoring update on unmounted fiber {fiber:?}");
                        }
                    }
                }
            }
            if !needs_render {
                continue;
            }

            renders += 1;
            if renders > self.options.nested_update_limit {
                self.pending.borrow_mut().clear();
                return Err(ReconcileError::NestedUpdateLimit {
                    limit: self.options.nested_update_limit,
                });
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                perform_sync_work_on_root(root, arena, host, render, &self.execution_context)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    abandon_render(root, arena, render);
                    self.pending.borrow_mut().clear();
                    return Err(err);
                }
                Err(payload) => {
                    abandon_render(root, arena, render);
                    self.pending.borrow_mut().clear();
                    drop(inner);
                    resume_unwind(payload);
                }
            }
        }
    }
}

impl<H: HostConfig> ScheduleUpdate for RootShared<H> {
    fn schedule_update_on_fiber(&self, fiber: FiberId, lane: Lane) {
        if let Err(err) = self.schedule(UpdateTarget::Fiber(fiber), lane) {
            log::error!("render scheduled by a state update failed: {err}");
        }
    }
}
