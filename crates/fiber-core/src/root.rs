use std::rc::{Rc, Weak};

use crate::element::Node;
use crate::error::ReconcileError;
use crate::fiber::{create_fiber_root, FiberArena, FiberSnapshot, FiberUpdateQueue};
use crate::flags::{Lane, SYNC_LANE};
use crate::host::HostConfig;
use crate::owned::Owned;
use crate::scheduler::{RootOptions, RootShared, ScheduleUpdate, UpdateTarget};
use crate::update_queue::{
    create_update, enqueue_update, RootStatePatch, UpdatePayload, UpdateQueue,
};
use crate::NodeId;

/// A tree rendered into one host container.
pub struct Root<H: HostConfig + 'static> {
    shared: Rc<RootShared<H>>,
    queue: Owned<UpdateQueue>,
}

pub fn create_root<H: HostConfig + 'static>(host: H, container: NodeId) -> Root<H> {
    create_root_with_options(host, container, RootOptions::default())
}

pub fn create_root_with_options<H: HostConfig + 'static>(
    host: H,
    container: NodeId,
    options: RootOptions,
) -> Root<H> {
    let mut arena = FiberArena::new();
    let root = create_fiber_root(&mut arena, container);
    let queue = match &arena[root.current].update_queue {
        FiberUpdateQueue::Root(queue) => queue.clone(),
        _ => unreachable!("create_fiber_root always installs a root queue"),
    };
    let shared = Rc::new_cyclic(|weak: &Weak<RootShared<H>>| {
        let scheduler: Weak<dyn ScheduleUpdate> = weak.clone();
        RootShared::new(root, arena, host, scheduler, options)
    });
    Root { shared, queue }
}

impl<H: HostConfig + 'static> Root<H> {
    /// Render `node` into the container and commit before returning.
    ///
    /// Called from inside an effect, the update is queued and rendered by the
    /// flush that is already running.
    pub fn render(&self, node: impl Into<Node>) -> Result<Lane, ReconcileError> {
        let lane = SYNC_LANE;
        let update = create_update(
            lane,
            UpdatePayload::Partial(RootStatePatch::element(node.into())),
        );
        enqueue_update(&self.queue, update);
        self.shared.schedule(UpdateTarget::Root, lane)?;
        Ok(lane)
    }

    /// Remove everything from the container, running every effect cleanup.
    pub fn unmount(&self) -> Result<(), ReconcileError> {
        self.render(Node::Empty).map(|_| ())
    }

    /// Borrow the host. Must not be called from inside a render or effect.
    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.shared.inner.borrow().host)
    }

    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.shared.inner.borrow_mut().host)
    }

    /// Snapshot of the committed fiber tree, starting at the HostRoot.
    pub fn committed_tree(&self) -> FiberSnapshot {
        let inner = self.shared.inner.borrow();
        match inner.arena.snapshot(inner.root.current) {
            Some(snapshot) => snapshot,
            None => unreachable!("the committed root fiber is never freed"),
        }
    }

    /// Number of fibers currently allocated, alternates included.
    pub fn fiber_count(&self) -> usize {
        self.shared.inner.borrow().arena.len()
    }

    pub fn container(&self) -> NodeId {
        self.shared.inner.borrow().root.container_info
    }
}
