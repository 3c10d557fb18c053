//! Root update queue.
//!
//! Updates accumulate in a circular list on an [`Owned`] queue shared by the
//! HostRoot fiber and its alternate; the next render of the root folds them
//! into a new [`RootState`].

use std::fmt;

use crate::element::Node;
use crate::fiber::{FiberArena, FiberId, FiberState, FiberUpdateQueue};
use crate::flags::Lane;
use crate::list::CircularList;
use crate::owned::Owned;

/// State held by the HostRoot fiber: the element tree last rendered.
#[derive(Clone, Debug, Default)]
pub struct RootState {
    pub element: Node,
}

/// Field-wise fragment of [`RootState`]; `None` fields keep their value.
#[derive(Clone, Debug, Default)]
pub struct RootStatePatch {
    pub element: Option<Node>,
}

impl RootStatePatch {
    pub fn element(element: Node) -> Self {
        Self {
            element: Some(element),
        }
    }

    fn merge_into(self, state: &mut RootState) {
        if let Some(element) = self.element {
            state.element = element;
        }
    }
}

pub enum UpdatePayload {
    Partial(RootStatePatch),
    Updater(Box<dyn FnOnce(&RootState) -> RootStatePatch>),
}

impl fmt::Debug for UpdatePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdatePayload::Partial(patch) => f.debug_tuple("Partial").field(patch).finish(),
            UpdatePayload::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}

#[derive(Debug)]
pub struct Update {
    pub lane: Lane,
    pub payload: UpdatePayload,
}

pub fn create_update(lane: Lane, payload: UpdatePayload) -> Update {
    Update { lane, payload }
}

pub struct UpdateQueue {
    pub base_state: RootState,
    pending: CircularList<Update>,
}

impl UpdateQueue {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

pub fn initialize_update_queue(base_state: RootState) -> Owned<UpdateQueue> {
    Owned::new(UpdateQueue {
        base_state,
        pending: CircularList::new(),
    })
}

/// Splice `update` in as the newest pending entry.
pub fn enqueue_update(queue: &Owned<UpdateQueue>, update: Update) {
    queue.update(|q| q.pending.push(update));
}

/// Fold every pending update into the HostRoot fiber's state.
pub(crate) fn process_update_queue(arena: &mut FiberArena, wip: FiberId) {
    let FiberUpdateQueue::Root(queue) = arena[wip].update_queue.clone() else {
        return;
    };
    let state = queue.update(|q| {
        let mut state = q.base_state.clone();
        let updates = q.pending.take_all();
        log::trace!("processing {} root updates", updates.len());
        for update in updates {
            let patch = match update.payload {
                UpdatePayload::Partial(patch) => patch,
                UpdatePayload::Updater(f) => f(&state),
            };
            patch.merge_into(&mut state);
        }
        q.base_state = state.clone();
        state
    });
    arena[wip].memoized_state = FiberState::Root(state);
}

#[cfg(test)]
#[path = "tests/update_queue_tests.rs"]
mod tests;
