//! Commit: apply the finished tree's flags to the host, swap the committed
//! tree, then run passive effects.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::ReconcileError;
use crate::fiber::{FiberArena, FiberId, FiberProps, FiberRoot, FiberUpdateQueue, WorkTag};
use crate::flags::{Flags, HookFlags};
use crate::hooks::Effect;
use crate::host::{host_tag, HostConfig};
use crate::owned::Owned;
use crate::NodeId;

pub(crate) fn commit_root<H: HostConfig>(
    root: &mut FiberRoot,
    arena: &mut FiberArena,
    host: &mut H,
) -> Result<(), ReconcileError> {
    let Some(finished_work) = root.finished_work.take() else {
        return Ok(());
    };
    if finished_work == root.current {
        return Err(ReconcileError::DoubleCommit);
    }
    log::debug!("commit started");

    let mut mutation = MutationPass {
        arena: &mut *arena,
        host,
        container: root.container_info,
        deleted: Vec::new(),
    };
    let root_fiber = &mutation.arena[finished_work];
    if (root_fiber.subtree_flags | root_fiber.flags).intersects(Flags::MUTATION_MASK) {
        mutation.commit_mutation_effects_on_fiber(finished_work)?;
    }
    let deleted = mutation.deleted;

    root.current = finished_work;
    arena.keep_render();

    flush_passive_effects(arena, finished_work, deleted);
    log::debug!("commit finished; {} fibers alive", arena.len());
    Ok(())
}

struct MutationPass<'a, H> {
    arena: &'a mut FiberArena,
    host: &'a mut H,
    container: NodeId,
    deleted: Vec<FiberId>,
}

impl<H: HostConfig> MutationPass<'_, H> {
    fn commit_mutation_effects_on_fiber(&mut self, fiber: FiberId) -> Result<(), ReconcileError> {
        let deletions = std::mem::take(&mut self.arena[fiber].deletions);
        for child in deletions {
            self.commit_deletion_effects(fiber, child)?;
            self.deleted.push(child);
        }
        self.arena[fiber].flags.remove(Flags::CHILD_DELETION);

        if self.arena[fiber].subtree_flags.intersects(Flags::MUTATION_MASK) {
            let mut child = self.arena[fiber].child;
            while let Some(c) = child {
                self.commit_mutation_effects_on_fiber(c)?;
                child = self.arena[c].sibling;
            }
        }
        self.arena[fiber].subtree_flags.remove(Flags::MUTATION_MASK);

        let flags = self.arena[fiber].flags;
        if flags.contains(Flags::PLACEMENT) {
            self.commit_placement(fiber)?;
            self.arena[fiber].flags.remove(Flags::PLACEMENT);
        }
        if flags.contains(Flags::UPDATE) {
            self.commit_update(fiber)?;
            self.arena[fiber].flags.remove(Flags::UPDATE);
        }
        Ok(())
    }

    /// Nearest host node that can hold children: an element or the container.
    fn host_parent(&self, fiber: FiberId) -> Result<NodeId, ReconcileError> {
        let mut parent = self.arena[fiber].return_fiber;
        while let Some(p) = parent {
            let node = &self.arena[p];
            match node.tag {
                WorkTag::HostComponent => {
                    if let Some(id) = node.host_node() {
                        return Ok(id);
                    }
                }
                WorkTag::HostRoot => return Ok(self.container),
                _ => {}
            }
            parent = node.return_fiber;
        }
        Err(ReconcileError::MissingHostParent { fiber })
    }

    fn commit_deletion_effects(
        &mut self,
        return_fiber: FiberId,
        deleted: FiberId,
    ) -> Result<(), ReconcileError> {
        let parent = match self.arena[return_fiber].tag {
            WorkTag::HostRoot => self.container,
            WorkTag::HostComponent => match self.arena[return_fiber].host_node() {
                Some(id) => id,
                None => self.host_parent(return_fiber)?,
            },
            _ => self.host_parent(return_fiber)?,
        };
        log::trace!("delete {} from host node {parent}", self.arena[deleted].display_name());
        self.remove_host_children(parent, deleted)
    }

    /// Remove the topmost host nodes of a deleted subtree. Their own
    /// descendants leave the host with them.
    fn remove_host_children(&mut self, parent: NodeId, fiber: FiberId) -> Result<(), ReconcileError> {
        let node = &self.arena[fiber];
        if node.tag.is_host_node() {
            if let Some(id) = node.host_node() {
                self.host.remove_child(parent, id)?;
            }
            return Ok(());
        }
        let mut child = node.child;
        while let Some(c) = child {
            self.remove_host_children(parent, c)?;
            child = self.arena[c].sibling;
        }
        Ok(())
    }

    fn commit_placement(&mut self, fiber: FiberId) -> Result<(), ReconcileError> {
        let parent = self.host_parent(fiber)?;
        let before = self.get_host_sibling(fiber);
        self.insert_or_append_placement_node(fiber, before, parent)
    }

    /// First host node after `fiber` that is already in place, or `None` to
    /// append.
    fn get_host_sibling(&self, fiber: FiberId) -> Option<NodeId> {
        let arena = &*self.arena;
        let mut node = fiber;
        'siblings: loop {
            while arena[node].sibling.is_none() {
                match arena[node].return_fiber {
                    Some(parent) if !arena[parent].tag.is_host_parent() => node = parent,
                    // Reached the host parent without finding a sibling.
                    _ => return None,
                }
            }
            node = arena[node].sibling?;

            while !arena[node].tag.is_host_node() {
                // A placed subtree is about to move; its nodes are no anchor.
                if arena[node].flags.contains(Flags::PLACEMENT) {
                    continue 'siblings;
                }
                match arena[node].child {
                    Some(child) => node = child,
                    None => continue 'siblings,
                }
            }

            if !arena[node].flags.contains(Flags::PLACEMENT) {
                return arena[node].host_node();
            }
        }
    }

    fn insert_or_append_placement_node(
        &mut self,
        fiber: FiberId,
        before: Option<NodeId>,
        parent: NodeId,
    ) -> Result<(), ReconcileError> {
        let node = &self.arena[fiber];
        if node.tag.is_host_node() {
            if let Some(id) = node.host_node() {
                match before {
                    Some(before) => self.host.insert_before(parent, id, before)?,
                    None => self.host.append_child(parent, id)?,
                }
            }
            return Ok(());
        }
        let mut child = node.child;
        while let Some(c) = child {
            self.insert_or_append_placement_node(c, before, parent)?;
            child = self.arena[c].sibling;
        }
        Ok(())
    }

    fn commit_update(&mut self, fiber: FiberId) -> Result<(), ReconcileError> {
        let node = &self.arena[fiber];
        let Some(id) = node.host_node() else {
            return Ok(());
        };
        let previous = node.alternate.map(|alt| &self.arena[alt].memoized_props);
        match (node.tag, &node.memoized_props, previous) {
            (WorkTag::HostComponent, FiberProps::Element(next), Some(FiberProps::Element(prev))) => {
                self.host.commit_update(id, next, prev)?;
            }
            (WorkTag::HostComponent, FiberProps::Element(props), _) => {
                let tag = host_tag(node.element_type.as_ref());
                self.host.commit_mount(id, tag, props)?;
            }
            (WorkTag::HostText, FiberProps::Text(new), Some(FiberProps::Text(old))) => {
                self.host.commit_text_update(id, old, new)?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

fn run_guarded(what: &str, fiber: FiberId, f: impl FnOnce()) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
        log::error!(
            "{what} of {fiber:?} panicked: {}",
            panic_message(payload.as_ref())
        );
    }
}

fn for_each_effect(arena: &FiberArena, fiber: FiberId, mut f: impl FnMut(&Owned<Effect>)) {
    if let FiberUpdateQueue::Effects(effects) = &arena[fiber].update_queue {
        for effect in effects.iter() {
            f(effect);
        }
    }
}

fn commit_hook_effect_list_unmount(arena: &FiberArena, fiber: FiberId, flags: HookFlags) {
    let mut destroys = Vec::new();
    for_each_effect(arena, fiber, |effect| {
        let destroy = effect.with(|e| {
            e.tag
                .contains(flags)
                .then(|| e.instance().update(|inst| inst.take_destroy()))
                .flatten()
        });
        destroys.extend(destroy);
    });
    for destroy in destroys {
        run_guarded("effect cleanup", fiber, destroy);
    }
}

fn commit_hook_effect_list_mount(arena: &FiberArena, fiber: FiberId, flags: HookFlags) {
    let mut creates = Vec::new();
    for_each_effect(arena, fiber, |effect| {
        let pending = effect.update(|e| {
            if !e.tag.contains(flags) {
                return None;
            }
            e.take_create().map(|create| (create, e.instance()))
        });
        creates.extend(pending);
    });
    for (create, inst) in creates {
        run_guarded("effect", fiber, move || {
            let cleanup = create();
            inst.update(|inst| inst.set_destroy(cleanup));
        });
    }
}

/// Cleanups of every function component inside a deleted subtree, parents
/// first.
fn commit_passive_unmount_inside_deleted_tree(arena: &FiberArena, fiber: FiberId) {
    if arena[fiber].tag == WorkTag::FunctionComponent {
        commit_hook_effect_list_unmount(arena, fiber, HookFlags::PASSIVE);
    }
    for child in arena.children(fiber).collect::<Vec<_>>() {
        commit_passive_unmount_inside_deleted_tree(arena, child);
    }
}

fn commit_passive_unmount_effects(arena: &FiberArena, fiber: FiberId) {
    let node = &arena[fiber];
    if node.subtree_flags.intersects(Flags::PASSIVE_MASK) {
        for child in arena.children(fiber).collect::<Vec<_>>() {
            commit_passive_unmount_effects(arena, child);
        }
    }
    if node.tag == WorkTag::FunctionComponent && node.flags.contains(Flags::PASSIVE) {
        commit_hook_effect_list_unmount(arena, fiber, HookFlags::PASSIVE | HookFlags::HAS_EFFECT);
    }
}

fn commit_passive_mount_effects(arena: &FiberArena, fiber: FiberId) {
    let node = &arena[fiber];
    if node.subtree_flags.intersects(Flags::PASSIVE_MASK) {
        for child in arena.children(fiber).collect::<Vec<_>>() {
            commit_passive_mount_effects(arena, child);
        }
    }
    if node.tag == WorkTag::FunctionComponent && node.flags.contains(Flags::PASSIVE) {
        commit_hook_effect_list_mount(arena, fiber, HookFlags::PASSIVE | HookFlags::HAS_EFFECT);
    }
}

fn flush_passive_effects(arena: &mut FiberArena, finished_work: FiberId, deleted: Vec<FiberId>) {
    for &fiber in &deleted {
        commit_passive_unmount_inside_deleted_tree(arena, fiber);
    }
    for fiber in deleted {
        arena.detach_deleted_subtree(fiber);
    }
    commit_passive_unmount_effects(arena, finished_work);
    commit_passive_mount_effects(arena, finished_work);
}

#[cfg(test)]
#[path = "tests/commit_tests.rs"]
mod tests;
