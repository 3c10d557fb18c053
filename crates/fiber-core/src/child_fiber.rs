//! Children reconciler.
//!
//! Diffs the old child list of a fiber against the new [`Node`] produced by
//! its render, reusing fibers whose key and type match and recording
//! placements and deletions on the work-in-progress tree. Nothing touches
//! the host here.

use std::rc::Rc;

use crate::collections::map::HashMap;
use crate::element::{Element, Key, Node};
use crate::fiber::{FiberArena, FiberId, FiberProps, WorkTag};
use crate::flags::Flags;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum ChildKey {
    Key(Key),
    Index(usize),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ChildReconciler {
    should_track_side_effects: bool,
}

/// Used when the parent already exists in the committed tree.
pub(crate) const RECONCILE_CHILD_FIBERS: ChildReconciler = ChildReconciler::new(true);
/// Used for a freshly created parent; its whole subtree is placed at once.
pub(crate) const MOUNT_CHILD_FIBERS: ChildReconciler = ChildReconciler::new(false);

fn element_props(element: &Element) -> FiberProps {
    FiberProps::Element(element.props().clone())
}

/// Text that renders nothing is treated like an empty slot.
fn is_hole(node: &Node) -> bool {
    match node {
        Node::Empty => true,
        Node::Text(text) => text.is_empty(),
        _ => false,
    }
}

impl ChildReconciler {
    pub(crate) const fn new(should_track_side_effects: bool) -> Self {
        Self {
            should_track_side_effects,
        }
    }

    fn delete_child(&self, arena: &mut FiberArena, return_fiber: FiberId, child: FiberId) {
        if !self.should_track_side_effects {
            return;
        }
        let parent = &mut arena[return_fiber];
        parent.deletions.push(child);
        parent.flags |= Flags::CHILD_DELETION;
    }

    fn delete_remaining_children(
        &self,
        arena: &mut FiberArena,
        return_fiber: FiberId,
        current_first_child: Option<FiberId>,
    ) {
        if !self.should_track_side_effects {
            return;
        }
        let mut child = current_first_child;
        while let Some(c) = child {
            self.delete_child(arena, return_fiber, c);
            child = arena[c].sibling;
        }
    }

    fn map_remaining_children(
        &self,
        arena: &FiberArena,
        current_first_child: Option<FiberId>,
    ) -> HashMap<ChildKey, FiberId> {
        let mut existing = HashMap::default();
        let mut child = current_first_child;
        while let Some(c) = child {
            let fiber = &arena[c];
            let key = match &fiber.key {
                Some(key) => ChildKey::Key(key.clone()),
                None => ChildKey::Index(fiber.index),
            };
            existing.insert(key, c);
            child = fiber.sibling;
        }
        existing
    }

    fn use_fiber(&self, arena: &mut FiberArena, fiber: FiberId, pending_props: FiberProps) -> FiberId {
        let clone = arena.create_work_in_progress(fiber, pending_props);
        let wip = &mut arena[clone];
        wip.index = 0;
        wip.sibling = None;
        clone
    }

    fn place_child(
        &self,
        arena: &mut FiberArena,
        new_fiber: FiberId,
        last_placed_index: usize,
        new_index: usize,
    ) -> usize {
        arena[new_fiber].index = new_index;
        if !self.should_track_side_effects {
            return last_placed_index;
        }
        match arena[new_fiber].alternate {
            Some(current) => {
                let old_index = arena[current].index;
                if old_index < last_placed_index {
                    // This is a move.
                    arena[new_fiber].flags |= Flags::PLACEMENT;
                    last_placed_index
                } else {
                    old_index
                }
            }
            None => {
                arena[new_fiber].flags |= Flags::PLACEMENT;
                last_placed_index
            }
        }
    }

    fn place_single_child(&self, arena: &mut FiberArena, new_fiber: FiberId) -> FiberId {
        if self.should_track_side_effects && arena[new_fiber].alternate.is_none() {
            arena[new_fiber].flags |= Flags::PLACEMENT;
        }
        new_fiber
    }

    fn update_text_node(
        &self,
        arena: &mut FiberArena,
        return_fiber: FiberId,
        current: Option<FiberId>,
        text: &Rc<str>,
    ) -> FiberId {
        let fiber = match current {
            Some(current) if arena[current].tag == WorkTag::HostText => {
                self.use_fiber(arena, current, FiberProps::Text(text.clone()))
            }
            _ => arena.create_fiber_from_text(text.clone()),
        };
        arena[fiber].return_fiber = Some(return_fiber);
        fiber
    }

    fn update_element(
        &self,
        arena: &mut FiberArena,
        return_fiber: FiberId,
        current: Option<FiberId>,
        element: &Element,
    ) -> FiberId {
        let fiber = match current {
            Some(current)
                if arena[current].element_type.as_ref() == Some(element.element_type()) =>
            {
                self.use_fiber(arena, current, element_props(element))
            }
            _ => arena.create_fiber_from_element(element),
        };
        arena[fiber].return_fiber = Some(return_fiber);
        fiber
    }

    fn create_child(
        &self,
        arena: &mut FiberArena,
        return_fiber: FiberId,
        new_child: &Node,
    ) -> Option<FiberId> {
        let fiber = match new_child {
            _ if is_hole(new_child) => return None,
            Node::Text(text) => arena.create_fiber_from_text(text.clone()),
            Node::Element(element) => arena.create_fiber_from_element(element),
            Node::List(_) | Node::Empty => {
                log::warn!("nested child list ignored; flatten it with Node::list");
                return None;
            }
        };
        arena[fiber].return_fiber = Some(return_fiber);
        Some(fiber)
    }

    /// Reuse `old_fiber` for `new_child` when their keys agree, otherwise
    /// return `None` to end the in-order pass.
    fn update_slot(
        &self,
        arena: &mut FiberArena,
        return_fiber: FiberId,
        old_fiber: Option<FiberId>,
        new_child: &Node,
    ) -> Option<FiberId> {
        let key = old_fiber.and_then(|old| arena[old].key.clone());
        match new_child {
            _ if is_hole(new_child) => None,
            Node::Text(text) => {
                // Text nodes have no key; a keyed old fiber cannot be reused.
                if key.is_some() {
                    return None;
                }
                Some(self.update_text_node(arena, return_fiber, old_fiber, text))
            }
            Node::Element(element) => {
                if element.key_ref() != key.as_ref() {
                    return None;
                }
                Some(self.update_element(arena, return_fiber, old_fiber, element))
            }
            Node::List(_) | Node::Empty => {
                log::warn!("nested child list ignored; flatten it with Node::list");
                None
            }
        }
    }

    fn update_from_map(
        &self,
        arena: &mut FiberArena,
        existing: &HashMap<ChildKey, FiberId>,
        return_fiber: FiberId,
        new_idx: usize,
        new_child: &Node,
    ) -> Option<FiberId> {
        match new_child {
            _ if is_hole(new_child) => None,
            Node::Text(text) => {
                let matched = existing.get(&ChildKey::Index(new_idx)).copied();
                Some(self.update_text_node(arena, return_fiber, matched, text))
            }
            Node::Element(element) => {
                let lookup = match element.key_ref() {
                    Some(key) => ChildKey::Key(key.clone()),
                    None => ChildKey::Index(new_idx),
                };
                let matched = existing.get(&lookup).copied();
                Some(self.update_element(arena, return_fiber, matched, element))
            }
            Node::List(_) | Node::Empty => {
                log::warn!("nested child list ignored; flatten it with Node::list");
                None
            }
        }
    }

    fn reconcile_children_array(
        &self,
        arena: &mut FiberArena,
        return_fiber: FiberId,
        current_first_child: Option<FiberId>,
        new_children: &[Node],
    ) -> Option<FiberId> {
        let mut resulting_first_child: Option<FiberId> = None;
        let mut previous_new_fiber: Option<FiberId> = None;

        let mut old_fiber = current_first_child;
        let mut last_placed_index = 0;
        let mut new_idx = 0;
        let mut next_old_fiber: Option<FiberId>;

        let mut link = |arena: &mut FiberArena, fiber: FiberId| {
            match previous_new_fiber {
                None => resulting_first_child = Some(fiber),
                Some(previous) => arena[previous].sibling = Some(fiber),
            }
            previous_new_fiber = Some(fiber);
        };

        // Pass 1: walk old and new in lockstep while keys line up.
        while new_idx < new_children.len() {
            let Some(old) = old_fiber else {
                break;
            };
            if arena[old].index > new_idx {
                // A hole in the old list; the old fiber belongs further right.
                next_old_fiber = Some(old);
                old_fiber = None;
            } else {
                next_old_fiber = arena[old].sibling;
            }
            let Some(new_fiber) =
                self.update_slot(arena, return_fiber, old_fiber, &new_children[new_idx])
            else {
                if old_fiber.is_none() {
                    old_fiber = next_old_fiber;
                }
                break;
            };
            if self.should_track_side_effects {
                if let Some(old) = old_fiber {
                    if arena[new_fiber].alternate.is_none() {
                        // Matched the slot but not the type; the old one goes.
                        self.delete_child(arena, return_fiber, old);
                    }
                }
            }
            last_placed_index = self.place_child(arena, new_fiber, last_placed_index, new_idx);
            link(arena, new_fiber);
            old_fiber = next_old_fiber;
            new_idx += 1;
        }

        if new_idx == new_children.len() {
            self.delete_remaining_children(arena, return_fiber, old_fiber);
            return resulting_first_child;
        }

        if old_fiber.is_none() {
            // Pass 2a: only insertions remain.
            for (idx, new_child) in new_children.iter().enumerate().skip(new_idx) {
                let Some(new_fiber) = self.create_child(arena, return_fiber, new_child) else {
                    continue;
                };
                last_placed_index = self.place_child(arena, new_fiber, last_placed_index, idx);
                link(arena, new_fiber);
            }
            return resulting_first_child;
        }

        // Pass 2b: match the rest by key (or index) through a map.
        let mut existing = self.map_remaining_children(arena, old_fiber);
        for (idx, new_child) in new_children.iter().enumerate().skip(new_idx) {
            let Some(new_fiber) =
                self.update_from_map(arena, &existing, return_fiber, idx, new_child)
            else {
                continue;
            };
            if self.should_track_side_effects && arena[new_fiber].alternate.is_some() {
                let claimed = match &arena[new_fiber].key {
                    Some(key) => ChildKey::Key(key.clone()),
                    None => ChildKey::Index(idx),
                };
                existing.remove(&claimed);
            }
            last_placed_index = self.place_child(arena, new_fiber, last_placed_index, idx);
            link(arena, new_fiber);
        }

        if self.should_track_side_effects {
            let mut unclaimed: Vec<FiberId> = existing.into_values().collect();
            unclaimed.sort_by_key(|&fiber| arena[fiber].index);
            for child in unclaimed {
                self.delete_child(arena, return_fiber, child);
            }
        }

        resulting_first_child
    }

    fn reconcile_single_element(
        &self,
        arena: &mut FiberArena,
        return_fiber: FiberId,
        current_first_child: Option<FiberId>,
        element: &Element,
    ) -> FiberId {
        let mut child = current_first_child;
        while let Some(c) = child {
            if arena[c].key.as_ref() == element.key_ref() {
                if arena[c].element_type.as_ref() == Some(element.element_type()) {
                    let rest = arena[c].sibling;
                    self.delete_remaining_children(arena, return_fiber, rest);
                    let existing = self.use_fiber(arena, c, element_props(element));
                    arena[existing].return_fiber = Some(return_fiber);
                    return existing;
                }
                // Same key, different type: nothing after it can match.
                self.delete_remaining_children(arena, return_fiber, Some(c));
                break;
            }
            self.delete_child(arena, return_fiber, c);
            child = arena[c].sibling;
        }

        let created = arena.create_fiber_from_element(element);
        arena[created].return_fiber = Some(return_fiber);
        created
    }

    fn reconcile_single_text_node(
        &self,
        arena: &mut FiberArena,
        return_fiber: FiberId,
        current_first_child: Option<FiberId>,
        text: &Rc<str>,
    ) -> FiberId {
        if let Some(first) = current_first_child {
            if arena[first].tag == WorkTag::HostText {
                let rest = arena[first].sibling;
                self.delete_remaining_children(arena, return_fiber, rest);
                let existing = self.use_fiber(arena, first, FiberProps::Text(text.clone()));
                arena[existing].return_fiber = Some(return_fiber);
                return existing;
            }
        }
        self.delete_remaining_children(arena, return_fiber, current_first_child);
        let created = arena.create_fiber_from_text(text.clone());
        arena[created].return_fiber = Some(return_fiber);
        created
    }

    /// Reconcile the children of `return_fiber` and return its new first
    /// child.
    pub(crate) fn reconcile_child_fibers(
        &self,
        arena: &mut FiberArena,
        return_fiber: FiberId,
        current_first_child: Option<FiberId>,
        new_child: &Node,
    ) -> Option<FiberId> {
        match new_child {
            _ if is_hole(new_child) => {
                self.delete_remaining_children(arena, return_fiber, current_first_child);
                None
            }
            Node::Element(element) => {
                let fiber =
                    self.reconcile_single_element(arena, return_fiber, current_first_child, element);
                Some(self.place_single_child(arena, fiber))
            }
            Node::Text(text) => {
                let fiber =
                    self.reconcile_single_text_node(arena, return_fiber, current_first_child, text);
                Some(self.place_single_child(arena, fiber))
            }
            Node::List(children) => {
                self.reconcile_children_array(arena, return_fiber, current_first_child, children)
            }
            Node::Empty => {
                self.delete_remaining_children(arena, return_fiber, current_first_child);
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/child_fiber_tests.rs"]
mod tests;
