use std::fmt;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use slotmap::SlotMap;

use crate::collections::map::HashSet;
use crate::element::{Element, ElementType, Key, Props};
use crate::flags::{Flags, Lanes, NO_LANES};
use crate::hooks::Hook;
use crate::hooks::Effect;
use crate::list::CircularList;
use crate::owned::Owned;
use crate::update_queue::{initialize_update_queue, RootState, UpdateQueue};
use crate::NodeId;

slotmap::new_key_type! {
    /// Stable handle of a fiber in the arena.
    pub struct FiberId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkTag {
    FunctionComponent = 0,
    HostRoot = 3,
    HostComponent = 5,
    HostText = 6,
}

impl WorkTag {
    pub fn is_host_node(self) -> bool {
        matches!(self, WorkTag::HostComponent | WorkTag::HostText)
    }

    pub fn is_host_parent(self) -> bool {
        matches!(self, WorkTag::HostComponent | WorkTag::HostRoot)
    }
}

/// Input of a fiber: element props, or the string of a text fiber.
#[derive(Clone, Debug, Default)]
pub enum FiberProps {
    #[default]
    None,
    Element(Props),
    Text(Rc<str>),
}

impl FiberProps {
    pub fn as_props(&self) -> Option<&Props> {
        match self {
            FiberProps::Element(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FiberProps::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateNode {
    Host(NodeId),
    Root,
}

#[derive(Clone, Default)]
pub enum FiberState {
    #[default]
    None,
    Root(RootState),
    Hooks(Vec<Hook>),
}

#[derive(Clone, Default)]
pub enum FiberUpdateQueue {
    #[default]
    None,
    Root(Owned<UpdateQueue>),
    /// Effects pushed by the last render, in call order.
    Effects(Rc<CircularList<Owned<Effect>>>),
}

pub struct Fiber {
    pub tag: WorkTag,
    pub key: Option<Key>,
    pub element_type: Option<ElementType>,
    pub state_node: Option<StateNode>,

    pub return_fiber: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    pub index: usize,

    pub pending_props: FiberProps,
    pub memoized_props: FiberProps,
    pub memoized_state: FiberState,
    pub update_queue: FiberUpdateQueue,

    pub flags: Flags,
    pub subtree_flags: Flags,
    pub deletions: Vec<FiberId>,

    pub lanes: Lanes,
    pub child_lanes: Lanes,

    pub alternate: Option<FiberId>,
}

impl Fiber {
    fn new(tag: WorkTag, pending_props: FiberProps, key: Option<Key>) -> Self {
        Self {
            tag,
            key,
            element_type: None,
            state_node: None,
            return_fiber: None,
            child: None,
            sibling: None,
            index: 0,
            pending_props,
            memoized_props: FiberProps::None,
            memoized_state: FiberState::None,
            update_queue: FiberUpdateQueue::None,
            flags: Flags::NONE,
            subtree_flags: Flags::NONE,
            deletions: Vec::new(),
            lanes: NO_LANES,
            child_lanes: NO_LANES,
            alternate: None,
        }
    }

    pub fn host_node(&self) -> Option<NodeId> {
        match self.state_node {
            Some(StateNode::Host(id)) => Some(id),
            _ => None,
        }
    }

    /// Human readable name used by logs and snapshots.
    pub fn display_name(&self) -> String {
        match self.tag {
            WorkTag::HostRoot => "root".to_string(),
            WorkTag::HostText => format!("{:?}", self.memoized_props.as_text().unwrap_or("")),
            _ => self
                .element_type
                .as_ref()
                .map(|ty| ty.name().to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Debug for Fiber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fiber")
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("type", &self.element_type)
            .field("index", &self.index)
            .field("flags", &self.flags)
            .field("subtree_flags", &self.subtree_flags)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct FiberArena {
    fibers: SlotMap<FiberId, Fiber>,
    /// Fibers allocated by the render in flight, until it commits.
    created: Vec<FiberId>,
}

impl FiberArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber> {
        self.fibers.get_mut(id)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    pub fn create_fiber(
        &mut self,
        tag: WorkTag,
        pending_props: FiberProps,
        key: Option<Key>,
    ) -> FiberId {
        let id = self.fibers.insert(Fiber::new(tag, pending_props, key));
        self.created.push(id);
        id
    }

    pub fn create_fiber_from_element(&mut self, element: &Element) -> FiberId {
        let tag = match element.element_type() {
            ElementType::Host(_) => WorkTag::HostComponent,
            ElementType::Component(_) => WorkTag::FunctionComponent,
        };
        let id = self.create_fiber(
            tag,
            FiberProps::Element(element.props().clone()),
            element.key_ref().cloned(),
        );
        self[id].element_type = Some(element.element_type().clone());
        id
    }

    pub fn create_fiber_from_text(&mut self, text: Rc<str>) -> FiberId {
        self.create_fiber(WorkTag::HostText, FiberProps::Text(text), None)
    }

    /// Produce the work-in-progress twin of `current`, reusing the alternate
    /// allocated by an earlier render when there is one.
    pub fn create_work_in_progress(
        &mut self,
        current: FiberId,
        pending_props: FiberProps,
    ) -> FiberId {
        let wip = match self[current].alternate {
            Some(wip) => {
                let fiber = &mut self[wip];
                fiber.pending_props = pending_props;
                fiber.flags = Flags::NONE;
                fiber.subtree_flags = Flags::NONE;
                fiber.deletions.clear();
                wip
            }
            None => {
                let source = &self[current];
                let mut fiber = Fiber::new(source.tag, pending_props, source.key.clone());
                fiber.element_type = source.element_type.clone();
                fiber.state_node = source.state_node;
                fiber.alternate = Some(current);
                let wip = self.fibers.insert(fiber);
                self.created.push(wip);
                self[current].alternate = Some(wip);
                wip
            }
        };

        let source = &self[current];
        let child = source.child;
        let sibling = source.sibling;
        let index = source.index;
        let memoized_props = source.memoized_props.clone();
        let memoized_state = source.memoized_state.clone();
        let update_queue = source.update_queue.clone();
        let lanes = source.lanes;
        let child_lanes = source.child_lanes;

        let fiber = &mut self[wip];
        fiber.child = child;
        fiber.sibling = sibling;
        fiber.index = index;
        fiber.memoized_props = memoized_props;
        fiber.memoized_state = memoized_state;
        fiber.update_queue = update_queue;
        fiber.lanes = lanes;
        fiber.child_lanes = child_lanes;
        wip
    }

    /// Start tracking allocations for a new render.
    pub(crate) fn begin_render(&mut self) {
        self.created.clear();
    }

    /// The render committed; its fibers are now part of the tree.
    pub(crate) fn keep_render(&mut self) {
        self.created.clear();
    }

    /// Free every fiber the abandoned render allocated and unlink committed
    /// fibers from alternates that no longer exist. Returns how many were freed.
    pub(crate) fn discard_render(&mut self) -> usize {
        let created = std::mem::take(&mut self.created);
        let mut freed = 0;
        for &id in &created {
            let Some(fiber) = self.fibers.remove(id) else {
                continue;
            };
            freed += 1;
            if let Some(survivor) = fiber.alternate.and_then(|alt| self.fibers.get_mut(alt)) {
                if survivor.alternate == Some(id) {
                    survivor.alternate = None;
                }
            }
        }
        freed
    }

    /// Free a deleted fiber, its descendants and every alternate among them.
    pub fn detach_deleted_subtree(&mut self, fiber: FiberId) {
        let mut visited: HashSet<FiberId> = HashSet::default();
        let mut stack = vec![fiber];
        if let Some(alternate) = self.get(fiber).and_then(|f| f.alternate) {
            stack.push(alternate);
        }
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.fibers.get(id) else {
                continue;
            };
            if let Some(alternate) = node.alternate {
                stack.push(alternate);
            }
            let mut child = node.child;
            while let Some(c) = child {
                stack.push(c);
                child = self.fibers.get(c).and_then(|f| f.sibling);
            }
        }
        log::trace!("freeing {} fibers", visited.len());
        for id in visited {
            self.fibers.remove(id);
        }
    }

    pub fn children(&self, parent: FiberId) -> Children<'_> {
        Children {
            arena: self,
            next: self.get(parent).and_then(|f| f.child),
        }
    }

    pub fn snapshot(&self, fiber: FiberId) -> Option<FiberSnapshot> {
        let node = self.get(fiber)?;
        Some(FiberSnapshot {
            tag: node.tag,
            name: node.display_name(),
            key: node.key.as_deref().map(str::to_string),
            flags: node.flags,
            host_node: node.host_node(),
            children: self
                .children(fiber)
                .filter_map(|child| self.snapshot(child))
                .collect(),
        })
    }
}

impl Index<FiberId> for FiberArena {
    type Output = Fiber;

    fn index(&self, id: FiberId) -> &Fiber {
        &self.fibers[id]
    }
}

impl IndexMut<FiberId> for FiberArena {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber {
        &mut self.fibers[id]
    }
}

pub struct Children<'a> {
    arena: &'a FiberArena,
    next: Option<FiberId>,
}

impl Iterator for Children<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.next?;
        self.next = self.arena.get(id).and_then(|f| f.sibling);
        Some(id)
    }
}

/// Root of a committed tree plus its attachment point in the host.
#[derive(Debug)]
pub struct FiberRoot {
    pub container_info: NodeId,
    pub current: FiberId,
    pub finished_work: Option<FiberId>,
    pub pending_lanes: Lanes,
}

pub fn create_fiber_root(arena: &mut FiberArena, container: NodeId) -> FiberRoot {
    let root_fiber = arena.create_fiber(WorkTag::HostRoot, FiberProps::None, None);
    let state = RootState::default();
    let fiber = &mut arena[root_fiber];
    fiber.state_node = Some(StateNode::Root);
    fiber.memoized_state = FiberState::Root(state.clone());
    fiber.update_queue = FiberUpdateQueue::Root(initialize_update_queue(state));
    FiberRoot {
        container_info: container,
        current: root_fiber,
        finished_work: None,
        pending_lanes: NO_LANES,
    }
}

/// Printable copy of a committed fiber tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiberSnapshot {
    pub tag: WorkTag,
    pub name: String,
    pub key: Option<String>,
    pub flags: Flags,
    pub host_node: Option<NodeId>,
    pub children: Vec<FiberSnapshot>,
}

impl FiberSnapshot {
    /// Depth-first iterator over this node and all of its descendants.
    pub fn walk(&self) -> Vec<&FiberSnapshot> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{:?} {}", "", self.tag, self.name, indent = depth * 2)?;
        if let Some(key) = &self.key {
            write!(f, " key={key}")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for FiberSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
#[path = "tests/fiber_tests.rs"]
mod tests;
