//! Incremental tree reconciler.
//!
//! Components describe a tree of [`Element`]s; each render is diffed against
//! the committed fiber tree and the minimal set of mutations is applied to a
//! [`HostConfig`]. State hooks, effects and keyed reordering follow the
//! fiber model: a current tree, a work-in-progress tree built beside it, and
//! a commit that swaps the two.

pub mod collections;
pub mod element;
pub mod error;
pub mod fiber;
pub mod flags;
pub mod hooks;
pub mod host;
pub mod list;
pub mod owned;
pub mod root;
pub mod update_queue;

mod begin_work;
mod child_fiber;
mod commit;
mod complete_work;
mod scheduler;
mod work_loop;

/// Identifier of a node owned by the host.
pub type NodeId = usize;

pub use element::{
    create_element, Callback, Component, Element, ElementType, Key, Node, PropValue, Props,
};
pub use error::{HostError, ReconcileError};
pub use fiber::{FiberId, FiberSnapshot, WorkTag};
pub use flags::{Flags, HookFlags, Lane, Lanes, NO_LANES, SYNC_LANE};
pub use hooks::{Deps, Dispatch, EffectCleanup, Hooks, SetState, StateAction};
pub use host::HostConfig;
pub use owned::Owned;
pub use root::{create_root, create_root_with_options, Root};
pub use scheduler::{RootOptions, ScheduleUpdate};
