use bitflags::bitflags;

bitflags! {
    /// Pending side effects recorded on a fiber during render and consumed
    /// during commit.
    ///
    /// `flags` describes the fiber itself; `subtree_flags` is the union of
    /// every descendant's flags, filled in by the complete phase so commit can
    /// skip subtrees with nothing to do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u32 {
        /// The fiber rendered (function components only).
        const PERFORMED_WORK = 1 << 0;
        /// Insert (or move) the fiber's host nodes.
        const PLACEMENT = 1 << 1;
        /// Host props or text changed.
        const UPDATE = 1 << 2;
        /// `deletions` holds children to remove.
        const CHILD_DELETION = 1 << 4;
        /// At least one passive effect must run.
        const PASSIVE = 1 << 11;
    }
}

impl Flags {
    pub const NONE: Flags = Flags::empty();

    /// Bits the mutation pass acts on.
    pub const MUTATION_MASK: Flags = Flags::PLACEMENT
        .union(Flags::UPDATE)
        .union(Flags::CHILD_DELETION);

    /// Bits the passive pass acts on. Deletions are included because deleted
    /// function components still own cleanups.
    pub const PASSIVE_MASK: Flags = Flags::PASSIVE.union(Flags::CHILD_DELETION);
}

bitflags! {
    /// Tag carried by each effect record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HookFlags: u8 {
        /// Dependencies changed (or first mount); the effect fires this commit.
        const HAS_EFFECT = 1 << 0;
        /// Runs in the passive pass after mutations.
        const PASSIVE = 1 << 3;
    }
}

bitflags! {
    /// Priority buckets. Every update uses [`SYNC_LANE`]; the set type is kept
    /// so ancestors can record "a descendant has pending work".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Lanes: u32 {
        const SYNC = 1 << 0;
    }
}

/// A single lane.
pub type Lane = Lanes;

pub const NO_LANES: Lanes = Lanes::empty();
pub const SYNC_LANE: Lane = Lanes::SYNC;

#[inline]
pub fn merge_lanes(a: Lanes, b: Lanes) -> Lanes {
    a | b
}
