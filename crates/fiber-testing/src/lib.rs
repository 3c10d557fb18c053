//! Testing utilities for Fiber-RS: an in-memory host that records every
//! mutation, and a root harness built on it.

pub mod memory_host;
pub mod test_root;

pub use memory_host::{HostNode, HostNodeKind, HostOp, MemoryHost};
pub use test_root::{run_test_root, TestRoot};

pub mod prelude {
    pub use crate::memory_host::*;
    pub use crate::test_root::*;
}
