use fiber_core::{
    create_root_with_options, FiberSnapshot, Node, NodeId, ReconcileError, Root, RootOptions,
};

use crate::memory_host::{HostOp, MemoryHost};

/// Headless harness that renders into a [`MemoryHost`] container.
///
/// Host inspection helpers borrow the root, so they must not be called from
/// inside a component or an effect.
pub struct TestRoot {
    root: Root<MemoryHost>,
    container: NodeId,
}

impl TestRoot {
    pub fn new() -> Self {
        Self::with_options(RootOptions::default())
    }

    pub fn with_options(options: RootOptions) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        Self {
            root: create_root_with_options(host, container, options),
            container,
        }
    }

    pub fn render(&self, node: impl Into<Node>) -> Result<(), ReconcileError> {
        self.root.render(node).map(|_| ())
    }

    pub fn unmount(&self) -> Result<(), ReconcileError> {
        self.root.unmount()
    }

    pub fn root(&self) -> &Root<MemoryHost> {
        &self.root
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn with_host<R>(&self, f: impl FnOnce(&MemoryHost) -> R) -> R {
        self.root.with_host(f)
    }

    /// Text content of the whole container.
    pub fn text(&self) -> String {
        self.with_host(|host| host.text_content(self.container))
    }

    pub fn dump(&self) -> String {
        self.with_host(|host| host.dump_tree(Some(self.container)))
    }

    /// Host children of the container.
    pub fn top_level(&self) -> Vec<NodeId> {
        self.with_host(|host| host.children(self.container).to_vec())
    }

    pub fn find(&self, attribute: &str, value: &str) -> Option<NodeId> {
        self.with_host(|host| host.find(self.container, attribute, value))
    }

    pub fn take_ops(&self) -> Vec<HostOp> {
        self.root.with_host_mut(MemoryHost::take_ops)
    }

    pub fn committed_tree(&self) -> FiberSnapshot {
        self.root.committed_tree()
    }

    /// Invoke the callback stored under `event` on `node`. Returns whether a
    /// handler was found.
    pub fn fire(&self, node: NodeId, event: &str) -> bool {
        // Clone the handler out first: it may render, which needs the host.
        let handler = self.with_host(|host| host.callback(node, event));
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => {
                log::warn!("no {event} handler on host node {node}");
                false
            }
        }
    }
}

impl Default for TestRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need a root for one closure.
pub fn run_test_root<R>(f: impl FnOnce(&mut TestRoot) -> R) -> R {
    let mut root = TestRoot::new();
    f(&mut root)
}
