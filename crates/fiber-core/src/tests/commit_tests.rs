use super::*;
use crate::element::Props;
use crate::error::HostError;
use crate::fiber::create_fiber_root;

/// Host that counts calls and never expects to be touched.
#[derive(Default)]
struct CountingHost {
    calls: usize,
}

impl HostConfig for CountingHost {
    fn create_instance(&mut self, _ty: &str, _props: &Props) -> NodeId {
        self.calls += 1;
        self.calls
    }

    fn create_text_instance(&mut self, _text: &str) -> NodeId {
        self.calls += 1;
        self.calls
    }

    fn append_child(&mut self, _parent: NodeId, _child: NodeId) -> Result<(), HostError> {
        self.calls += 1;
        Ok(())
    }

    fn insert_before(
        &mut self,
        _parent: NodeId,
        _child: NodeId,
        _before: NodeId,
    ) -> Result<(), HostError> {
        self.calls += 1;
        Ok(())
    }

    fn remove_child(&mut self, _parent: NodeId, _child: NodeId) -> Result<(), HostError> {
        self.calls += 1;
        Ok(())
    }

    fn commit_update(&mut self, _node: NodeId, _next: &Props, _prev: &Props) -> Result<(), HostError> {
        self.calls += 1;
        Ok(())
    }

    fn commit_text_update(&mut self, _node: NodeId, _old: &str, _new: &str) -> Result<(), HostError> {
        self.calls += 1;
        Ok(())
    }
}

#[test]
fn committing_the_current_tree_again_is_rejected() {
    let mut arena = FiberArena::new();
    let mut host = CountingHost::default();
    let mut root = create_fiber_root(&mut arena, 0);
    let current = root.current;

    root.finished_work = Some(current);
    let result = commit_root(&mut root, &mut arena, &mut host);

    assert_eq!(result, Err(ReconcileError::DoubleCommit));
    assert_eq!(root.current, current);
    assert!(root.finished_work.is_none());
    assert_eq!(host.calls, 0);
}

#[test]
fn nothing_to_commit_is_a_no_op() {
    let mut arena = FiberArena::new();
    let mut host = CountingHost::default();
    let mut root = create_fiber_root(&mut arena, 0);
    let current = root.current;

    assert_eq!(commit_root(&mut root, &mut arena, &mut host), Ok(()));
    assert_eq!(root.current, current);
    assert_eq!(arena.len(), 1);
    assert_eq!(host.calls, 0);
}
