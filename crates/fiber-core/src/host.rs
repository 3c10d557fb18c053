use crate::element::{ElementType, Props};
use crate::error::HostError;
use crate::NodeId;

/// The mutable tree the reconciler drives.
///
/// Nodes are created detached during the complete phase and only attached,
/// moved, updated or removed during commit.
pub trait HostConfig {
    fn create_instance(&mut self, ty: &str, props: &Props) -> NodeId;

    fn create_text_instance(&mut self, text: &str) -> NodeId;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    /// Insert `child` before `before`. Moving an already attached child is
    /// allowed; the host detaches it from its old position first.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    fn commit_update(&mut self, node: NodeId, next: &Props, prev: &Props)
        -> Result<(), HostError>;

    fn commit_text_update(&mut self, node: NodeId, old: &str, new: &str)
        -> Result<(), HostError>;

    /// Called once per new element after its initial children were appended.
    /// Returning `true` requests a `commit_mount` once the node is attached.
    fn finalize_initial_children(&mut self, _node: NodeId, _ty: &str, _props: &Props) -> bool {
        false
    }

    fn commit_mount(&mut self, _node: NodeId, _ty: &str, _props: &Props) -> Result<(), HostError> {
        Ok(())
    }
}

pub(crate) fn host_tag(ty: Option<&ElementType>) -> &str {
    match ty {
        Some(ElementType::Host(tag)) => tag,
        _ => "",
    }
}
