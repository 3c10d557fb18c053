use indexmap::IndexMap;

use fiber_core::{Callback, HostConfig, HostError, NodeId, PropValue, Props};

#[derive(Debug, Clone, PartialEq)]
pub enum HostNodeKind {
    Element {
        tag: String,
        attributes: IndexMap<String, PropValue>,
    },
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostNode {
    pub kind: HostNodeKind,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// Every mutation the reconciler performed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    CreateInstance { id: NodeId, tag: String },
    CreateText { id: NodeId, text: String },
    AppendChild { parent: NodeId, child: NodeId },
    InsertBefore { parent: NodeId, child: NodeId, before: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
    CommitUpdate { id: NodeId },
    CommitTextUpdate { id: NodeId, text: String },
    CommitMount { id: NodeId },
}

impl HostOp {
    /// Whether the op changes the shape of the tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            HostOp::AppendChild { .. } | HostOp::InsertBefore { .. } | HostOp::RemoveChild { .. }
        )
    }
}

fn attributes_of(props: &Props) -> IndexMap<String, PropValue> {
    props
        .attributes()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Host tree kept in a vector. Removed nodes stay allocated but detached.
#[derive(Default)]
pub struct MemoryHost {
    nodes: Vec<Option<HostNode>>,
    ops: Vec<HostOp>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element to render into.
    pub fn create_container(&mut self) -> NodeId {
        self.insert(HostNodeKind::Element {
            tag: "root".to_string(),
            attributes: IndexMap::new(),
        })
    }

    fn insert(&mut self, kind: HostNodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(HostNode {
            kind,
            children: Vec::new(),
            parent: None,
        }));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&HostNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut HostNode, HostError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(HostError::Missing { id })
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        match &self.node(id)?.kind {
            HostNodeKind::Element { attributes, .. } => attributes.get(name),
            HostNodeKind::Text(_) => None,
        }
    }

    pub fn callback(&self, id: NodeId, name: &str) -> Option<Callback> {
        self.attribute(id, name)?.as_callback().cloned()
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            HostNodeKind::Text(text) => out.push_str(text),
            HostNodeKind::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// First attached node under `root` (depth first) whose attribute
    /// `name` is the string `value`.
    pub fn find(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        if self.attribute(root, name).and_then(PropValue::as_str) == Some(value) {
            return Some(root);
        }
        self.children(root)
            .iter()
            .find_map(|&child| self.find(child, name, value))
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.node(id) {
            Some(node) => {
                match &node.kind {
                    HostNodeKind::Element { tag, attributes } => {
                        output.push_str(&format!("{indent}[{id}] <{tag}"));
                        for (name, value) in attributes {
                            output.push_str(&format!(" {name}={value:?}"));
                        }
                        output.push_str(">\n");
                    }
                    HostNodeKind::Text(text) => {
                        output.push_str(&format!("{indent}[{id}] {text:?}\n"));
                    }
                }
                for &child in &node.children {
                    self.dump_node(output, child, depth + 1);
                }
            }
            None => output.push_str(&format!("{indent}[{id}] (missing)\n")),
        }
    }

    fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
        if let Some(old_parent) = self.node_mut(child)?.parent.take() {
            self.node_mut(old_parent)?.children.retain(|&c| c != child);
        }
        Ok(())
    }
}

impl HostConfig for MemoryHost {
    fn create_instance(&mut self, ty: &str, props: &Props) -> NodeId {
        let id = self.insert(HostNodeKind::Element {
            tag: ty.to_string(),
            attributes: attributes_of(props),
        });
        self.ops.push(HostOp::CreateInstance {
            id,
            tag: ty.to_string(),
        });
        id
    }

    fn create_text_instance(&mut self, text: &str) -> NodeId {
        let id = self.insert(HostNodeKind::Text(text.to_string()));
        self.ops.push(HostOp::CreateText {
            id,
            text: text.to_string(),
        });
        id
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.node_mut(parent)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.ops.push(HostOp::AppendChild { parent, child });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), HostError> {
        if !self.node_mut(parent)?.children.contains(&before) {
            return Err(HostError::NotAChild {
                parent,
                child: before,
            });
        }
        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|&c| c == before)
            .ok_or(HostError::NotAChild {
                parent,
                child: before,
            })?;
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.ops.push(HostOp::InsertBefore {
            parent,
            child,
            before,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|&c| c == child)
            .ok_or(HostError::NotAChild { parent, child })?;
        siblings.remove(index);
        self.node_mut(child)?.parent = None;
        self.ops.push(HostOp::RemoveChild { parent, child });
        Ok(())
    }

    fn commit_update(&mut self, node: NodeId, next: &Props, _prev: &Props) -> Result<(), HostError> {
        match &mut self.node_mut(node)?.kind {
            HostNodeKind::Element { attributes, .. } => *attributes = attributes_of(next),
            HostNodeKind::Text(_) => return Err(HostError::Unsupported { op: "commit_update on text" }),
        }
        self.ops.push(HostOp::CommitUpdate { id: node });
        Ok(())
    }

    fn commit_text_update(&mut self, node: NodeId, _old: &str, new: &str) -> Result<(), HostError> {
        match &mut self.node_mut(node)?.kind {
            HostNodeKind::Text(text) => *text = new.to_string(),
            HostNodeKind::Element { .. } => {
                return Err(HostError::Unsupported {
                    op: "commit_text_update on element",
                })
            }
        }
        self.ops.push(HostOp::CommitTextUpdate {
            id: node,
            text: new.to_string(),
        });
        Ok(())
    }

    /// Elements with `autofocus` set ask for a post-attach mount step.
    fn finalize_initial_children(&mut self, _node: NodeId, _ty: &str, props: &Props) -> bool {
        props.get("autofocus").and_then(PropValue::as_bool) == Some(true)
    }

    fn commit_mount(&mut self, node: NodeId, ty: &str, _props: &Props) -> Result<(), HostError> {
        log::trace!("mounted <{ty}> as {node}");
        self.ops.push(HostOp::CommitMount { id: node });
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/memory_host_tests.rs"]
mod tests;
