//! DOM Tree (arena-based allocation)
//!
//! Low-level linking only. Mutation bookkeeping (observers, events) lives in
//! [`Document`](crate::Document).

use crate::{DomError, DomResult, Node, NodeId};

/// Arena-based DOM tree
#[derive(Debug, Default)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a tree holding just the document node
    pub fn new() -> Self {
        Self { nodes: vec![Node::document()] }
    }

    /// Root (document) node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Push a node into the arena, detached
    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub(crate) fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.some())
    }

    /// Direct children in order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        while let Some(node) = cur.some().and_then(|c| self.get(c)) {
            out.push(cur);
            cur = node.next_sibling;
        }
        out
    }

    /// All descendants in document (pre-)order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// `ancestor` is `id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = id.some();
        while let Some(node) = cur {
            if node == ancestor {
                return true;
            }
            cur = self.parent(node);
        }
        false
    }

    /// Link `child` under `parent`, before `reference` (append when NONE).
    ///
    /// `child` must already be detached.
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> DomResult<()> {
        let prev = if reference.is_valid() {
            let reference_node = self.node(reference)?;
            if reference_node.parent != parent {
                return Err(DomError::NotAChild);
            }
            reference_node.prev_sibling
        } else {
            self.node(parent)?.last_child
        };

        {
            let node = self.node_mut(child)?;
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }
        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = child;
        } else {
            self.node_mut(parent)?.first_child = child;
        }
        if reference.is_valid() {
            self.node_mut(reference)?.prev_sibling = child;
        } else {
            self.node_mut(parent)?.last_child = child;
        }
        Ok(())
    }

    /// Unlink `child` from its parent; its own subtree stays intact.
    pub(crate) fn unlink(&mut self, child: NodeId) -> DomResult<()> {
        let (parent, prev, next) = {
            let node = self.node(child)?;
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return Ok(());
        }
        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = next;
        } else {
            self.node_mut(parent)?.first_child = next;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = prev;
        } else {
            self.node_mut(parent)?.last_child = prev;
        }
        let node = self.node_mut(child)?;
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_and_unlink() {
        let mut tree = DomTree::new();
        let a = tree.push(Node::element("div"));
        let b = tree.push(Node::element("span"));
        let c = tree.push(Node::element("p"));

        tree.link(tree.root(), a, NodeId::NONE).unwrap();
        tree.link(a, c, NodeId::NONE).unwrap();
        tree.link(a, b, c).unwrap();
        assert_eq!(tree.children(a), vec![b, c]);

        tree.unlink(b).unwrap();
        assert_eq!(tree.children(a), vec![c]);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn test_descendants_document_order() {
        let mut tree = DomTree::new();
        let a = tree.push(Node::element("a"));
        let b = tree.push(Node::element("b"));
        let c = tree.push(Node::element("c"));
        tree.link(tree.root(), a, NodeId::NONE).unwrap();
        tree.link(a, b, NodeId::NONE).unwrap();
        tree.link(tree.root(), c, NodeId::NONE).unwrap();

        assert_eq!(tree.descendants(tree.root()), vec![a, b, c]);
        assert!(tree.is_inclusive_ancestor(a, b));
        assert!(!tree.is_inclusive_ancestor(c, b));
    }
}
