//! # Document
//!
//! Arena of nodes rooted at a single document node. Removed nodes stay in the
//! arena (detached) so handles held by callers remain valid.

use crate::node::NodeData;
use crate::{
    AdjacentPosition, DomError, DomResult, NodeId, NodeKind, TreeMutations, TreeTraversal,
};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document)],
            root: NodeId(0),
        }
    }

    /// Number of nodes ever created, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|data| &data.kind)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Text { content } => Some(content.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self, node: NodeId) -> Option<&HashMap<String, String>> {
        match self.kind(node)? {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// Pre-order descendants of `scope`, excluding `scope` itself
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// True if `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    fn data(&self, node: NodeId) -> DomResult<&NodeData> {
        self.nodes.get(node.0).ok_or(DomError::UnknownNode(node))
    }

    fn data_mut(&mut self, node: NodeId) -> DomResult<&mut NodeData> {
        self.nodes.get_mut(node.0).ok_or(DomError::UnknownNode(node))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(kind));
        id
    }

    fn attributes_mut(&mut self, node: NodeId) -> DomResult<&mut HashMap<String, String>> {
        match &mut self.data_mut(node)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomError::NotAnElement(node)),
        }
    }

    /// Validate that `child` may become a child of `parent`
    fn check_insertable(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let parent_data = self.data(parent)?;
        self.data(child)?;
        if !parent_data.kind.can_have_children()
            || child == self.root
            || self.is_inclusive_ancestor(child, parent)
        {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Detach `node` from its parent, if it has one
    fn detach(&mut self, node: NodeId) -> DomResult<()> {
        if let Some(parent) = self.data(node)?.parent {
            let siblings = &mut self.data_mut(parent)?.children;
            siblings.retain(|c| *c != node);
            self.data_mut(node)?.parent = None;
        }
        Ok(())
    }

    fn splice(&mut self, parent: NodeId, index: usize, child: NodeId) -> DomResult<()> {
        let siblings = &mut self.data_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.data_mut(child)?.parent = Some(parent);
        trace!(%parent, %child, index, "spliced node");
        Ok(())
    }

    fn position_of(&self, parent: NodeId, child: NodeId) -> DomResult<usize> {
        self.data(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(DomError::NotAChild { parent, child })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeTraversal for Document {
    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|data| data.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|data| data.children.as_slice())
            .unwrap_or(&[])
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.kind(node).is_some_and(NodeKind::is_element)
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attributes(node)
            .is_some_and(|attrs| attrs.contains_key(name))
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attributes(node)?.get(name).map(String::as_str)
    }
}

impl TreeMutations for Document {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::element(tag))
    }

    fn create_text(&mut self, content: &str) -> NodeId {
        self.push(NodeKind::text(content))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.attributes_mut(node)?
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<()> {
        self.attributes_mut(node)?.remove(name);
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, content: &str) -> DomResult<()> {
        match &mut self.data_mut(node)?.kind {
            NodeKind::Text { content: existing } => {
                *existing = content.to_string();
                Ok(())
            }
            _ => Err(DomError::NotText(node)),
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.check_insertable(parent, child)?;
        if let Some(reference) = reference {
            self.position_of(parent, reference)?;
        }

        // Inserting a node before itself keeps it in place.
        let reference = match reference {
            Some(r) if r == child => self.next_sibling(child),
            other => other,
        };

        self.detach(child)?;
        let index = match reference {
            Some(r) => self.position_of(parent, r)?,
            None => self.child_count(parent),
        };
        self.splice(parent, index, child)?;
        Ok(child)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.position_of(parent, child)?;
        self.detach(child)?;
        Ok(child)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId> {
        self.position_of(parent, old_child)?;
        if new_child == old_child {
            return Ok(old_child);
        }
        self.check_insertable(parent, new_child)?;

        self.detach(new_child)?;
        let index = self.position_of(parent, old_child)?;
        self.detach(old_child)?;
        self.splice(parent, index, new_child)?;
        Ok(old_child)
    }

    fn insert_adjacent(
        &mut self,
        target: NodeId,
        position: AdjacentPosition,
        node: NodeId,
    ) -> DomResult<NodeId> {
        match position {
            AdjacentPosition::BeforeBegin => {
                let parent = self.parent(target).ok_or(DomError::Detached(target))?;
                self.insert_before(parent, node, Some(target))
            }
            AdjacentPosition::AfterBegin => {
                let first = self.child_at(target, 0);
                self.insert_before(target, node, first)
            }
            AdjacentPosition::BeforeEnd => self.append_child(target, node),
            AdjacentPosition::AfterEnd => {
                let parent = self.parent(target).ok_or(DomError::Detached(target))?;
                let next = self.next_sibling(target);
                self.insert_before(parent, node, next)
            }
        }
    }
}

impl Document {
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index_in_parent(node)?;
        self.child_at(parent, index + 1)
    }
}
