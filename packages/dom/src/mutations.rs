//! # Tree Mutations
//!
//! The primitive, always-atomic operations on a tree. Any node passed as a
//! new child that already has a parent is detached from it first, the same
//! way the DOM moves nodes.

use crate::{DomResult, NodeId};
use serde::{Deserialize, Serialize};

/// Where `insert_adjacent` places a node relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjacentPosition {
    /// Before the target itself
    BeforeBegin,
    /// Inside the target, before its first child
    AfterBegin,
    /// Inside the target, after its last child
    BeforeEnd,
    /// After the target itself
    AfterEnd,
}

pub trait TreeMutations {
    /// Create a detached element
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Create a detached text node
    fn create_text(&mut self, content: &str) -> NodeId;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<()>;

    /// Replace the content of a text node
    fn set_text(&mut self, node: NodeId, content: &str) -> DomResult<()>;

    /// Append `child` as the last child of `parent`
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId>;

    /// Insert `child` before `reference`, or append when `reference` is `None`
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId>;

    /// Remove `child` from `parent`, returning it detached
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId>;

    /// Put `new_child` where `old_child` is, returning `old_child` detached
    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId>;

    fn insert_adjacent(
        &mut self,
        target: NodeId,
        position: AdjacentPosition,
        node: NodeId,
    ) -> DomResult<NodeId>;

    /// Append a new text node holding `text` to `parent`
    fn write(&mut self, parent: NodeId, text: &str) -> DomResult<NodeId> {
        let node = self.create_text(text);
        self.append_child(parent, node)
    }
}
