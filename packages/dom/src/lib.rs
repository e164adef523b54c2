//! # Treeweave DOM
//!
//! Arena-backed document tree and the primitive operations the patcher wraps.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ dom: Document + primitives                  │
//! │  - traversal (parent, children, siblings)   │
//! │  - mutations (insert, remove, move, attrs)  │
//! │  - queries (id, tag, class, selector)       │
//! └─────────────────────────────────────────────┘
//!                     ↑
//! ┌─────────────────────────────────────────────┐
//! │ patcher: interception + remote edit replay  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The three capability traits ([`TreeTraversal`], [`TreeMutations`],
//! [`TreeQueries`]) are the seam the patcher decorates. [`Document`] is the
//! concrete implementation; every primitive is atomic and either succeeds or
//! leaves the tree untouched.
//!
//! ## Usage
//!
//! ```rust
//! use treeweave_dom::{Document, TreeMutations, TreeQueries, TreeTraversal};
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let div = doc.create_element("div");
//! doc.set_attribute(div, "id", "main").unwrap();
//! doc.append_child(root, div).unwrap();
//!
//! assert_eq!(doc.get_element_by_id("main"), Some(div));
//! assert_eq!(doc.to_html(), r#"<div id="main"></div>"#);
//! ```

mod document;
mod errors;
mod html;
mod mutations;
mod node;
mod query;
mod selector;
mod snapshot;

pub use document::Document;
pub use errors::{DomError, DomResult};
pub use html::escape_html;
pub use mutations::{AdjacentPosition, TreeMutations};
pub use node::{NodeId, NodeKind};
pub use query::TreeQueries;
pub use selector::SelectorList;
pub use snapshot::SnapshotNode;

/// Read-only structural access to a tree.
///
/// Traversal is never filtered: it reflects the physical tree exactly.
pub trait TreeTraversal {
    fn root(&self) -> NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children in sibling order. Unknown nodes have none.
    fn children(&self, node: NodeId) -> &[NodeId];

    fn child_count(&self, node: NodeId) -> usize {
        self.children(node).len()
    }

    fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).get(index).copied()
    }

    /// Position of `node` among its parent's children.
    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|c| *c == node)
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index_in_parent(node)?;
        index.checked_sub(1).and_then(|i| self.child_at(parent, i))
    }

    /// True when walking parent links from `node` reaches the root.
    fn is_attached(&self, node: NodeId) -> bool {
        let root = self.root();
        let mut current = node;
        loop {
            if current == root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn is_element(&self, node: NodeId) -> bool;

    fn has_attribute(&self, node: NodeId, name: &str) -> bool;

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str>;
}

/// Everything the patcher needs from a tree.
pub trait DomTree: TreeTraversal + TreeMutations + TreeQueries {}

impl<T: TreeTraversal + TreeMutations + TreeQueries> DomTree for T {}
