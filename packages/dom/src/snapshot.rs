//! # Snapshots
//!
//! Serializable form of a tree, used to seed a [`Document`] from JSON and to
//! dump one back out.
//!
//! ```json
//! [
//!   { "tag": "body", "attrs": { "class": "main" }, "children": [
//!     { "text": "hello" }
//!   ] }
//! ]
//! ```

use crate::{Document, DomError, DomResult, NodeId, NodeKind, TreeMutations, TreeTraversal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Text {
        text: String,
    },
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        attrs: HashMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<SnapshotNode>,
    },
}

impl SnapshotNode {
    pub fn element(tag: impl Into<String>) -> Self {
        SnapshotNode::Element {
            tag: tag.into(),
            attrs: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        SnapshotNode::Text { text: text.into() }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let SnapshotNode::Element { ref mut attrs, .. } = self {
            attrs.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: SnapshotNode) -> Self {
        if let SnapshotNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }
}

impl Document {
    /// Build a document whose root holds `nodes`
    pub fn from_snapshot(nodes: &[SnapshotNode]) -> DomResult<Self> {
        let mut doc = Document::new();
        let root = doc.root();
        for node in nodes {
            let id = doc.build(node)?;
            doc.append_child(root, id)?;
        }
        Ok(doc)
    }

    pub fn from_json(json: &str) -> DomResult<Self> {
        let nodes: Vec<SnapshotNode> =
            serde_json::from_str(json).map_err(|e| DomError::Snapshot(e.to_string()))?;
        Self::from_snapshot(&nodes)
    }

    pub fn to_snapshot(&self) -> Vec<SnapshotNode> {
        self.children(self.root())
            .iter()
            .filter_map(|child| self.snapshot_of(*child))
            .collect()
    }

    pub fn to_json(&self) -> DomResult<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| DomError::Snapshot(e.to_string()))
    }

    fn build(&mut self, node: &SnapshotNode) -> DomResult<NodeId> {
        match node {
            SnapshotNode::Text { text } => Ok(self.create_text(text)),
            SnapshotNode::Element {
                tag,
                attrs,
                children,
            } => {
                let id = self.create_element(tag);
                for (key, value) in attrs {
                    self.set_attribute(id, key, value)?;
                }
                for child in children {
                    let child_id = self.build(child)?;
                    self.append_child(id, child_id)?;
                }
                Ok(id)
            }
        }
    }

    fn snapshot_of(&self, node: NodeId) -> Option<SnapshotNode> {
        match self.kind(node)? {
            NodeKind::Text { content } => Some(SnapshotNode::text(content.clone())),
            NodeKind::Element { tag, attributes } => Some(SnapshotNode::Element {
                tag: tag.clone(),
                attrs: attributes.clone(),
                children: self
                    .children(node)
                    .iter()
                    .filter_map(|c| self.snapshot_of(*c))
                    .collect(),
            }),
            NodeKind::Document => None,
        }
    }
}
