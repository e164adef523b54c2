//! # Remote Edits
//!
//! The decoded form of the remote edit stream. Each variant carries only the
//! positions and payload it needs; wire records are converted in
//! [`crate::wire`].

use crate::path::ChildPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An attribute value as sent by the remote stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    /// Token list, joined with single spaces when written
    List(Vec<String>),
    /// Explicit absence marker (`null`): remove the attribute
    Absent,
}

impl AttrValue {
    /// The string to write, or `None` for the absence marker
    pub fn resolved(&self) -> Option<String> {
        match self {
            AttrValue::Text(text) => Some(text.clone()),
            AttrValue::List(items) => Some(items.join(" ")),
            AttrValue::Absent => None,
        }
    }
}

/// Ordered attribute changes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttrChanges(Vec<(String, AttrValue)>);

impl AttrChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.0.push((key.into(), value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, AttrValue)> for AttrChanges {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Content materialized by an Insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewNode {
    Element {
        tag: String,
        attributes: AttrChanges,
        children: Vec<NewNode>,
    },
    Text(String),
}

impl NewNode {
    pub fn element(tag: impl Into<String>) -> Self {
        NewNode::Element {
            tag: tag.into(),
            attributes: AttrChanges::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        NewNode::Text(content.into())
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        if let NewNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.0.push((key.into(), value));
        }
        self
    }

    pub fn with_child(mut self, child: NewNode) -> Self {
        if let NewNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }
}

/// One structural change from the remote stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEdit {
    /// Remove the node at `path` with its subtree
    Delete { path: ChildPath },

    /// Materialize `node` as child `index` of the node at `parent`
    Insert {
        parent: ChildPath,
        index: usize,
        node: NewNode,
    },

    /// Detach the node at `path` and append it to the node at `new_parent`
    Move {
        path: ChildPath,
        new_parent: ChildPath,
    },

    /// Update attributes (elements) or content (text nodes) in place
    Merge {
        path: ChildPath,
        attributes: AttrChanges,
        content: Option<String>,
    },
}

impl RemoteEdit {
    /// The primary position: the target node, or the parent for an Insert
    pub fn path(&self) -> &ChildPath {
        match self {
            RemoteEdit::Delete { path }
            | RemoteEdit::Move { path, .. }
            | RemoteEdit::Merge { path, .. } => path,
            RemoteEdit::Insert { parent, .. } => parent,
        }
    }

    pub(crate) fn path_mut(&mut self) -> &mut ChildPath {
        match self {
            RemoteEdit::Delete { path }
            | RemoteEdit::Move { path, .. }
            | RemoteEdit::Merge { path, .. } => path,
            RemoteEdit::Insert { parent, .. } => parent,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RemoteEdit::Delete { .. } => "delete",
            RemoteEdit::Insert { .. } => "insert",
            RemoteEdit::Move { .. } => "move",
            RemoteEdit::Merge { .. } => "merge",
        }
    }
}

impl fmt::Display for RemoteEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteEdit::Delete { path } => write!(f, "delete {path}"),
            RemoteEdit::Insert {
                parent,
                index,
                node,
            } => match node {
                NewNode::Element { tag, .. } => write!(f, "insert <{tag}> into {parent} at {index}"),
                NewNode::Text(_) => write!(f, "insert text into {parent} at {index}"),
            },
            RemoteEdit::Move { path, new_parent } => write!(f, "move {path} to {new_parent}"),
            RemoteEdit::Merge {
                path, attributes, ..
            } => write!(f, "merge {} attribute(s) into {path}", attributes.len()),
        }
    }
}
