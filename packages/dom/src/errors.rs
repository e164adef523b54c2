//! Error types for tree primitives

use crate::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} is not a text node")]
    NotText(NodeId),

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Cannot insert {child} into {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Node {0} has no parent")]
    Detached(NodeId),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

pub type DomResult<T> = Result<T, DomError>;
