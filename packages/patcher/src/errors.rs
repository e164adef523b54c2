//! Error types for the patcher

use crate::delta::Delta;
use crate::path::ChildPath;
use thiserror::Error;
use treeweave_dom::DomError;

/// Why the head of the remote queue could not be applied this turn
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error("Node not found at {0}")]
    NodeNotFound(ChildPath),

    #[error("Insert index {index} out of bounds for {parent} with {len} children")]
    OutOfBounds {
        parent: ChildPath,
        index: usize,
        len: usize,
    },

    #[error("Tree error: {0}")]
    Tree(#[from] DomError),
}

impl ApplyError {
    /// Whether a later poll may succeed once more local deltas arrive
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApplyError::NodeNotFound(_) | ApplyError::OutOfBounds { .. }
        )
    }
}

/// A local mutation the rebasing bookkeeping cannot justify.
///
/// The mutation itself already happened; only the position bookkeeping is
/// suspect from here on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("Local mutation {delta} touched a node not visible from {current}")]
    UnseenTarget { delta: Delta, current: ChildPath },

    #[error("Local mutation {delta} removed {removed}, which a pending remote edit still targets")]
    RemovedPendingTarget { delta: Delta, removed: ChildPath },
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed edit stream: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Edit {index}: missing `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("Edit {index}: conflicting keys {keys}")]
    Ambiguous { index: usize, keys: String },

    #[error("Edit {index}: child records where text content was expected")]
    InvalidContent { index: usize },
}

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("No Tokio runtime available to fetch edits")]
    NoRuntime,

    #[error("Edit fetch ended without a result")]
    FetchDropped,
}
