//! # Edit Application
//!
//! Drains the remote queue head first. Each turn reconciles outstanding
//! deltas, resolves the head edit's path against the live tree, advances the
//! logical point and dispatches. The first failure stops the turn with the
//! edit still at the head of the queue.

use crate::edit::{AttrChanges, NewNode, RemoteEdit};
use crate::errors::ApplyError;
use crate::path::resolve;
use crate::reconciler::{Phase, Reconciler};
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};
use treeweave_dom::{DomTree, NodeId};

/// What one poll accomplished
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollOutcome {
    /// Edits applied during this poll
    pub applied: usize,
    /// Why draining stopped early, if it did
    #[serde(serialize_with = "serialize_error")]
    pub blocked: Option<ApplyError>,
    pub phase: Phase,
    /// Edits still queued
    pub remaining: usize,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<ApplyError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

impl PollOutcome {
    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }
}

impl Reconciler {
    /// Apply as many queued edits as currently resolve
    #[instrument(level = "debug", skip_all, fields(pending = self.queue.len(), phase = ?self.phase))]
    pub fn poll<D: DomTree + ?Sized>(&mut self, tree: &mut D) -> PollOutcome {
        self.drain(tree, usize::MAX)
    }

    /// Like [`poll`](Self::poll) but applies at most one edit
    pub fn step<D: DomTree + ?Sized>(&mut self, tree: &mut D) -> PollOutcome {
        self.drain(tree, 1)
    }

    fn drain<D: DomTree + ?Sized>(&mut self, tree: &mut D, limit: usize) -> PollOutcome {
        let mut applied = 0;
        let mut blocked = None;

        if self.phase == Phase::Draining {
            while applied < limit && !self.queue.is_empty() {
                self.reconcile();
                match self.apply_front(tree) {
                    Ok(()) => {
                        if let Some(edit) = self.queue.pop_front() {
                            trace!(%edit, "applied remote edit");
                        }
                        applied += 1;
                        self.applied += 1;
                    }
                    Err(error) => {
                        if error.is_retryable() {
                            debug!(%error, "remote edit blocked; retrying on next poll");
                        } else {
                            warn!(%error, "remote edit cannot apply to this tree");
                        }
                        blocked = Some(error);
                        break;
                    }
                }
            }
            self.reconcile();
            self.finish_if_drained();
        }

        PollOutcome {
            applied,
            blocked,
            phase: self.phase,
            remaining: self.queue.len(),
        }
    }

    /// Latch completion and poll once more
    pub fn signal_complete<D: DomTree + ?Sized>(&mut self, tree: &mut D) -> PollOutcome {
        if !self.complete {
            debug!("completion signaled");
            self.complete = true;
        }
        self.poll(tree)
    }

    fn finish_if_drained(&mut self) {
        if self.complete && self.queue.is_empty() && self.phase == Phase::Draining {
            self.phase = Phase::Done;
            self.rebaser = Default::default();
            info!(applied = self.applied, last_seen = %self.last_seen, "reconciliation finished");
        }
    }

    fn apply_front<D: DomTree + ?Sized>(&mut self, tree: &mut D) -> Result<(), ApplyError> {
        let Some(edit) = self.queue.front() else {
            return Ok(());
        };
        let node = resolve(tree, edit.path())
            .ok_or_else(|| ApplyError::NodeNotFound(edit.path().clone()))?;
        self.last_seen = edit.path().clone();
        apply_edit(tree, edit, node)
    }
}

/// Dispatch one edit whose primary path already resolved to `node`
fn apply_edit<D: DomTree + ?Sized>(
    tree: &mut D,
    edit: &RemoteEdit,
    node: NodeId,
) -> Result<(), ApplyError> {
    match edit {
        RemoteEdit::Delete { path } => {
            let parent = tree
                .parent(node)
                .ok_or_else(|| ApplyError::NodeNotFound(path.clone()))?;
            tree.remove_child(parent, node)?;
        }
        RemoteEdit::Insert {
            parent,
            index,
            node: content,
        } => {
            let len = tree.child_count(node);
            if *index > len {
                return Err(ApplyError::OutOfBounds {
                    parent: parent.clone(),
                    index: *index,
                    len,
                });
            }
            let created = materialize(tree, content)?;
            let reference = tree.child_at(node, *index);
            tree.insert_before(node, created, reference)?;
        }
        RemoteEdit::Move { new_parent, .. } => {
            let destination = resolve(tree, new_parent)
                .ok_or_else(|| ApplyError::NodeNotFound(new_parent.clone()))?;
            tree.append_child(destination, node)?;
        }
        RemoteEdit::Merge {
            attributes,
            content,
            ..
        } => {
            apply_attributes(tree, node, attributes)?;
            if let Some(content) = content {
                if tree.is_element(node) {
                    trace!(%node, "ignoring text content merged into an element");
                } else {
                    tree.set_text(node, content)?;
                }
            }
        }
    }
    Ok(())
}

/// Build a detached subtree for an Insert
fn materialize<D: DomTree + ?Sized>(tree: &mut D, content: &NewNode) -> Result<NodeId, ApplyError> {
    match content {
        NewNode::Text(text) => Ok(tree.create_text(text)),
        NewNode::Element {
            tag,
            attributes,
            children,
        } => {
            let element = tree.create_element(tag);
            apply_attributes(tree, element, attributes)?;
            for child in children {
                let child = materialize(tree, child)?;
                tree.append_child(element, child)?;
            }
            Ok(element)
        }
    }
}

/// Merge attribute changes into `node`
fn apply_attributes<D: DomTree + ?Sized>(
    tree: &mut D,
    node: NodeId,
    changes: &AttrChanges,
) -> Result<(), ApplyError> {
    for (key, value) in changes.iter() {
        if tree.has_attribute(node, key) {
            match value.resolved() {
                Some(value) => tree.set_attribute(node, key, &value)?,
                None => tree.remove_attribute(node, key)?,
            }
        } else if key.contains(['[', ']']) {
            trace!(key, "skipping malformed attribute name");
        } else if let Some(value) = value.resolved() {
            tree.set_attribute(node, key, &value)?;
        }
    }
    Ok(())
}
