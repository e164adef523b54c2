//! # Rebasing
//!
//! Local mutations shift sibling indices under pending remote edits. Every
//! recorded [`Delta`] is folded, in arrival order, into the positions of the
//! edits still queued so they keep pointing at the nodes they were written
//! against.
//!
//! The same deltas also maintain the insertion exceptions: nodes inserted
//! locally ahead of the logical point, which the local mutator that inserted
//! them must still be able to see.

use crate::delta::{Delta, Shift};
use crate::edit::RemoteEdit;
use crate::errors::ProtocolViolation;
use crate::path::{ChildPath, Position};
use std::collections::VecDeque;
use tracing::debug;

/// What a delta did to one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebase {
    Unaffected,
    Shifted,
    /// The delta removed the node this path runs through
    Removed,
}

/// Shift `target` when `delta` happened under one of its ancestors at or
/// before the branch `target` descends through.
pub fn rebase_path(target: &mut ChildPath, delta: &Delta) -> Rebase {
    if !delta.path.is_strict_prefix_of(target) {
        return Rebase::Unaffected;
    }
    let Some(component) = target.component_mut(delta.path.depth()) else {
        return Rebase::Unaffected;
    };
    if delta.index > *component {
        return Rebase::Unaffected;
    }
    if delta.shift == Shift::Remove && delta.index == *component {
        return Rebase::Removed;
    }
    match delta.shift.apply(*component) {
        Some(shifted) => {
            *component = shifted;
            Rebase::Shifted
        }
        None => Rebase::Removed,
    }
}

/// Returns true if `target` moved
pub fn update_affected_ancestors(target: &mut ChildPath, delta: &Delta) -> bool {
    rebase_path(target, delta) == Rebase::Shifted
}

/// Shift an Insert's target index for a delta under the same parent.
///
/// An insertion at or before the index pushes it right; a removal strictly
/// before it pulls it left.
fn rebase_insert_index(index: &mut usize, delta: &Delta) -> bool {
    match delta.shift {
        Shift::Insert if delta.index <= *index => {
            *index += 1;
            true
        }
        Shift::Remove if delta.index < *index => {
            *index -= 1;
            true
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rebaser {
    deltas: Vec<Delta>,
    exceptions: Vec<ChildPath>,
}

impl Rebaser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a local delta and fold it into the exception set immediately
    pub fn record(&mut self, delta: Delta, last_seen: &ChildPath) {
        self.fold_into_exceptions(&delta, last_seen);
        self.deltas.push(delta);
    }

    pub fn pending(&self) -> &[Delta] {
        &self.deltas
    }

    pub fn has_pending(&self) -> bool {
        !self.deltas.is_empty()
    }

    pub fn exceptions(&self) -> &[ChildPath] {
        &self.exceptions
    }

    /// True if `candidate` is an exception or lies inside one
    pub fn is_excepted(&self, candidate: &ChildPath) -> bool {
        self.exceptions.iter().any(|exception| {
            matches!(
                candidate.compare(exception),
                Position::Equal | Position::Ancestor
            )
        })
    }

    /// Fold every recorded delta into every pending edit, then forget them
    pub fn reconcile_pending(&mut self, edits: &mut VecDeque<RemoteEdit>) -> Vec<ProtocolViolation> {
        let mut violations = Vec::new();
        let deltas = std::mem::take(&mut self.deltas);

        for delta in &deltas {
            for (position, edit) in edits.iter_mut().enumerate() {
                match rebase_path(edit.path_mut(), delta) {
                    Rebase::Shifted => {
                        debug!(%delta, position, path = %edit.path(), "rebased pending edit");
                    }
                    Rebase::Removed => {
                        violations.push(ProtocolViolation::RemovedPendingTarget {
                            delta: delta.clone(),
                            removed: edit.path().clone(),
                        });
                    }
                    Rebase::Unaffected => {
                        if let RemoteEdit::Insert { parent, index, .. } = edit {
                            if *parent == delta.path && rebase_insert_index(index, delta) {
                                debug!(%delta, position, index = *index, "rebased pending insert index");
                            }
                        }
                    }
                }

                if let RemoteEdit::Move { new_parent, .. } = edit {
                    if rebase_path(new_parent, delta) == Rebase::Removed {
                        violations.push(ProtocolViolation::RemovedPendingTarget {
                            delta: delta.clone(),
                            removed: new_parent.clone(),
                        });
                    }
                }
            }
        }

        violations
    }

    /// Drop exceptions the logical point has passed, shift the rest, and
    /// keep a new one for an insertion still ahead of the logical point.
    fn fold_into_exceptions(&mut self, delta: &Delta, last_seen: &ChildPath) {
        self.exceptions.retain_mut(|exception| {
            if last_seen.compare(exception).rank() < 0 {
                return false;
            }
            rebase_path(exception, delta) != Rebase::Removed
        });

        if delta.is_insertion() {
            let inserted = delta.affected_path();
            if last_seen.compare(&inserted).is_ahead() {
                debug!(path = %inserted, "recorded insertion exception");
                self.exceptions.push(inserted);
            }
        }
    }
}
