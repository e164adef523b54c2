//! # Visibility Gate
//!
//! A local mutator runs at some point in document order. Nodes at or behind
//! that point are visible to it; nodes ahead of it are not, unless they sit
//! inside an insertion exception.

use crate::path::ChildPath;
use crate::reconciler::Reconciler;
use crate::rebase::Rebaser;

/// Pure visibility test against an already reconciled exception set
pub fn is_visible(current: &ChildPath, candidate: &ChildPath, exceptions: &Rebaser) -> bool {
    current.compare(candidate).is_behind() || exceptions.is_excepted(candidate)
}

impl Reconciler {
    /// Whether the mutator at `current` may observe the node at `candidate`.
    ///
    /// Always true once interception is off.
    pub fn should_be_seen(&mut self, current: &ChildPath, candidate: &ChildPath) -> bool {
        if !self.is_active() || current.compare(candidate).is_behind() {
            return true;
        }
        if !self.queue.is_empty() {
            self.reconcile();
        }
        is_visible(current, candidate, &self.rebaser)
    }
}
