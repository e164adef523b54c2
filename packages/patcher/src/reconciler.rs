//! # Reconciliation Context
//!
//! All mutable reconciliation state lives in one [`Reconciler`]: the remote
//! edit queue, the recorded local deltas with their exception set, the logical
//! point and the phase. Nothing here touches a tree; application lives in
//! [`crate::applier`] and query filtering in [`crate::visibility`].

use crate::config::PatcherConfig;
use crate::delta::Delta;
use crate::edit::RemoteEdit;
use crate::errors::ProtocolViolation;
use crate::path::ChildPath;
use crate::rebase::Rebaser;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Lifecycle of a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Interception not installed yet
    Idle,
    /// Intercepting local mutations and applying remote edits
    Draining,
    /// Queue drained after completion was signaled; interception is off for good
    Done,
}

#[derive(Debug)]
pub struct Reconciler {
    pub(crate) config: PatcherConfig,
    pub(crate) queue: VecDeque<RemoteEdit>,
    pub(crate) rebaser: Rebaser,
    pub(crate) last_seen: ChildPath,
    pub(crate) phase: Phase,
    pub(crate) complete: bool,
    pub(crate) edits_received: bool,
    pub(crate) violations: Vec<ProtocolViolation>,
    pub(crate) applied: usize,
}

impl Reconciler {
    pub fn new(config: PatcherConfig) -> Self {
        Self {
            last_seen: config.initial_logical_point.clone(),
            config,
            queue: VecDeque::new(),
            rebaser: Rebaser::new(),
            phase: Phase::Idle,
            complete: false,
            edits_received: false,
            violations: Vec::new(),
            applied: 0,
        }
    }

    /// Start intercepting. Only meaningful from `Idle`.
    pub fn begin(&mut self) {
        if self.phase == Phase::Idle {
            debug!("interception installed");
            self.phase = Phase::Draining;
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while deltas are recorded and queries filtered
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Draining
    }

    /// Path of the last remote edit that resolved
    pub fn last_seen(&self) -> &ChildPath {
        &self.last_seen
    }

    pub fn pending_edits(&self) -> impl Iterator<Item = &RemoteEdit> {
        self.queue.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_deltas(&self) -> &[Delta] {
        self.rebaser.pending()
    }

    pub fn exceptions(&self) -> &[ChildPath] {
        self.rebaser.exceptions()
    }

    pub fn applied_count(&self) -> usize {
        self.applied
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Queue remote edits behind any still pending
    pub fn receive_edits(&mut self, edits: impl IntoIterator<Item = RemoteEdit>) {
        if self.phase == Phase::Done {
            warn!("remote edits received after reconciliation finished; ignoring");
            return;
        }
        let before = self.queue.len();
        self.queue.extend(edits);
        self.edits_received = true;
        debug!(received = self.queue.len() - before, pending = self.queue.len(), "queued remote edits");
    }

    /// Record one local delta. Ignored unless interception is active.
    pub fn record_delta(&mut self, delta: Delta) {
        if !self.is_active() {
            return;
        }
        debug!(%delta, last_seen = %self.last_seen, "recorded local delta");
        self.rebaser.record(delta, &self.last_seen);

        // Nothing left to rebase: the delta has done its work on the exceptions.
        if self.edits_received && self.queue.is_empty() {
            self.reconcile();
        }
    }

    /// Fold outstanding deltas into the pending edits.
    ///
    /// Before the stream has arrived the deltas are kept, since every edit it
    /// will contain was written against the tree before them.
    pub fn reconcile(&mut self) {
        if !self.edits_received || !self.rebaser.has_pending() {
            return;
        }
        let violations = self.rebaser.reconcile_pending(&mut self.queue);
        for violation in violations {
            self.report_violation(violation);
        }
    }

    pub(crate) fn report_violation(&mut self, violation: ProtocolViolation) {
        warn!(%violation, "protocol violation");
        if self.config.report_violations {
            self.violations.push(violation);
        }
    }

    /// Drain the violations recorded so far
    pub fn take_violations(&mut self) -> Vec<ProtocolViolation> {
        std::mem::take(&mut self.violations)
    }
}
