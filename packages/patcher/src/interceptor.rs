//! # Intercepting Document
//!
//! [`PatchedDocument`] wraps a tree and is handed to local mutators in place of
//! the tree itself. While reconciliation is draining, every structural
//! mutation records its sibling shifts and every query is filtered through the
//! visibility gate. Remote edits are applied to the wrapped tree directly, so
//! they never record deltas of their own.
//!
//! Once the reconciler reaches [`Phase::Done`] every method is a plain
//! pass-through.

use crate::applier::PollOutcome;
use crate::collection::{LiveCollection, LiveQuery};
use crate::config::PatcherConfig;
use crate::delta::Delta;
use crate::edit::RemoteEdit;
use crate::errors::ProtocolViolation;
use crate::path::{path_of, ChildPath};
use crate::reconciler::{Phase, Reconciler};
use tracing::trace;
use treeweave_dom::{AdjacentPosition, DomResult, DomTree, NodeId, TreeMutations, TreeTraversal};

pub struct PatchedDocument<D: DomTree> {
    inner: D,
    reconciler: Reconciler,
    current: Option<NodeId>,
}

impl<D: DomTree> PatchedDocument<D> {
    /// Wrap `inner` and start intercepting immediately
    pub fn install(inner: D, config: PatcherConfig) -> Self {
        let mut reconciler = Reconciler::new(config);
        reconciler.begin();
        Self {
            inner,
            reconciler,
            current: None,
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn phase(&self) -> Phase {
        self.reconciler.phase()
    }

    pub fn is_intercepting(&self) -> bool {
        self.reconciler.is_active()
    }

    /// Set or clear the node of the local mutator now running
    pub fn set_current_mutator(&mut self, node: Option<NodeId>) {
        self.current = node;
    }

    pub fn current_mutator(&self) -> Option<NodeId> {
        self.current
    }

    pub fn receive_edits(&mut self, edits: impl IntoIterator<Item = RemoteEdit>) {
        self.reconciler.receive_edits(edits);
    }

    pub fn poll(&mut self) -> PollOutcome {
        self.reconciler.poll(&mut self.inner)
    }

    /// Apply at most one queued edit
    pub fn step(&mut self) -> PollOutcome {
        self.reconciler.step(&mut self.inner)
    }

    /// Fold outstanding local deltas into the queued edits now
    pub fn reconcile(&mut self) {
        self.reconciler.reconcile();
    }

    pub fn signal_complete(&mut self) -> PollOutcome {
        self.reconciler.signal_complete(&mut self.inner)
    }

    pub fn take_violations(&mut self) -> Vec<ProtocolViolation> {
        self.reconciler.take_violations()
    }

    /// Path of the running mutator, when filtering applies at all
    fn current_path(&self) -> Option<ChildPath> {
        if !self.is_intercepting() {
            return None;
        }
        path_of(&self.inner, self.current?)
    }

    /// Whether the running mutator may observe `node`.
    ///
    /// Detached nodes have no position to hide and are always visible.
    pub fn is_visible(&mut self, node: NodeId) -> bool {
        let Some(current) = self.current_path() else {
            return true;
        };
        let Some(candidate) = path_of(&self.inner, node) else {
            return true;
        };
        self.reconciler.should_be_seen(&current, &candidate)
    }

    pub(crate) fn filter_visible(&mut self, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
        if self.current_path().is_some() {
            nodes.retain(|node| self.is_visible(*node));
        }
        nodes
    }

    pub fn get_element_by_id(&mut self, id: &str) -> Option<NodeId> {
        let found = self.inner.get_element_by_id(id)?;
        self.is_visible(found).then_some(found)
    }

    pub fn query_selector(&mut self, scope: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let matches = self.inner.query_selector_all(scope, selector)?;
        Ok(matches.into_iter().find(|node| self.is_visible(*node)))
    }

    /// Visible matches at the time of the call
    pub fn query_selector_all(&mut self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let matches = self.inner.query_selector_all(scope, selector)?;
        Ok(self.filter_visible(matches))
    }

    pub fn get_elements_by_tag_name(&self, scope: NodeId, tag: &str) -> LiveCollection {
        LiveCollection::new(LiveQuery::TagName {
            scope,
            tag: tag.to_string(),
        })
    }

    pub fn get_elements_by_class_name(&self, scope: NodeId, names: &str) -> LiveCollection {
        LiveCollection::new(LiveQuery::ClassName {
            scope,
            names: names.to_string(),
        })
    }

    /// Append text at the running mutator's parent. `None` without a mutator
    /// to anchor it.
    pub fn document_write(&mut self, text: &str) -> DomResult<Option<NodeId>> {
        let Some(parent) = self.current.and_then(|node| self.inner.parent(node)) else {
            trace!("write without a running mutator; ignored");
            return Ok(None);
        };
        self.write(parent, text).map(Some)
    }

    pub fn document_writeln(&mut self, text: &str) -> DomResult<Option<NodeId>> {
        self.document_write(&format!("{text}\n"))
    }

    fn removal_delta(&self, node: NodeId) -> Option<Delta> {
        let path = path_of(&self.inner, node)?;
        Some(Delta::removal(path.parent()?, path.last_index()?))
    }

    fn insertion_delta(&self, node: NodeId) -> Option<Delta> {
        let path = path_of(&self.inner, node)?;
        Some(Delta::insertion(path.parent()?, path.last_index()?))
    }

    fn record(&mut self, delta: Delta) {
        if let Some(current) = self.current_path() {
            if !self.reconciler.should_be_seen(&current, &delta.path) {
                self.reconciler
                    .report_violation(ProtocolViolation::UnseenTarget {
                        delta: delta.clone(),
                        current,
                    });
            }
        }
        self.reconciler.record_delta(delta);
    }

    /// Run an operation that places `node`, recording its removal from the
    /// old position (if attached) and its insertion at the new one.
    fn tracked_insert(
        &mut self,
        node: NodeId,
        op: impl FnOnce(&mut D) -> DomResult<NodeId>,
    ) -> DomResult<NodeId> {
        if !self.is_intercepting() {
            return op(&mut self.inner);
        }
        let before = path_of(&self.inner, node);
        let removed = self.removal_delta(node);
        let result = op(&mut self.inner)?;
        if path_of(&self.inner, node) == before {
            return Ok(result);
        }
        if let Some(delta) = removed {
            self.record(delta);
        }
        if let Some(delta) = self.insertion_delta(node) {
            self.record(delta);
        }
        Ok(result)
    }
}

impl<D: DomTree> TreeTraversal for PatchedDocument<D> {
    fn root(&self) -> NodeId {
        self.inner.root()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.parent(node)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.inner.children(node)
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.inner.is_element(node)
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.inner.has_attribute(node, name)
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.inner.get_attribute(node, name)
    }
}

impl<D: DomTree> TreeMutations for PatchedDocument<D> {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.inner.create_element(tag)
    }

    fn create_text(&mut self, content: &str) -> NodeId {
        self.inner.create_text(content)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.inner.set_attribute(node, name, value)
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<()> {
        self.inner.remove_attribute(node, name)
    }

    fn set_text(&mut self, node: NodeId, content: &str) -> DomResult<()> {
        self.inner.set_text(node, content)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.tracked_insert(child, |inner| inner.append_child(parent, child))
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.tracked_insert(child, |inner| inner.insert_before(parent, child, reference))
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if !self.is_intercepting() {
            return self.inner.remove_child(parent, child);
        }
        let removed = self.removal_delta(child);
        let result = self.inner.remove_child(parent, child)?;
        if let Some(delta) = removed {
            self.record(delta);
        }
        Ok(result)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId> {
        if !self.is_intercepting() || new_child == old_child {
            return self.inner.replace_child(parent, new_child, old_child);
        }
        let moved = self.removal_delta(new_child);
        let result = self.inner.replace_child(parent, new_child, old_child)?;
        // The slot itself keeps its position; only leaving the old one shifts.
        if let Some(delta) = moved {
            self.record(delta);
        }
        Ok(result)
    }

    fn insert_adjacent(
        &mut self,
        target: NodeId,
        position: AdjacentPosition,
        node: NodeId,
    ) -> DomResult<NodeId> {
        self.tracked_insert(node, |inner| inner.insert_adjacent(target, position, node))
    }
}
