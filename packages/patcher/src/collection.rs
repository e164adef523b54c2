//! Live lookup results. A [`LiveCollection`] stores the query, not its
//! results: every access re-runs it against the document and re-filters
//! through the visibility gate, since both the running mutator and the
//! exception set can change between accesses.

use crate::interceptor::PatchedDocument;
use treeweave_dom::{DomTree, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveQuery {
    TagName { scope: NodeId, tag: String },
    ClassName { scope: NodeId, names: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveCollection {
    query: LiveQuery,
}

impl LiveCollection {
    pub fn new(query: LiveQuery) -> Self {
        Self { query }
    }

    pub fn query(&self) -> &LiveQuery {
        &self.query
    }

    /// Current members, visible ones only
    pub fn to_vec<D: DomTree>(&self, doc: &mut PatchedDocument<D>) -> Vec<NodeId> {
        let matches = match &self.query {
            LiveQuery::TagName { scope, tag } => doc.inner().get_elements_by_tag_name(*scope, tag),
            LiveQuery::ClassName { scope, names } => {
                doc.inner().get_elements_by_class_name(*scope, names)
            }
        };
        doc.filter_visible(matches)
    }

    pub fn len<D: DomTree>(&self, doc: &mut PatchedDocument<D>) -> usize {
        self.to_vec(doc).len()
    }

    pub fn is_empty<D: DomTree>(&self, doc: &mut PatchedDocument<D>) -> bool {
        self.len(doc) == 0
    }

    pub fn item<D: DomTree>(&self, doc: &mut PatchedDocument<D>, index: usize) -> Option<NodeId> {
        self.to_vec(doc).get(index).copied()
    }

    /// First member whose `id`, or failing that whose `name`, equals `name`
    pub fn named_item<D: DomTree>(&self, doc: &mut PatchedDocument<D>, name: &str) -> Option<NodeId> {
        let members = self.to_vec(doc);
        let inner = doc.inner();
        members
            .iter()
            .find(|node| inner.get_attribute(**node, "id") == Some(name))
            .or_else(|| {
                members
                    .iter()
                    .find(|node| inner.get_attribute(**node, "name") == Some(name))
            })
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatcherConfig;
    use crate::path::{resolve, ChildPath};
    use treeweave_dom::{Document, SnapshotNode, TreeMutations, TreeTraversal};

    fn form_doc() -> PatchedDocument<Document> {
        let doc = Document::from_snapshot(&[SnapshotNode::element("form")
            .with_child(SnapshotNode::element("input").with_attr("name", "user"))
            .with_child(SnapshotNode::element("script"))
            .with_child(SnapshotNode::element("input").with_attr("id", "pass"))])
        .unwrap();
        PatchedDocument::install(doc, PatcherConfig::default())
    }

    #[test]
    fn test_membership_follows_current_mutator() {
        let mut patched = form_doc();
        let root = patched.root();
        let inputs = patched.get_elements_by_tag_name(root, "input");
        assert_eq!(inputs.len(&mut patched), 2);

        let script = resolve(patched.inner(), &ChildPath::from([0, 1])).unwrap();
        patched.set_current_mutator(Some(script));
        assert_eq!(inputs.len(&mut patched), 1);
        assert_eq!(inputs.named_item(&mut patched, "pass"), None);
        assert!(inputs.named_item(&mut patched, "user").is_some());

        patched.set_current_mutator(None);
        assert!(inputs.named_item(&mut patched, "pass").is_some());
    }

    #[test]
    fn test_membership_recomputed_after_mutation() {
        let mut patched = form_doc();
        let root = patched.root();
        let form = resolve(patched.inner(), &ChildPath::from([0])).unwrap();
        let marked = patched.get_elements_by_class_name(root, "field");
        assert!(marked.is_empty(&mut patched));

        let input = patched.child_at(form, 0).unwrap();
        patched.set_attribute(input, "class", "field wide").unwrap();
        assert_eq!(marked.item(&mut patched, 0), Some(input));
        assert_eq!(marked.item(&mut patched, 1), None);
    }
}
