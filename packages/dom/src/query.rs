//! Lookup primitives. Results are in document order and never include the
//! scope node itself.

use crate::{Document, DomResult, NodeId, SelectorList, TreeTraversal};

pub trait TreeQueries {
    /// First attached element whose `id` attribute equals `id`
    fn get_element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Elements under `scope` with the given tag (`*` matches every element)
    fn get_elements_by_tag_name(&self, scope: NodeId, tag: &str) -> Vec<NodeId>;

    /// Elements under `scope` carrying every whitespace-separated class in `names`
    fn get_elements_by_class_name(&self, scope: NodeId, names: &str) -> Vec<NodeId>;

    fn query_selector(&self, scope: NodeId, selector: &str) -> DomResult<Option<NodeId>>;

    fn query_selector_all(&self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>>;
}

impl TreeQueries for Document {
    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.get_attribute(*node, "id") == Some(id))
    }

    fn get_elements_by_tag_name(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| match self.tag_name(*node) {
                Some(name) => tag == "*" || name.eq_ignore_ascii_case(tag),
                None => false,
            })
            .collect()
    }

    fn get_elements_by_class_name(&self, scope: NodeId, names: &str) -> Vec<NodeId> {
        let wanted: Vec<&str> = names.split_ascii_whitespace().collect();
        if wanted.is_empty() {
            return Vec::new();
        }
        self.descendants(scope)
            .into_iter()
            .filter(|node| {
                let Some(classes) = self.get_attribute(*node, "class") else {
                    return false;
                };
                wanted
                    .iter()
                    .all(|w| classes.split_ascii_whitespace().any(|c| c == *w))
            })
            .collect()
    }

    fn query_selector(&self, scope: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let selector = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|node| selector.matches(self, *node)))
    }

    fn query_selector_all(&self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let selector = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|node| selector.matches(self, *node))
            .collect())
    }
}
