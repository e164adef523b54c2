//! HTML rendering of a document or subtree

use crate::{Document, NodeId, NodeKind, TreeTraversal};

impl Document {
    /// Render every child of the root as HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            self.render(*child, &mut out);
        }
        out
    }

    /// Render one node and its subtree
    pub fn node_to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.render(node, &mut out);
        out
    }

    fn render(&self, node: NodeId, out: &mut String) {
        match self.kind(node) {
            Some(NodeKind::Document) => {
                for child in self.children(node) {
                    self.render(*child, out);
                }
            }
            Some(NodeKind::Element { tag, attributes }) => {
                out.push('<');
                out.push_str(tag);

                // Sorted so output is stable across runs.
                let mut names: Vec<&String> = attributes.keys().collect();
                names.sort();
                for name in names {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_html(&attributes[name]));
                    out.push('"');
                }

                if is_void_element(tag) {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for child in self.children(node) {
                    self.render(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            Some(NodeKind::Text { content }) => out.push_str(&escape_html(content)),
            None => {}
        }
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "img"
            | "input"
            | "br"
            | "hr"
            | "meta"
            | "link"
            | "area"
            | "base"
            | "col"
            | "embed"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
