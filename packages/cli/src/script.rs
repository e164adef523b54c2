//! Scripted local mutations for `treeweave apply`.
//!
//! A script stands in for the local mutator: each step runs against the
//! intercepting document, so it records deltas and sees filtered queries
//! exactly as embedded code would.
//!
//! ```json
//! { "steps": [
//!   { "op": "setCurrent", "path": [0, 0] },
//!   { "op": "append", "parent": [0], "node": { "tag": "p", "children": [{ "text": "hi" }] } },
//!   { "op": "query", "selector": "p" },
//!   { "op": "poll" }
//! ] }
//! ```

use serde::Deserialize;
use thiserror::Error;
use treeweave_dom::{DomError, DomTree, NodeId, SnapshotNode, TreeMutations};
use treeweave_patcher::{path_of, resolve, ChildPath, PatchedDocument};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    SetCurrent {
        path: ChildPath,
    },
    ClearCurrent,
    Append {
        parent: ChildPath,
        node: SnapshotNode,
    },
    InsertBefore {
        parent: ChildPath,
        #[serde(default)]
        reference: Option<ChildPath>,
        node: SnapshotNode,
    },
    Remove {
        path: ChildPath,
    },
    SetAttribute {
        path: ChildPath,
        name: String,
        value: String,
    },
    Write {
        text: String,
        #[serde(default)]
        newline: bool,
    },
    Query {
        selector: String,
    },
    /// Let queued remote edits apply
    Poll,
}

/// What a step produced worth reporting
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Done,
    /// Where the new node landed, if it is attached
    Placed(Option<ChildPath>),
    Matches(Vec<ChildPath>),
}

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("No node at {0}")]
    NoNode(ChildPath),

    #[error("Tree error: {0}")]
    Dom(#[from] DomError),

    #[error("Malformed script: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::SetCurrent { .. } => "setCurrent",
            Step::ClearCurrent => "clearCurrent",
            Step::Append { .. } => "append",
            Step::InsertBefore { .. } => "insertBefore",
            Step::Remove { .. } => "remove",
            Step::SetAttribute { .. } => "setAttribute",
            Step::Write { .. } => "write",
            Step::Query { .. } => "query",
            Step::Poll => "poll",
        }
    }
}

fn node_at<D: DomTree>(doc: &PatchedDocument<D>, path: &ChildPath) -> Result<NodeId, ScriptError> {
    resolve(doc, path).ok_or_else(|| ScriptError::NoNode(path.clone()))
}

/// Build a detached subtree from a snapshot through `tree`'s primitives
fn build<T: TreeMutations + ?Sized>(tree: &mut T, node: &SnapshotNode) -> Result<NodeId, DomError> {
    match node {
        SnapshotNode::Text { text } => Ok(tree.create_text(text)),
        SnapshotNode::Element {
            tag,
            attrs,
            children,
        } => {
            let element = tree.create_element(tag);
            for (name, value) in attrs {
                tree.set_attribute(element, name, value)?;
            }
            for child in children {
                let child = build(tree, child)?;
                tree.append_child(element, child)?;
            }
            Ok(element)
        }
    }
}

/// Run one step. `Poll` is left to the caller, which owns the fetch.
pub fn run_step<D: DomTree>(
    doc: &mut PatchedDocument<D>,
    step: &Step,
) -> Result<StepOutput, ScriptError> {
    let output = match step {
        Step::SetCurrent { path } => {
            let node = node_at(doc, path)?;
            doc.set_current_mutator(Some(node));
            StepOutput::Done
        }
        Step::ClearCurrent => {
            doc.set_current_mutator(None);
            StepOutput::Done
        }
        Step::Append { parent, node } => {
            let parent = node_at(doc, parent)?;
            let created = build(doc, node)?;
            doc.append_child(parent, created)?;
            StepOutput::Placed(path_of(doc, created))
        }
        Step::InsertBefore {
            parent,
            reference,
            node,
        } => {
            let parent = node_at(doc, parent)?;
            let reference = reference
                .as_ref()
                .map(|path| node_at(doc, path))
                .transpose()?;
            let created = build(doc, node)?;
            doc.insert_before(parent, created, reference)?;
            StepOutput::Placed(path_of(doc, created))
        }
        Step::Remove { path } => {
            let node = node_at(doc, path)?;
            let parent = path
                .parent()
                .ok_or_else(|| ScriptError::NoNode(path.clone()))
                .and_then(|parent| node_at(doc, &parent))?;
            doc.remove_child(parent, node)?;
            StepOutput::Done
        }
        Step::SetAttribute { path, name, value } => {
            let node = node_at(doc, path)?;
            doc.set_attribute(node, name, value)?;
            StepOutput::Done
        }
        Step::Write { text, newline } => {
            let written = if *newline {
                doc.document_writeln(text)?
            } else {
                doc.document_write(text)?
            };
            StepOutput::Placed(written.and_then(|node| path_of(doc, node)))
        }
        Step::Query { selector } => {
            let root = doc.inner().root();
            let matches = doc.query_selector_all(root, selector)?;
            StepOutput::Matches(matches.into_iter().filter_map(|node| path_of(doc, node)).collect())
        }
        Step::Poll => StepOutput::Done,
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treeweave_dom::Document;
    use treeweave_patcher::PatcherConfig;

    fn patched(json: &str) -> PatchedDocument<Document> {
        PatchedDocument::install(Document::from_json(json).unwrap(), PatcherConfig::default())
    }

    #[test]
    fn test_parse_steps() {
        let script = Script::from_json(
            r#"{ "steps": [
                { "op": "setCurrent", "path": [0] },
                { "op": "insertBefore", "parent": [], "node": { "text": "x" } },
                { "op": "write", "text": "hi", "newline": true },
                { "op": "poll" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(script.steps.len(), 4);
        assert_eq!(
            script.steps[1],
            Step::InsertBefore {
                parent: ChildPath::root(),
                reference: None,
                node: SnapshotNode::text("x"),
            }
        );
        assert_eq!(script.steps[3].name(), "poll");
    }

    #[test]
    fn test_reject_unknown_step() {
        assert!(matches!(
            Script::from_json(r#"{ "steps": [{ "op": "explode" }] }"#),
            Err(ScriptError::Parse(_))
        ));
    }

    #[test]
    fn test_steps_run_against_patched_document() {
        let mut doc = patched(r#"[{ "tag": "body", "children": [{ "tag": "script" }, { "tag": "div" }] }]"#);

        run_step(&mut doc, &Step::SetCurrent { path: ChildPath::from([0, 0]) }).unwrap();
        let placed = run_step(
            &mut doc,
            &Step::Append {
                parent: ChildPath::from([0]),
                node: SnapshotNode::element("p").with_child(SnapshotNode::text("hi")),
            },
        )
        .unwrap();
        assert_eq!(placed, StepOutput::Placed(Some(ChildPath::from([0, 2]))));

        // Only the append itself is recorded, not the detached build.
        assert_eq!(doc.reconciler().pending_deltas().len(), 1);

        // The div is ahead of the script; the appended p is an exception.
        let matches = run_step(&mut doc, &Step::Query { selector: "div, p".into() }).unwrap();
        assert_eq!(matches, StepOutput::Matches(vec![ChildPath::from([0, 2])]));
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let mut doc = patched("[]");
        assert!(matches!(
            run_step(&mut doc, &Step::Remove { path: ChildPath::from([3]) }),
            Err(ScriptError::NoNode(_))
        ));
    }
}
