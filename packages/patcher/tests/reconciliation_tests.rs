//! End-to-end reconciliation scenarios

use treeweave_dom::{Document, NodeId, SnapshotNode, TreeMutations, TreeTraversal};
use treeweave_patcher::{
    resolve, ApplyError, AttrChanges, AttrValue, ChildPath, NewNode, PatchedDocument,
    PatcherConfig, Phase, ProtocolViolation, RemoteEdit,
};

fn install(nodes: &[SnapshotNode]) -> PatchedDocument<Document> {
    let doc = Document::from_snapshot(nodes).unwrap();
    PatchedDocument::install(doc, PatcherConfig::default())
}

fn node_at(doc: &PatchedDocument<Document>, path: &[usize]) -> NodeId {
    resolve(doc.inner(), &ChildPath::new(path.to_vec())).unwrap()
}

fn insert(parent: &[usize], index: usize, node: NewNode) -> RemoteEdit {
    RemoteEdit::Insert {
        parent: ChildPath::new(parent.to_vec()),
        index,
        node,
    }
}

fn tagged(tag: &str, id: &str) -> NewNode {
    NewNode::element(tag).with_attr("id", AttrValue::Text(id.to_string()))
}

/// Ids of the children of the node at `path`, in order
fn child_ids(doc: &PatchedDocument<Document>, path: &[usize]) -> Vec<String> {
    let parent = node_at(doc, path);
    doc.children(parent)
        .iter()
        .map(|child| doc.get_attribute(*child, "id").unwrap_or("?").to_string())
        .collect()
}

#[test]
fn test_single_insert_into_empty_tree() {
    let mut doc = install(&[]);
    doc.receive_edits([insert(&[], 0, NewNode::element("div"))]);

    let outcome = doc.poll();
    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.remaining, 0);
    assert_eq!(doc.inner().to_html(), "<div></div>");
    assert_eq!(doc.reconciler().last_seen(), &ChildPath::root());
}

#[test]
fn test_local_insert_shifts_pending_index() {
    let mut doc = install(&[
        SnapshotNode::element("a"),
        SnapshotNode::element("b"),
        SnapshotNode::element("c")
            .with_child(SnapshotNode::element("x").with_attr("id", "x"))
            .with_child(SnapshotNode::element("y").with_attr("id", "y")),
    ]);
    doc.receive_edits([insert(&[2], 1, tagged("p", "remote"))]);

    let c = node_at(&doc, &[2]);
    let x = node_at(&doc, &[2, 0]);
    let local = doc.create_element("span");
    doc.set_attribute(local, "id", "local").unwrap();
    doc.insert_before(c, local, Some(x)).unwrap();

    doc.reconcile();
    match doc.reconciler().pending_edits().next() {
        Some(RemoteEdit::Insert { index, .. }) => assert_eq!(*index, 2),
        other => panic!("unexpected head {other:?}"),
    }

    doc.poll();
    assert_eq!(child_ids(&doc, &[2]), ["local", "x", "remote", "y"]);
}

#[test]
fn test_out_of_bounds_insert_is_retried() {
    let mut doc = install(&[SnapshotNode::element("a"), SnapshotNode::element("b")]);
    let edit = insert(&[], 5, NewNode::element("span"));
    doc.receive_edits([edit.clone()]);

    for _ in 0..2 {
        let outcome = doc.poll();
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.remaining, 1);
        assert_eq!(
            outcome.blocked,
            Some(ApplyError::OutOfBounds {
                parent: ChildPath::root(),
                index: 5,
                len: 2,
            })
        );
        assert_eq!(doc.reconciler().pending_edits().next(), Some(&edit));
    }
    assert_eq!(doc.inner().to_html(), "<a></a><b></b>");
}

#[test]
fn test_append_at_child_count_is_valid() {
    let mut doc = install(&[SnapshotNode::element("a"), SnapshotNode::element("b")]);
    doc.receive_edits([insert(&[], 2, NewNode::text("end"))]);
    assert!(!doc.poll().is_blocked());
    assert_eq!(doc.inner().to_html(), "<a></a><b></b>end");
}

#[test]
fn test_nodes_ahead_of_mutator_are_hidden() {
    let mut doc = install(&[
        SnapshotNode::element("div").with_attr("id", "zero"),
        SnapshotNode::element("script"),
        SnapshotNode::element("div").with_attr("id", "two"),
        SnapshotNode::element("div").with_attr("id", "three"),
    ]);
    let script = node_at(&doc, &[1]);
    doc.set_current_mutator(Some(script));

    let root = doc.root();
    assert_eq!(doc.get_element_by_id("three"), None);
    assert!(doc.get_element_by_id("zero").is_some());
    assert_eq!(doc.query_selector_all(root, "div").unwrap(), [node_at(&doc, &[0])]);

    let divs = doc.get_elements_by_tag_name(root, "div");
    assert_eq!(divs.len(&mut doc), 1);

    // Callbacks run with no current mutator and see everything.
    doc.set_current_mutator(None);
    assert_eq!(divs.len(&mut doc), 3);
}

#[test]
fn test_locally_inserted_node_ahead_stays_visible() {
    let mut doc = install(&[SnapshotNode::element("body")
        .with_child(SnapshotNode::element("script"))
        .with_child(SnapshotNode::element("footer").with_attr("id", "footer"))]);
    let body = node_at(&doc, &[0]);
    let script = node_at(&doc, &[0, 0]);
    doc.set_current_mutator(Some(script));

    let mine = doc.create_element("p");
    doc.set_attribute(mine, "id", "mine").unwrap();
    doc.append_child(body, mine).unwrap();

    assert_eq!(doc.reconciler().exceptions(), &[ChildPath::from([0, 2])]);
    assert_eq!(doc.get_element_by_id("mine"), Some(mine));
    assert_eq!(doc.get_element_by_id("footer"), None);
    assert!(doc.take_violations().is_empty());
}

#[test]
fn test_merge_joins_list_attribute() {
    let mut doc = install(&[SnapshotNode::element("div")]);
    doc.receive_edits([RemoteEdit::Merge {
        path: ChildPath::from([0]),
        attributes: AttrChanges::new().with(
            "class",
            AttrValue::List(vec!["a".to_string(), "b".to_string()]),
        ),
        content: None,
    }]);
    doc.poll();
    let div = node_at(&doc, &[0]);
    assert_eq!(doc.get_attribute(div, "class"), Some("a b"));
}

#[test]
fn test_edits_apply_in_queue_order() {
    let mut doc = install(&[]);
    doc.receive_edits([
        insert(&[], 0, tagged("i", "a")),
        insert(&[], 0, tagged("i", "b")),
        insert(&[], 1, tagged("i", "c")),
    ]);
    assert_eq!(doc.poll().applied, 3);
    assert_eq!(child_ids(&doc, &[]), ["b", "c", "a"]);
}

#[test]
fn test_blocked_head_holds_back_later_edits() {
    let mut doc = install(&[SnapshotNode::element("ul")]);
    doc.receive_edits([
        RemoteEdit::Delete {
            path: ChildPath::from([0, 3]),
        },
        insert(&[0], 0, tagged("li", "first")),
    ]);

    let outcome = doc.poll();
    assert_eq!(outcome.applied, 0);
    assert_eq!(outcome.remaining, 2);
    assert!(matches!(outcome.blocked, Some(ApplyError::NodeNotFound(_))));
    assert!(doc.children(node_at(&doc, &[0])).is_empty());
}

/// Each local insert is followed by exactly one remote insert into the same
/// parent. Remote nodes must keep their relative order however the local
/// inserts are placed.
fn interleave(place_local: impl Fn(&mut PatchedDocument<Document>, NodeId, NodeId)) {
    const N: usize = 4;
    let mut doc = install(&[SnapshotNode::element("div")]);
    doc.receive_edits((0..N).map(|k| insert(&[0], k, tagged("p", &format!("r{k}")))));

    let div = node_at(&doc, &[0]);
    for k in 0..N {
        let local = doc.create_element("span");
        doc.set_attribute(local, "id", &format!("l{k}")).unwrap();
        place_local(&mut doc, div, local);
        assert_eq!(doc.step().applied, 1);
    }

    let remote: Vec<String> = child_ids(&doc, &[0])
        .into_iter()
        .filter(|id| id.starts_with('r'))
        .collect();
    assert_eq!(remote, ["r0", "r1", "r2", "r3"]);
    assert_eq!(doc.children(div).len(), 2 * N);
    assert!(doc.take_violations().is_empty());
}

#[test]
fn test_round_trip_with_prepends() {
    interleave(|doc, parent, node| {
        let first = doc.child_at(parent, 0);
        doc.insert_before(parent, node, first).unwrap();
    });
}

#[test]
fn test_round_trip_with_appends() {
    interleave(|doc, parent, node| {
        doc.append_child(parent, node).unwrap();
    });
}

#[test]
fn test_round_trip_with_appends_lands_after_each_local() {
    let mut doc = install(&[SnapshotNode::element("div")]);
    doc.receive_edits((0..3).map(|k| insert(&[0], k, tagged("p", &format!("r{k}")))));
    let div = node_at(&doc, &[0]);
    for k in 0..3 {
        let local = doc.create_element("span");
        doc.set_attribute(local, "id", &format!("l{k}")).unwrap();
        doc.append_child(div, local).unwrap();
        doc.step();
    }
    assert_eq!(child_ids(&doc, &[0]), ["l0", "r0", "l1", "r1", "l2", "r2"]);
}

#[test]
fn test_local_mutations_before_stream_arrives() {
    let mut doc = install(&[SnapshotNode::element("ul")
        .with_child(SnapshotNode::element("li").with_attr("id", "a"))
        .with_child(SnapshotNode::element("li").with_attr("id", "b"))]);
    let ul = node_at(&doc, &[0]);
    for k in 0..3 {
        let local = doc.create_element("li");
        doc.set_attribute(local, "id", &format!("l{k}")).unwrap();
        let first = doc.child_at(ul, 0);
        doc.insert_before(ul, local, first).unwrap();
    }
    assert_eq!(doc.reconciler().pending_deltas().len(), 3);

    // Written against the initial two-item list: between a and b.
    doc.receive_edits([insert(&[0], 1, tagged("li", "remote"))]);
    doc.signal_complete();
    assert_eq!(child_ids(&doc, &[0]), ["l2", "l1", "l0", "a", "remote", "b"]);
    assert_eq!(doc.phase(), Phase::Done);
}

#[test]
fn test_local_removal_of_pending_target_is_reported() {
    let mut doc = install(&[SnapshotNode::element("ul")
        .with_child(SnapshotNode::element("li"))
        .with_child(SnapshotNode::element("li"))]);
    doc.receive_edits([RemoteEdit::Merge {
        path: ChildPath::from([0, 1]),
        attributes: AttrChanges::new().with("id", AttrValue::Text("x".into())),
        content: None,
    }]);

    let ul = node_at(&doc, &[0]);
    let doomed = node_at(&doc, &[0, 1]);
    doc.remove_child(ul, doomed).unwrap();
    doc.poll();

    let violations = doc.take_violations();
    assert_eq!(violations.len(), 1);
    assert!(matches!(
        &violations[0],
        ProtocolViolation::RemovedPendingTarget { removed, .. } if *removed == ChildPath::from([0, 1])
    ));
}

#[test]
fn test_done_is_a_pass_through() {
    let mut doc = install(&[SnapshotNode::element("script"), SnapshotNode::element("div")]);
    doc.receive_edits(Vec::new());
    let outcome = doc.signal_complete();
    assert_eq!(outcome.phase, Phase::Done);
    assert!(!doc.is_intercepting());

    let script = node_at(&doc, &[0]);
    doc.set_current_mutator(Some(script));
    let root = doc.root();
    assert_eq!(doc.query_selector_all(root, "div").unwrap().len(), 1);

    let late = doc.create_element("p");
    doc.append_child(root, late).unwrap();
    assert!(doc.reconciler().pending_deltas().is_empty());
    assert!(doc.reconciler().exceptions().is_empty());

    // The latch is one-way.
    doc.receive_edits([insert(&[], 0, NewNode::element("nope"))]);
    assert_eq!(doc.reconciler().pending_len(), 0);
}

#[test]
fn test_into_inner_returns_tree() {
    let mut doc = install(&[]);
    doc.receive_edits([insert(&[], 0, NewNode::text("hi"))]);
    doc.signal_complete();
    assert_eq!(doc.into_inner().to_html(), "hi");
}

fn replaced_slot_doc(edit: RemoteEdit) -> PatchedDocument<Document> {
    let mut doc = install(&[SnapshotNode::element("body")
        .with_child(SnapshotNode::element("a"))
        .with_child(SnapshotNode::element("b"))]);
    doc.receive_edits([edit]);

    let body = node_at(&doc, &[0]);
    let a = node_at(&doc, &[0, 0]);
    let fresh = doc.create_element("fresh");
    doc.replace_child(body, fresh, a).unwrap();
    doc.poll();
    doc
}

#[test]
fn test_merge_at_replaced_slot_lands_on_replacement() {
    let mut doc = replaced_slot_doc(RemoteEdit::Merge {
        path: ChildPath::from([0, 0]),
        attributes: AttrChanges::new().with("title", AttrValue::Text("merged".into())),
        content: None,
    });
    assert_eq!(
        doc.inner().to_html(),
        r#"<body><fresh title="merged"></fresh><b></b></body>"#
    );
    assert!(doc.take_violations().is_empty());
}

#[test]
fn test_insert_under_replaced_slot_lands_in_replacement() {
    let doc = replaced_slot_doc(insert(&[0, 0], 0, NewNode::element("kid")));
    assert_eq!(
        doc.inner().to_html(),
        "<body><fresh><kid></kid></fresh><b></b></body>"
    );
}

#[test]
fn test_move_follows_shifted_destination() {
    let mut doc = install(&[
        SnapshotNode::element("ul")
            .with_attr("id", "list")
            .with_child(SnapshotNode::element("li").with_attr("id", "a")),
        SnapshotNode::element("section").with_attr("id", "dest"),
    ]);
    doc.receive_edits([RemoteEdit::Move {
        path: ChildPath::from([0, 0]),
        new_parent: ChildPath::from([1]),
    }]);

    let root = doc.root();
    let list = node_at(&doc, &[0]);
    let local = doc.create_element("header");
    doc.set_attribute(local, "id", "local").unwrap();
    doc.insert_before(root, local, Some(list)).unwrap();

    doc.reconcile();
    assert_eq!(
        doc.reconciler().pending_edits().next(),
        Some(&RemoteEdit::Move {
            path: ChildPath::from([1, 0]),
            new_parent: ChildPath::from([2]),
        })
    );

    assert_eq!(doc.poll().applied, 1);
    assert_eq!(child_ids(&doc, &[]), ["local", "list", "dest"]);
    assert!(child_ids(&doc, &[1]).is_empty());
    assert_eq!(child_ids(&doc, &[2]), ["a"]);
}

#[test]
fn test_move_to_missing_destination_blocks() {
    let mut doc = install(&[SnapshotNode::element("ul")
        .with_child(SnapshotNode::element("li").with_attr("id", "a"))]);
    let edit = RemoteEdit::Move {
        path: ChildPath::from([0, 0]),
        new_parent: ChildPath::from([1]),
    };
    doc.receive_edits([edit.clone(), insert(&[], 0, tagged("p", "later"))]);

    for _ in 0..2 {
        let outcome = doc.poll();
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.remaining, 2);
        assert_eq!(
            outcome.blocked,
            Some(ApplyError::NodeNotFound(ChildPath::from([1])))
        );
        assert_eq!(doc.reconciler().pending_edits().next(), Some(&edit));
    }
    assert_eq!(child_ids(&doc, &[0]), ["a"]);
}
