use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::VecDeque;
use treeweave_dom::{Document, SnapshotNode, TreeMutations, TreeTraversal};
use treeweave_patcher::{
    ChildPath, Delta, NewNode, PatchedDocument, PatcherConfig, Rebaser, RemoteEdit,
};

fn pending_inserts(count: usize) -> VecDeque<RemoteEdit> {
    (0..count)
        .map(|i| RemoteEdit::Insert {
            parent: ChildPath::from([0, i % 7]),
            index: i % 13,
            node: NewNode::element("div"),
        })
        .collect()
}

fn reconcile_pending(c: &mut Criterion) {
    let deltas: Vec<Delta> = (0..100)
        .map(|i| {
            if i % 3 == 0 {
                Delta::removal(ChildPath::from([0]), i % 5)
            } else {
                Delta::insertion(ChildPath::from([0, i % 7]), i % 11)
            }
        })
        .collect();
    let last_seen = ChildPath::from([0, 3]);

    c.bench_function("reconcile_100_deltas_500_edits", |b| {
        b.iter(|| {
            let mut edits = pending_inserts(500);
            let mut rebaser = Rebaser::new();
            for delta in &deltas {
                rebaser.record(delta.clone(), &last_seen);
            }
            black_box(rebaser.reconcile_pending(&mut edits))
        })
    });
}

fn interleaved_drain(c: &mut Criterion) {
    c.bench_function("interleaved_drain_200", |b| {
        b.iter(|| {
            let doc = Document::from_snapshot(&[SnapshotNode::element("body")]).unwrap();
            let mut doc = PatchedDocument::install(doc, PatcherConfig::default());
            doc.receive_edits(
                (0..200).map(|k| RemoteEdit::Insert {
                    parent: ChildPath::from([0]),
                    index: k,
                    node: NewNode::element("p"),
                }),
            );
            let body = doc.child_at(doc.root(), 0).unwrap();
            for _ in 0..200 {
                let local = doc.create_element("span");
                doc.append_child(body, local).unwrap();
                doc.step();
            }
            black_box(doc.signal_complete())
        })
    });
}

criterion_group!(benches, reconcile_pending, interleaved_drain);
criterion_main!(benches);
