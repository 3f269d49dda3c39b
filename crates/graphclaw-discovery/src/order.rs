//! Insertion order for a batch: parents before children.
//!
//! Nodes are sorted topologically over the parent references actually present
//! in the batch (Kahn's algorithm). Among nodes that are ready, the lower
//! class rank goes first and ties keep insertion order. Class rank is the
//! kind's depth in the taxonomy; custom kinds rank after every registered
//! kind. A batch with no intra-batch references therefore comes out in plain
//! class order, roots first.

use graphclaw_core::{NodeKey, NodeRecord};
use graphclaw_schema::taxonomy::{self, TAXONOMY};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Rank for kinds outside the taxonomy. Greater than any taxonomy depth.
pub fn custom_rank() -> usize {
    TAXONOMY.len()
}

pub fn class_rank(kind: &str) -> usize {
    taxonomy::depth(kind).unwrap_or_else(custom_rank)
}

/// Permutation of `records` indices in insertion-safe order.
pub fn insertion_order(records: &[NodeRecord]) -> Vec<usize> {
    let n = records.len();
    let ranks: Vec<usize> = records.iter().map(|r| class_rank(&r.kind)).collect();

    let mut position: HashMap<NodeKey, usize> = HashMap::with_capacity(n);
    for (i, r) in records.iter().enumerate() {
        position
            .entry(NodeKey::new(&r.kind, &r.identity))
            .or_insert(i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut pending = vec![0usize; n];
    for (i, r) in records.iter().enumerate() {
        let Some(parent) = &r.parent else { continue };
        if let Some(&p) = position.get(&parent.node_key()) {
            if p != i {
                children[p].push(i);
                pending[i] += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = (0..n)
        .filter(|&i| pending[i] == 0)
        .map(|i| Reverse((ranks[i], i)))
        .collect();

    let mut order = Vec::with_capacity(n);
    let mut emitted = vec![false; n];
    while let Some(Reverse((_, i))) = ready.pop() {
        order.push(i);
        emitted[i] = true;
        for &c in &children[i] {
            pending[c] -= 1;
            if pending[c] == 0 {
                ready.push(Reverse((ranks[c], c)));
            }
        }
    }

    if order.len() < n {
        let mut rest: Vec<usize> = (0..n).filter(|&i| !emitted[i]).collect();
        rest.sort_by_key(|&i| (ranks[i], i));
        tracing::warn!(
            count = rest.len(),
            "parent references form a cycle; emitting remaining nodes in class order"
        );
        order.extend(rest);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphclaw_core::{Identity, NodeRef, Value};

    fn record(kind: &str, id: &str, parent: Option<(&str, &str)>) -> NodeRecord {
        let mut identity = Identity::new();
        identity.insert("id".into(), Value::from(id));
        let parent = parent.map(|(k, pid)| {
            let mut pi = Identity::new();
            pi.insert("id".into(), Value::from(pid));
            NodeRef::new(k, pi, "CHILD_OF")
        });
        let relationship = parent.as_ref().map(|p| p.relationship.clone()).unwrap_or_default();
        NodeRecord {
            kind: kind.into(),
            properties: identity.clone(),
            identity,
            parent,
            relationship,
        }
    }

    #[test]
    fn class_ranks() {
        assert_eq!(class_rank("host"), 0);
        assert_eq!(class_rank("port"), 1);
        assert_eq!(class_rank("service"), 2);
        assert!(class_rank("acme:widget") > class_rank("endpoint"));
    }

    #[test]
    fn custom_chain_is_topological() {
        let records = vec![
            record("acme:leaf", "c", Some(("acme:mid", "b"))),
            record("acme:mid", "b", Some(("acme:root", "a"))),
            record("acme:root", "a", None),
        ];
        assert_eq!(insertion_order(&records), vec![2, 1, 0]);
    }

    #[test]
    fn unrelated_custom_nodes_keep_insertion_order() {
        let records = vec![
            record("acme:x", "1", None),
            record("acme:y", "2", None),
            record("acme:x", "3", None),
        ];
        assert_eq!(insertion_order(&records), vec![0, 1, 2]);
    }

    #[test]
    fn cycle_is_broken_not_dropped() {
        let records = vec![
            record("acme:a", "1", Some(("acme:b", "2"))),
            record("acme:b", "2", Some(("acme:a", "1"))),
            record("acme:c", "3", None),
        ];
        assert_eq!(insertion_order(&records), vec![2, 0, 1]);
    }

    #[test]
    fn self_reference_is_ignored() {
        let records = vec![record("acme:a", "1", Some(("acme:a", "1")))];
        assert_eq!(insertion_order(&records), vec![0]);
    }
}
