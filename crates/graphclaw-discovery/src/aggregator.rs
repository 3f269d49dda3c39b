//! Discovery aggregator: collects the nodes one pass produces and turns them
//! into a validated, ordered batch for the graph writer.
//!
//! Single writer: `push` takes `&mut self`. Share one across producers only
//! behind your own lock.

use crate::order::insertion_order;
use crate::wire::WireEntity;
use chrono::{DateTime, Utc};
use graphclaw_core::{GraphNode, NodeKey, NodeRecord, NodeRef, Result};
use graphclaw_schema::{HierarchyRegistry, ValidationPolicy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub struct DiscoveryAggregator {
    nodes: Vec<Box<dyn GraphNode>>,
    counts: HashMap<String, usize>,
    policy: ValidationPolicy,
    dedupe: bool,
}

impl Default for DiscoveryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryAggregator {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            counts: HashMap::new(),
            policy: ValidationPolicy::default(),
            dedupe: true,
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Collapse nodes sharing `(kind, identity)` into one record. On by default.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    pub fn push(&mut self, node: impl GraphNode + 'static) {
        self.push_boxed(Box::new(node));
    }

    pub fn push_boxed(&mut self, node: Box<dyn GraphNode>) {
        *self.counts.entry(node.kind().to_string()).or_default() += 1;
        self.nodes.push(node);
    }

    /// Convert a wire entity and collect it. Conversion errors (bad field,
    /// malformed parent key) are returned, not collected.
    pub fn push_wire(&mut self, entity: WireEntity) -> Result<()> {
        let node = entity.into_node()?;
        self.push_boxed(node);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count_of(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    /// Validate every node, drop and report the ones that fail, and order
    /// the rest parents-first.
    pub fn finish(self) -> Batch {
        let registry = HierarchyRegistry::global();
        let mut accepted = Vec::with_capacity(self.nodes.len());
        let mut rejected = Vec::new();

        for (index, node) in self.nodes.iter().enumerate() {
            match registry.validate_with(node.as_ref(), &self.policy) {
                Ok(()) => accepted.push(node.to_record()),
                Err(e) => {
                    tracing::warn!(index, kind = node.kind(), "rejected node: {}", e);
                    rejected.push(Rejected {
                        index,
                        kind: node.kind().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if self.dedupe {
            accepted = merge_duplicates(accepted);
        }

        let order = insertion_order(&accepted);
        let mut slots: Vec<Option<NodeRecord>> = accepted.into_iter().map(Some).collect();
        let nodes: Vec<NodeRecord> = order.into_iter().filter_map(|i| slots[i].take()).collect();

        let batch = Batch {
            id: Uuid::new_v4(),
            assembled_at: Utc::now(),
            nodes,
            rejected,
        };
        tracing::info!(
            batch = %batch.id,
            nodes = batch.nodes.len(),
            rejected = batch.rejected.len(),
            "batch assembled"
        );
        batch
    }
}

/// Later duplicates fold into the first occurrence: their properties
/// overwrite, and their parent (if any) replaces the earlier one.
fn merge_duplicates(records: Vec<NodeRecord>) -> Vec<NodeRecord> {
    let mut out: Vec<NodeRecord> = Vec::with_capacity(records.len());
    let mut seen: HashMap<NodeKey, usize> = HashMap::new();

    for rec in records {
        let key = rec.node_key();
        match seen.get(&key) {
            Some(&i) => {
                tracing::debug!(node = %key, "merging duplicate node");
                let first = &mut out[i];
                first.properties.extend(rec.properties);
                if rec.parent.is_some() {
                    first.parent = rec.parent;
                    first.relationship = rec.relationship;
                }
            }
            None => {
                seen.insert(key, out.len());
                out.push(rec);
            }
        }
    }
    out
}

/// A node the validator turned away.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rejected {
    /// Position in push order
    pub index: usize,
    pub kind: String,
    pub reason: String,
}

/// Edge the graph writer creates: `(child)-[relationship]->(parent)`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    pub child: NodeRef,
    pub relationship: String,
    pub parent: NodeRef,
}

/// One discovery pass, ready for the graph writer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub assembled_at: DateTime<Utc>,
    /// Validated records, parents before children.
    pub nodes: Vec<NodeRecord>,
    pub rejected: Vec<Rejected>,
}

impl Batch {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.nodes
            .iter()
            .filter_map(|rec| {
                let parent = rec.parent.clone()?;
                Some(Edge {
                    child: NodeRef::new(&rec.kind, rec.identity.clone(), &rec.relationship),
                    relationship: rec.relationship.clone(),
                    parent,
                })
            })
            .collect()
    }

    /// Node count per kind.
    pub fn summary(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for rec in &self.nodes {
            *counts.entry(rec.kind.clone()).or_default() += 1;
        }
        counts
    }
}
