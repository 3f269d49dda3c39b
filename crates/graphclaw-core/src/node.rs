//! The node contract every entity satisfies before it reaches the graph store.

use crate::value::{Identity, Properties};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An entity that can be upserted as a property-graph node.
///
/// `identity()` is the upsert key among nodes of the same kind and must not
/// depend on descriptive fields. `properties()` is a superset of it.
/// The edge to the parent is `(self)-[label]->(parent)`.
pub trait GraphNode: Send + Sync {
    /// Canonical node-type tag (`host`, `port`, or `namespace:type`).
    fn kind(&self) -> &str;

    fn identity(&self) -> Identity;

    fn properties(&self) -> Properties;

    /// The parent this node resolves to, if any.
    fn parent_reference(&self) -> Option<NodeRef>;

    /// Edge label to the parent. Empty iff there is no parent.
    fn relationship_label(&self) -> String {
        self.parent_reference()
            .map(|p| p.relationship)
            .unwrap_or_default()
    }

    /// Snapshot in the shape the storage collaborator consumes.
    fn to_record(&self) -> NodeRecord {
        let parent = self.parent_reference();
        let relationship = parent
            .as_ref()
            .map(|p| p.relationship.clone())
            .unwrap_or_default();
        NodeRecord {
            kind: self.kind().to_string(),
            identity: self.identity(),
            properties: self.properties(),
            parent,
            relationship,
        }
    }

    fn node_key(&self) -> NodeKey {
        NodeKey::new(self.kind(), &self.identity())
    }
}

/// Pointer to a parent that may not be resolved yet.
///
/// Equality is by kind and identity; the label is edge metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRef {
    pub kind: String,
    pub identity: Identity,
    #[serde(default)]
    pub relationship: String,
}

impl NodeRef {
    pub fn new(kind: impl Into<String>, identity: Identity, relationship: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            identity,
            relationship: relationship.into(),
        }
    }

    pub fn node_key(&self) -> NodeKey {
        NodeKey::new(&self.kind, &self.identity)
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.identity == other.identity
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node_key())
    }
}

/// Hashable `(kind, identity)` pair used to match parent references against
/// nodes and to detect duplicates. The identity is held in its canonical
/// JSON form, which is stable because [`Identity`] is ordered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    kind: String,
    identity: String,
}

impl NodeKey {
    pub fn new(kind: &str, identity: &Identity) -> Self {
        Self {
            kind: kind.to_string(),
            identity: serde_json::to_string(identity).unwrap_or_default(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.identity)
    }
}

/// What gets handed to the graph writer: MERGE on `(kind, identity)`, set
/// `properties`, and create `(node)-[relationship]->(parent)` if present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub kind: String,
    pub identity: Identity,
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeRef>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relationship: String,
}

impl GraphNode for NodeRecord {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn identity(&self) -> Identity {
        self.identity.clone()
    }

    fn properties(&self) -> Properties {
        self.properties.clone()
    }

    fn parent_reference(&self) -> Option<NodeRef> {
        self.parent.clone()
    }

    fn relationship_label(&self) -> String {
        self.relationship.clone()
    }

    fn to_record(&self) -> NodeRecord {
        self.clone()
    }
}

impl<T: GraphNode + ?Sized> GraphNode for Box<T> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn identity(&self) -> Identity {
        (**self).identity()
    }

    fn properties(&self) -> Properties {
        (**self).properties()
    }

    fn parent_reference(&self) -> Option<NodeRef> {
        (**self).parent_reference()
    }

    fn relationship_label(&self) -> String {
        (**self).relationship_label()
    }

    fn to_record(&self) -> NodeRecord {
        (**self).to_record()
    }
}
