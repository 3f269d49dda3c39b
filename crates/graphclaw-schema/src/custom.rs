//! Custom kinds: `namespace:type` nodes with caller-supplied identity and
//! properties, outside the taxonomy.
//!
//! The hierarchy registry does not know these kinds, so strict validation
//! rejects them as unknown. Accepting them is an explicit opt-in through
//! `ValidationPolicy::allow_namespaced_kinds`.

use graphclaw_core::{Error, GraphNode, Identity, NodeRef, Properties, Result, Value};

/// True for `namespace:type` with both halves non-empty and no further colons.
pub fn is_namespaced(kind: &str) -> bool {
    split_kind(kind).is_some()
}

fn split_kind(kind: &str) -> Option<(&str, &str)> {
    let (ns, ty) = kind.split_once(':')?;
    (!ns.is_empty() && !ty.is_empty() && !ty.contains(':')).then_some((ns, ty))
}

#[derive(Clone, Debug)]
pub struct CustomNode {
    kind: String,
    identity: Identity,
    properties: Properties,
    parent: Option<NodeRef>,
}

impl CustomNode {
    pub fn new(namespace: &str, type_name: &str) -> Result<Self> {
        Self::parse(&format!("{}:{}", namespace, type_name))
    }

    pub fn parse(kind: &str) -> Result<Self> {
        if !is_namespaced(kind) {
            return Err(Error::InvalidKind(kind.to_string()));
        }
        Ok(Self {
            kind: kind.to_string(),
            identity: Identity::new(),
            properties: Properties::new(),
            parent: None,
        })
    }

    pub fn namespace(&self) -> &str {
        split_kind(&self.kind).map(|(ns, _)| ns).unwrap_or_default()
    }

    pub fn type_name(&self) -> &str {
        split_kind(&self.kind).map(|(_, ty)| ty).unwrap_or_default()
    }

    pub fn with_identity(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.identity.insert(field.into(), value.into());
        self
    }

    pub fn with_property(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(field.into(), value.into());
        self
    }

    /// Attach to any node under an explicit edge label.
    pub fn belongs_to(self, parent: &dyn GraphNode, relationship: &str) -> Result<Self> {
        let parent_ref = NodeRef::new(parent.kind(), parent.identity(), relationship);
        self.with_parent(parent_ref)
    }

    /// Attach to a parent known only by reference.
    pub fn with_parent(mut self, parent: NodeRef) -> Result<Self> {
        if parent.relationship.is_empty() {
            return Err(Error::invalid_parent(&self.kind, "relationship label is empty"));
        }
        if parent.identity.is_empty() {
            return Err(Error::invalid_parent(
                &self.kind,
                format!("parent '{}' has no identity", parent.kind),
            ));
        }
        if let Some((field, _)) = parent.identity.iter().find(|(_, v)| v.is_default()) {
            return Err(Error::invalid_parent(
                &self.kind,
                format!("parent has an empty '{}'", field),
            ));
        }
        self.parent = Some(parent);
        Ok(self)
    }
}

impl GraphNode for CustomNode {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn identity(&self) -> Identity {
        self.identity.clone()
    }

    fn properties(&self) -> Properties {
        let mut props = self.identity.clone();
        for (k, v) in &self.properties {
            if !v.is_default() && !props.contains_key(k) {
                props.insert(k.clone(), v.clone());
            }
        }
        props
    }

    fn parent_reference(&self) -> Option<NodeRef> {
        self.parent.clone()
    }
}
