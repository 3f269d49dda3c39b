//! Schema-driven node: one implementation of the node contract for every
//! kind in the taxonomy.
//!
//! A child node carries its parent twice: as a structured [`NodeRef`] set by
//! [`SchemaNode::belongs_to`], and as the packed key in the kind's key field.
//! `belongs_to` writes both; [`GraphNode::parent_reference`] reads the
//! structured one first and falls back to decoding the key field.
//!
//! ```
//! use graphclaw_core::GraphNode;
//! use graphclaw_schema::SchemaNode;
//!
//! # fn main() -> graphclaw_core::Result<()> {
//! let host = SchemaNode::new("host")?.with("ip", "10.0.0.5")?;
//! let port = SchemaNode::new("port")?
//!     .with("number", 443)?
//!     .with("protocol", "tcp")?
//!     .belongs_to(&host)?
//!     .with("state", "open")?;
//!
//! let parent = port.parent_reference().unwrap();
//! assert_eq!(parent.kind, "host");
//! assert_eq!(port.relationship_label(), "EXPOSED_BY");
//! # Ok(())
//! # }
//! ```

use crate::taxonomy::{kind_spec, FieldType, KindSpec, ParentLink};
use graphclaw_core::{Error, GraphNode, Identity, NodeRef, Properties, Result, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct SchemaNode {
    spec: &'static KindSpec,
    fields: BTreeMap<&'static str, Value>,
    parent: Option<NodeRef>,
}

impl SchemaNode {
    pub fn new(kind: &str) -> Result<Self> {
        let spec = kind_spec(kind).ok_or_else(|| Error::unknown_node_type(kind))?;
        Ok(Self::from_spec(spec))
    }

    pub fn from_spec(spec: &'static KindSpec) -> Self {
        Self {
            spec,
            fields: BTreeMap::new(),
            parent: None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Set a declared field. Writing the parent key field directly drops any
    /// structured parent, so the key field becomes the only source. A key
    /// that decodes is stored in canonical form; one that does not is kept
    /// as given and resolves to no parent.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let spec = self
            .spec
            .field(field)
            .ok_or_else(|| Error::unknown_field(self.spec.kind, field))?;
        let mut value = spec.ty.coerce(value.into()).ok_or_else(|| Error::FieldType {
            kind: self.spec.kind.to_string(),
            field: field.to_string(),
            expected: spec.ty.name(),
        })?;

        if let Some(link) = self.link().filter(|l| l.key_field == spec.name) {
            self.parent = None;
            value = self.canonical_key(link, value);
        }
        self.fields.insert(spec.name, value);
        Ok(self)
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    /// Attach to `parent`, replacing any previous parent.
    ///
    /// Fails without touching the node if this kind is a root, if `parent`
    /// is not the kind the taxonomy names, if any parent identity field
    /// the key needs is empty, or if the parent identity does not come back
    /// unchanged from its packed key.
    pub fn attach_to(&mut self, parent: &dyn GraphNode) -> Result<&mut Self> {
        let link = self.child_link()?;
        if parent.kind() != link.kind {
            return Err(Error::invalid_parent(
                self.spec.kind,
                format!("expected a '{}' parent, got '{}'", link.kind, parent.kind()),
            ));
        }

        let parent_identity = parent.identity();
        let identity: Identity = link
            .codec
            .parent_fields()
            .iter()
            .filter_map(|f| parent_identity.get(*f).map(|v| (f.to_string(), v.clone())))
            .collect();
        let key = self.pack(link, &identity)?;

        self.fields.insert(link.key_field, Value::String(key));
        self.parent = Some(NodeRef::new(link.kind, identity, link.relationship));
        Ok(self)
    }

    pub fn belongs_to(mut self, parent: &dyn GraphNode) -> Result<Self> {
        self.attach_to(parent)?;
        Ok(self)
    }

    /// Attach by packed key, for producers that only know the parent as a
    /// string. The key is decoded up front; a malformed key is an error here
    /// rather than a silently unresolvable parent later.
    pub fn attach_key(&mut self, key: &str) -> Result<&mut Self> {
        let link = self.child_link()?;
        let identity = link.codec.decode(key)?;
        // re-encode so the stored key is canonical
        let key = self.pack(link, &identity)?;

        self.fields.insert(link.key_field, Value::String(key));
        self.parent = Some(NodeRef::new(link.kind, identity, link.relationship));
        Ok(self)
    }

    pub fn belongs_to_key(mut self, key: &str) -> Result<Self> {
        self.attach_key(key)?;
        Ok(self)
    }

    /// Parent as read from the packed key field alone.
    pub fn legacy_parent_reference(&self) -> Option<NodeRef> {
        let link = self.link()?;
        let key = self.fields.get(link.key_field)?.as_str()?;
        if key.is_empty() {
            return None;
        }
        match link.codec.decode(key) {
            Ok(identity) => Some(NodeRef::new(link.kind, identity, link.relationship)),
            Err(e) => {
                tracing::debug!(kind = self.spec.kind, key, "parent key unresolvable: {}", e);
                None
            }
        }
    }

    /// Encode `identity` as this kind's parent key, accepting it only if
    /// decoding the key gives the same identity back.
    fn pack(&self, link: ParentLink, identity: &Identity) -> Result<String> {
        let key = link.codec.encode(self.spec.kind, identity)?;
        match link.codec.decode(&key) {
            Ok(unpacked) if unpacked == *identity => Ok(key),
            Ok(_) => Err(Error::invalid_parent(
                self.spec.kind,
                format!("parent identity does not survive packing into '{}'", key),
            )),
            Err(e) => Err(Error::invalid_parent(
                self.spec.kind,
                format!("parent key '{}' does not decode: {}", key, e),
            )),
        }
    }

    fn canonical_key(&self, link: ParentLink, value: Value) -> Value {
        let canonical = value
            .as_str()
            .and_then(|key| link.codec.decode(key).ok())
            .and_then(|identity| self.pack(link, &identity).ok());
        canonical.map(Value::String).unwrap_or(value)
    }

    fn link(&self) -> Option<ParentLink> {
        self.spec.parent
    }

    fn child_link(&self) -> Result<ParentLink> {
        self.link().ok_or_else(|| {
            Error::invalid_parent(self.spec.kind, "root kinds take no parent")
        })
    }
}

impl GraphNode for SchemaNode {
    fn kind(&self) -> &str {
        self.spec.kind
    }

    fn identity(&self) -> Identity {
        self.spec
            .identity
            .iter()
            .map(|f| {
                let value = self
                    .fields
                    .get(f.name)
                    .cloned()
                    .unwrap_or_else(|| f.ty.default_value());
                (f.name.to_string(), value)
            })
            .collect()
    }

    fn properties(&self) -> Properties {
        let mut props = self.identity();
        for f in self.spec.optional {
            match self.fields.get(f.name) {
                Some(v) if !v.is_default() => {
                    props.insert(f.name.to_string(), v.clone());
                }
                // unset booleans still go out as false
                None if f.ty == FieldType::Bool => {
                    props.insert(f.name.to_string(), Value::Bool(false));
                }
                _ => {}
            }
        }
        props
    }

    fn parent_reference(&self) -> Option<NodeRef> {
        self.parent
            .clone()
            .or_else(|| self.legacy_parent_reference())
    }
}
