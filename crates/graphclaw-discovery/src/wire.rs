//! Wire entities: the JSON shapes scanners hand us, and their conversion to
//! nodes.
//!
//! Producers know parents only as packed keys (`host_id`, `port_id`,
//! `parent_key`). Those are attached with [`SchemaNode::attach_key`], which
//! decodes them up front and sets both parent representations.

use graphclaw_core::{GraphNode, NodeRef, Properties, Result};
use graphclaw_schema::{CustomNode, SchemaNode};
use serde::{Deserialize, Serialize};

/// A file of wire entities, as read by `graphclaw validate` / `plan`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireBatch {
    #[serde(default)]
    pub entities: Vec<WireEntity>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEntity {
    Host(WireHost),
    Port(WirePort),
    Service(WireService),
    /// Any taxonomy kind, fields by name.
    Entity(WireGeneric),
    /// A `namespace:type` kind outside the taxonomy.
    Custom(WireCustom),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireHost {
    pub ip: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub reachable: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WirePort {
    /// Owning host's ip
    pub host_id: String,
    pub number: u16,
    pub protocol: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub filtered: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireService {
    /// Packed `{host}:{port}:{protocol}`
    pub port_id: String,
    pub name: String,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub cpe: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireGeneric {
    pub kind: String,
    #[serde(default)]
    pub fields: Properties,
    #[serde(default)]
    pub parent_key: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireCustom {
    pub kind: String,
    #[serde(default)]
    pub identity: Properties,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub parent: Option<NodeRef>,
}

impl WireEntity {
    pub fn kind(&self) -> &str {
        match self {
            WireEntity::Host(_) => "host",
            WireEntity::Port(_) => "port",
            WireEntity::Service(_) => "service",
            WireEntity::Entity(e) => &e.kind,
            WireEntity::Custom(c) => &c.kind,
        }
    }

    pub fn into_node(self) -> Result<Box<dyn GraphNode>> {
        let node: Box<dyn GraphNode> = match self {
            WireEntity::Host(h) => Box::new(h.into_node()?),
            WireEntity::Port(p) => Box::new(p.into_node()?),
            WireEntity::Service(s) => Box::new(s.into_node()?),
            WireEntity::Entity(e) => Box::new(e.into_node()?),
            WireEntity::Custom(c) => Box::new(c.into_node()?),
        };
        Ok(node)
    }
}

fn set_opt(node: &mut SchemaNode, field: &str, value: Option<String>) -> Result<()> {
    if let Some(v) = value {
        node.set(field, v)?;
    }
    Ok(())
}

impl WireHost {
    pub fn into_node(self) -> Result<SchemaNode> {
        let mut node = SchemaNode::new("host")?;
        node.set("ip", self.ip)?;
        set_opt(&mut node, "hostname", self.hostname)?;
        set_opt(&mut node, "os", self.os)?;
        set_opt(&mut node, "mac", self.mac)?;
        node.set("reachable", self.reachable)?;
        if !self.tags.is_empty() {
            node.set("tags", self.tags)?;
        }
        Ok(node)
    }
}

impl WirePort {
    pub fn into_node(self) -> Result<SchemaNode> {
        let mut node = SchemaNode::new("port")?;
        node.set("number", self.number)?
            .set("protocol", self.protocol)?
            .set("filtered", self.filtered)?;
        set_opt(&mut node, "state", self.state)?;
        set_opt(&mut node, "banner", self.banner)?;
        if !self.host_id.is_empty() {
            node.attach_key(&self.host_id)?;
        }
        Ok(node)
    }
}

impl WireService {
    pub fn into_node(self) -> Result<SchemaNode> {
        let mut node = SchemaNode::new("service")?;
        node.set("name", self.name)?.set("tls", self.tls)?;
        set_opt(&mut node, "product", self.product)?;
        set_opt(&mut node, "version", self.version)?;
        if !self.cpe.is_empty() {
            node.set("cpe", self.cpe)?;
        }
        if !self.port_id.is_empty() {
            node.attach_key(&self.port_id)?;
        }
        Ok(node)
    }
}

impl WireGeneric {
    pub fn into_node(self) -> Result<SchemaNode> {
        let mut node = SchemaNode::new(&self.kind)?;
        for (field, value) in self.fields {
            node.set(&field, value)?;
        }
        match self.parent_key.as_deref() {
            Some(key) if !key.is_empty() => {
                node.attach_key(key)?;
            }
            _ => {}
        }
        Ok(node)
    }
}

impl WireCustom {
    pub fn into_node(self) -> Result<CustomNode> {
        let mut node = CustomNode::parse(&self.kind)?;
        for (field, value) in self.identity {
            node = node.with_identity(field, value);
        }
        for (field, value) in self.properties {
            node = node.with_property(field, value);
        }
        if let Some(parent) = self.parent {
            node = node.with_parent(parent)?;
        }
        Ok(node)
    }
}

impl From<WireHost> for WireEntity {
    fn from(h: WireHost) -> Self {
        WireEntity::Host(h)
    }
}

impl From<WirePort> for WireEntity {
    fn from(p: WirePort) -> Self {
        WireEntity::Port(p)
    }
}

impl From<WireService> for WireEntity {
    fn from(s: WireService) -> Self {
        WireEntity::Service(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphclaw_core::{Error, Value};

    #[test]
    fn tagged_json() {
        let json = r#"[
            {"type": "host", "ip": "10.0.0.5", "os": "linux"},
            {"type": "port", "host_id": "10.0.0.5", "number": 443, "protocol": "tcp"},
            {"type": "service", "port_id": "10.0.0.5:443:tcp", "name": "https"},
            {"type": "entity", "kind": "domain", "fields": {"name": "example.com"}},
            {"type": "custom", "kind": "acme:widget", "identity": {"sku": "W-1"}}
        ]"#;
        let entities: Vec<WireEntity> = serde_json::from_str(json).unwrap();
        let kinds: Vec<_> = entities.iter().map(|e| e.kind().to_string()).collect();
        assert_eq!(kinds, ["host", "port", "service", "domain", "acme:widget"]);
    }

    #[test]
    fn port_parent_from_host_id() {
        let port = WirePort {
            host_id: "10.0.0.5".into(),
            number: 22,
            protocol: "tcp".into(),
            ..Default::default()
        }
        .into_node()
        .unwrap();
        let parent = port.parent_reference().unwrap();
        assert_eq!(parent.kind, "host");
        assert_eq!(parent.identity["ip"], Value::from("10.0.0.5"));
        assert_eq!(port.parent_reference(), port.legacy_parent_reference());
    }

    #[test]
    fn port_without_host_id_has_no_parent() {
        let port = WirePort {
            number: 22,
            protocol: "tcp".into(),
            ..Default::default()
        }
        .into_node()
        .unwrap();
        assert!(port.parent_reference().is_none());
    }

    #[test]
    fn malformed_port_id_fails_conversion() {
        let err = WireService {
            port_id: "10.0.0.5:https:tcp".into(),
            name: "https".into(),
            ..Default::default()
        }
        .into_node()
        .unwrap_err();
        assert!(matches!(err, Error::KeyDecode(_)));
    }

    #[test]
    fn generic_entity_uses_taxonomy_fields() {
        let mut fields = Properties::new();
        fields.insert("record_type".into(), Value::from("A"));
        fields.insert("value".into(), Value::from("93.184.216.34"));
        let rec = WireGeneric {
            kind: "dns_record".into(),
            fields,
            parent_key: Some("example.com".into()),
        }
        .into_node()
        .unwrap();
        assert_eq!(rec.relationship_label(), "RECORD_OF");

        let bad = WireGeneric {
            kind: "dns_record".into(),
            fields: [("colour".to_string(), Value::from("red"))].into_iter().collect(),
            parent_key: None,
        };
        assert!(matches!(bad.into_node(), Err(Error::UnknownField { .. })));
    }
}
