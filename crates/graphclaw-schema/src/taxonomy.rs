//! Kind taxonomy: the declarative table every schema-driven node reads.
//!
//! Each entry fixes, once:
//! - the identity fields (the upsert key among nodes of that kind)
//! - the optional descriptive fields
//! - for child kinds: the parent kind, the edge label, the field that holds
//!   the packed parent key, and the codec that packs it
//!
//! Adding a kind means adding an entry here and a line in the hierarchy
//! registry; `SchemaNode` needs no per-kind code.

use graphclaw_core::key::{KeyError, PortKey, ServiceKey};
use graphclaw_core::{Error, Identity, Result, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Bytes,
    List,
    Map,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Bool => "boolean",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Map => "map",
        }
    }

    /// Check a value against this type. Integers widen into float fields;
    /// NaN and infinities are refused since JSON cannot carry them.
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (Self::String, v @ Value::String(_)) => Some(v),
            (Self::Int, v @ Value::Int(_)) => Some(v),
            (Self::Float, Value::Float(f)) if f.is_finite() => Some(Value::Float(f)),
            (Self::Float, Value::Int(i)) => Some(Value::Float(i as f64)),
            (Self::Bool, v @ Value::Bool(_)) => Some(v),
            (Self::Bytes, v @ Value::Bytes(_)) => Some(v),
            (Self::List, v @ Value::List(_)) => Some(v),
            (Self::Map, v @ Value::Map(_)) => Some(v),
            _ => None,
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Bool => Value::Bool(false),
            Self::Bytes => Value::Bytes(Vec::new()),
            Self::List => Value::List(Vec::new()),
            Self::Map => Value::Map(Default::default()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec { name, ty: FieldType::String }
}

const fn int(name: &'static str) -> FieldSpec {
    FieldSpec { name, ty: FieldType::Int }
}

const fn float(name: &'static str) -> FieldSpec {
    FieldSpec { name, ty: FieldType::Float }
}

const fn flag(name: &'static str) -> FieldSpec {
    FieldSpec { name, ty: FieldType::Bool }
}

const fn bytes(name: &'static str) -> FieldSpec {
    FieldSpec { name, ty: FieldType::Bytes }
}

const fn list(name: &'static str) -> FieldSpec {
    FieldSpec { name, ty: FieldType::List }
}

const fn map(name: &'static str) -> FieldSpec {
    FieldSpec { name, ty: FieldType::Map }
}

/// How a child packs its parent's identity into one string field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCodec {
    /// The parent has a single string identity field; the key is its value.
    Plain(&'static str),
    /// Parent is a port: `{host}:{number}:{protocol}`.
    HostPortProtocol,
    /// Parent is a service: `{port_key}:{name}`.
    PortKeyName,
}

impl KeyCodec {
    /// Parent identity fields the key covers.
    pub fn parent_fields(&self) -> &[&'static str] {
        match self {
            Self::Plain(field) => std::slice::from_ref(field),
            Self::HostPortProtocol => &["host", "number", "protocol"],
            Self::PortKeyName => &["port_key", "name"],
        }
    }

    /// Pack a parent identity. Every covered field must be present and non-default.
    pub fn encode(&self, child_kind: &str, parent: &Identity) -> Result<String> {
        let get = |field: &str| required(child_kind, parent, field);
        match *self {
            Self::Plain(field) => Ok(get(field)?.to_string()),
            Self::HostPortProtocol => {
                let number = get("number")?;
                let port = number
                    .as_i64()
                    .and_then(|n| u16::try_from(n).ok())
                    .ok_or_else(|| {
                        Error::invalid_parent(child_kind, format!("port number {} is out of range", number))
                    })?;
                Ok(PortKey::new(get("host")?.to_string(), port, get("protocol")?.to_string()).encode())
            }
            Self::PortKeyName => {
                let port = PortKey::decode(&get("port_key")?.to_string())?;
                Ok(ServiceKey::new(port, get("name")?.to_string()).encode())
            }
        }
    }

    /// Unpack a key into the parent identity it names.
    pub fn decode(&self, key: &str) -> std::result::Result<Identity, KeyError> {
        let mut identity = Identity::new();
        match *self {
            Self::Plain(field) => {
                if key.is_empty() {
                    return Err(KeyError::EmptyComponent {
                        key: key.to_string(),
                        component: field,
                    });
                }
                identity.insert(field.to_string(), Value::from(key));
            }
            Self::HostPortProtocol => {
                let k = PortKey::decode(key)?;
                identity.insert("host".into(), Value::String(k.host));
                identity.insert("number".into(), Value::from(k.port));
                identity.insert("protocol".into(), Value::String(k.protocol));
            }
            Self::PortKeyName => {
                let k = ServiceKey::decode(key)?;
                identity.insert("port_key".into(), Value::String(k.port.encode()));
                identity.insert("name".into(), Value::String(k.name));
            }
        }
        Ok(identity)
    }
}

fn required<'a>(child_kind: &str, parent: &'a Identity, field: &str) -> Result<&'a Value> {
    parent
        .get(field)
        .filter(|v| !v.is_default())
        .ok_or_else(|| Error::invalid_parent(child_kind, format!("parent has an empty '{}'", field)))
}

/// Link from a child kind to its parent kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParentLink {
    pub kind: &'static str,
    /// Edge label, read child → parent.
    pub relationship: &'static str,
    /// Child field holding the packed parent key.
    pub key_field: &'static str,
    pub codec: KeyCodec,
}

/// One kind in the taxonomy.
#[derive(Clone, Copy, Debug)]
pub struct KindSpec {
    pub kind: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub identity: &'static [FieldSpec],
    pub optional: &'static [FieldSpec],
    pub parent: Option<ParentLink>,
}

impl KindSpec {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.identity
            .iter()
            .chain(self.optional.iter())
            .find(|f| f.name == name)
    }

    pub fn is_identity(&self, name: &str) -> bool {
        self.identity.iter().any(|f| f.name == name)
    }

    pub fn requires_parent(&self) -> bool {
        self.parent.is_some()
    }
}

const fn link(
    kind: &'static str,
    relationship: &'static str,
    key_field: &'static str,
    codec: KeyCodec,
) -> Option<ParentLink> {
    Some(ParentLink { kind, relationship, key_field, codec })
}

pub static TAXONOMY: &[KindSpec] = &[
    // ─── Network infrastructure ───
    KindSpec {
        kind: "host",
        name: "Host",
        identity: &[text("ip")],
        optional: &[text("hostname"), text("os"), text("mac"), flag("reachable"), list("tags")],
        parent: None,
    },
    KindSpec {
        kind: "port",
        name: "Port",
        identity: &[text("host"), int("number"), text("protocol")],
        optional: &[text("state"), text("banner"), flag("filtered")],
        parent: link("host", "EXPOSED_BY", "host", KeyCodec::Plain("ip")),
    },
    KindSpec {
        kind: "service",
        name: "Service",
        identity: &[text("port_key"), text("name")],
        optional: &[text("product"), text("version"), flag("tls"), list("cpe")],
        parent: link("port", "LISTENS_ON", "port_key", KeyCodec::HostPortProtocol),
    },
    KindSpec {
        kind: "endpoint",
        name: "HTTP Endpoint",
        identity: &[text("service_key"), text("path")],
        optional: &[text("method"), int("status_code"), flag("auth_required")],
        parent: link("service", "SERVED_BY", "service_key", KeyCodec::PortKeyName),
    },
    KindSpec {
        kind: "certificate",
        name: "TLS Certificate",
        identity: &[text("fingerprint")],
        optional: &[
            text("subject"),
            text("issuer"),
            text("not_before"),
            text("not_after"),
            list("sans"),
            flag("self_signed"),
        ],
        parent: None,
    },
    KindSpec {
        kind: "domain",
        name: "Domain",
        identity: &[text("name")],
        optional: &[text("registrar"), text("expires_at")],
        parent: None,
    },
    KindSpec {
        kind: "dns_record",
        name: "DNS Record",
        identity: &[text("domain"), text("record_type"), text("value")],
        optional: &[int("ttl")],
        parent: link("domain", "RECORD_OF", "domain", KeyCodec::Plain("name")),
    },
    KindSpec {
        kind: "vulnerability",
        name: "Vulnerability",
        identity: &[text("cve_id")],
        optional: &[text("severity"), float("cvss_score"), text("summary"), flag("exploitable")],
        parent: None,
    },
    // ─── Cloud ───
    KindSpec {
        kind: "cloud_account",
        name: "Cloud Account",
        identity: &[text("account_id")],
        optional: &[text("provider"), text("name"), text("organization")],
        parent: None,
    },
    KindSpec {
        kind: "cloud_region",
        name: "Cloud Region",
        identity: &[text("account_id"), text("region")],
        optional: &[flag("enabled")],
        parent: link("cloud_account", "REGION_OF", "account_id", KeyCodec::Plain("account_id")),
    },
    KindSpec {
        kind: "vpc",
        name: "Virtual Network",
        identity: &[text("vpc_id")],
        optional: &[text("account_id"), text("cidr"), text("region"), flag("is_default")],
        parent: link("cloud_account", "OWNED_BY", "account_id", KeyCodec::Plain("account_id")),
    },
    KindSpec {
        kind: "subnet",
        name: "Subnet",
        identity: &[text("subnet_id")],
        optional: &[text("vpc_id"), text("cidr"), text("availability_zone"), flag("public")],
        parent: link("vpc", "PART_OF", "vpc_id", KeyCodec::Plain("vpc_id")),
    },
    KindSpec {
        kind: "compute_instance",
        name: "Compute Instance",
        identity: &[text("instance_id")],
        optional: &[
            text("subnet_id"),
            text("instance_type"),
            text("state"),
            text("private_ip"),
            text("public_ip"),
            map("tags"),
        ],
        parent: link("subnet", "DEPLOYED_IN", "subnet_id", KeyCodec::Plain("subnet_id")),
    },
    KindSpec {
        kind: "storage_bucket",
        name: "Storage Bucket",
        identity: &[text("bucket_name")],
        optional: &[
            text("account_id"),
            text("region"),
            flag("public"),
            flag("encrypted"),
            int("object_count"),
        ],
        parent: link("cloud_account", "OWNED_BY", "account_id", KeyCodec::Plain("account_id")),
    },
    KindSpec {
        kind: "iam_role",
        name: "IAM Role",
        identity: &[text("arn")],
        optional: &[text("account_id"), text("name"), text("trust_policy")],
        parent: link("cloud_account", "DEFINED_IN", "account_id", KeyCodec::Plain("account_id")),
    },
    // ─── Containers ───
    KindSpec {
        kind: "container_image",
        name: "Container Image",
        identity: &[text("digest")],
        optional: &[text("repository"), text("tag"), int("size_bytes"), flag("signed")],
        parent: None,
    },
    KindSpec {
        kind: "container",
        name: "Container",
        identity: &[text("container_id")],
        optional: &[
            text("host_ip"),
            text("name"),
            text("image_digest"),
            text("state"),
            flag("privileged"),
        ],
        parent: link("host", "RUNS_ON", "host_ip", KeyCodec::Plain("ip")),
    },
    // ─── LLM artifacts ───
    KindSpec {
        kind: "llm_provider",
        name: "LLM Provider",
        identity: &[text("name")],
        optional: &[text("base_url"), text("region")],
        parent: None,
    },
    KindSpec {
        kind: "llm_model",
        name: "LLM Model",
        identity: &[text("provider"), text("model_id")],
        optional: &[text("family"), int("context_window"), flag("deprecated")],
        parent: link("llm_provider", "PROVIDED_BY", "provider", KeyCodec::Plain("name")),
    },
    KindSpec {
        kind: "prompt_template",
        name: "Prompt Template",
        identity: &[text("template_id"), int("version")],
        optional: &[text("name"), text("body"), list("variables")],
        parent: None,
    },
    KindSpec {
        kind: "dataset",
        name: "Dataset",
        identity: &[text("uri")],
        optional: &[text("format"), int("record_count"), bytes("checksum")],
        parent: None,
    },
    KindSpec {
        kind: "embedding_index",
        name: "Embedding Index",
        identity: &[text("index_name")],
        optional: &[int("dimensions"), text("metric"), text("dataset_uri")],
        parent: None,
    },
    // ─── Agent execution ───
    KindSpec {
        kind: "agent",
        name: "Agent",
        identity: &[text("agent_id")],
        optional: &[text("name"), text("role"), text("version")],
        parent: None,
    },
    KindSpec {
        kind: "agent_session",
        name: "Agent Session",
        identity: &[text("session_id")],
        optional: &[
            text("agent_id"),
            text("started_at"),
            text("ended_at"),
            text("outcome"),
            flag("interactive"),
        ],
        parent: link("agent", "SESSION_OF", "agent_id", KeyCodec::Plain("agent_id")),
    },
    KindSpec {
        kind: "agent_run",
        name: "Agent Run",
        identity: &[text("run_id")],
        optional: &[
            text("session_id"),
            text("purpose"),
            text("status"),
            int("total_tokens"),
            int("wall_ms"),
            flag("succeeded"),
        ],
        parent: link("agent_session", "RUN_IN", "session_id", KeyCodec::Plain("session_id")),
    },
    KindSpec {
        kind: "llm_call",
        name: "LLM Call",
        identity: &[text("call_id")],
        optional: &[
            text("run_id"),
            text("model_id"),
            int("input_tokens"),
            int("output_tokens"),
            int("latency_ms"),
            float("cost_usd"),
            flag("streamed"),
        ],
        parent: link("agent_run", "CALLED_DURING", "run_id", KeyCodec::Plain("run_id")),
    },
    KindSpec {
        kind: "tool_call",
        name: "Tool Call",
        identity: &[text("call_id")],
        optional: &[
            text("run_id"),
            text("tool_name"),
            map("arguments"),
            int("duration_ms"),
            flag("is_error"),
        ],
        parent: link("agent_run", "INVOKED_DURING", "run_id", KeyCodec::Plain("run_id")),
    },
    KindSpec {
        kind: "run_artifact",
        name: "Run Artifact",
        identity: &[text("artifact_id")],
        optional: &[
            text("run_id"),
            text("path"),
            text("media_type"),
            int("size_bytes"),
            bytes("sha256"),
        ],
        parent: link("agent_run", "PRODUCED_BY", "run_id", KeyCodec::Plain("run_id")),
    },
];

fn index() -> &'static HashMap<&'static str, &'static KindSpec> {
    static INDEX: OnceLock<HashMap<&'static str, &'static KindSpec>> = OnceLock::new();
    INDEX.get_or_init(|| TAXONOMY.iter().map(|spec| (spec.kind, spec)).collect())
}

pub fn kind_spec(kind: &str) -> Option<&'static KindSpec> {
    index().get(kind).copied()
}

/// All kind tags, in table order.
pub fn kinds() -> impl Iterator<Item = &'static str> {
    TAXONOMY.iter().map(|spec| spec.kind)
}

/// Distance from a root kind (roots are 0). `None` for unknown kinds or a
/// parent chain that leaves the taxonomy.
pub fn depth(kind: &str) -> Option<usize> {
    let mut spec = kind_spec(kind)?;
    let mut depth = 0;
    while let Some(link) = spec.parent {
        spec = kind_spec(link.kind)?;
        depth += 1;
        if depth > TAXONOMY.len() {
            return None;
        }
    }
    Some(depth)
}

/// Kinds whose parent link names `kind`.
pub fn children_of(kind: &str) -> Vec<&'static KindSpec> {
    TAXONOMY
        .iter()
        .filter(|spec| spec.parent.map(|p| p.kind) == Some(kind))
        .collect()
}
