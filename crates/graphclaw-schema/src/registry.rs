//! Hierarchy registry: which kinds must resolve to a parent before storage.
//!
//! The table below is the registry. It is written out rather than derived from
//! the taxonomy so that a kind added to one and forgotten in the other fails
//! the coverage test instead of passing silently.

use crate::custom::is_namespaced;
use crate::taxonomy::kind_spec;
use graphclaw_core::{Error, GraphNode, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// `kind → requires parent`
pub static REQUIRES_PARENT: &[(&str, bool)] = &[
    // network
    ("host", false),
    ("port", true),
    ("service", true),
    ("endpoint", true),
    ("certificate", false),
    ("domain", false),
    ("dns_record", true),
    ("vulnerability", false),
    // cloud
    ("cloud_account", false),
    ("cloud_region", true),
    ("vpc", true),
    ("subnet", true),
    ("compute_instance", true),
    ("storage_bucket", true),
    ("iam_role", true),
    // containers
    ("container_image", false),
    ("container", true),
    // llm
    ("llm_provider", false),
    ("llm_model", true),
    ("prompt_template", false),
    ("dataset", false),
    ("embedding_index", false),
    // agent execution
    ("agent", false),
    ("agent_session", true),
    ("agent_run", true),
    ("llm_call", true),
    ("tool_call", true),
    ("run_artifact", true),
];

/// Knobs for the validation gate. The default is strict.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Accept `namespace:type` kinds that are not in the registry. They still
    /// need a non-empty identity.
    pub allow_namespaced_kinds: bool,
}

pub struct HierarchyRegistry {
    requires_parent: HashMap<&'static str, bool>,
}

impl HierarchyRegistry {
    pub fn from_entries(entries: &[(&'static str, bool)]) -> Self {
        Self {
            requires_parent: entries.iter().copied().collect(),
        }
    }

    /// The process-wide registry, built on first use and never mutated.
    pub fn global() -> &'static HierarchyRegistry {
        static GLOBAL: OnceLock<HierarchyRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| Self::from_entries(REQUIRES_PARENT))
    }

    pub fn requires_parent(&self, kind: &str) -> Option<bool> {
        self.requires_parent.get(kind).copied()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.requires_parent.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.requires_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requires_parent.is_empty()
    }

    pub fn validate(&self, node: &dyn GraphNode) -> Result<()> {
        self.validate_with(node, &ValidationPolicy::default())
    }

    /// Check a node before it goes to the graph writer:
    /// known kind, parent resolvable if required, identity complete.
    pub fn validate_with(&self, node: &dyn GraphNode, policy: &ValidationPolicy) -> Result<()> {
        let kind = node.kind();
        let Some(requires_parent) = self.requires_parent(kind) else {
            if policy.allow_namespaced_kinds && is_namespaced(kind) {
                return check_custom_identity(node);
            }
            return Err(Error::unknown_node_type(kind));
        };

        if requires_parent && node.parent_reference().is_none() {
            return Err(Error::missing_parent(kind));
        }

        if let Some(spec) = kind_spec(kind) {
            let identity = node.identity();
            for field in spec.identity {
                match identity.get(field.name) {
                    Some(v) if !v.is_default() => {}
                    _ => return Err(Error::missing_identity(kind, field.name)),
                }
            }
        }
        Ok(())
    }
}

fn check_custom_identity(node: &dyn GraphNode) -> Result<()> {
    let identity = node.identity();
    if identity.is_empty() {
        return Err(Error::missing_identity(node.kind(), "<any>"));
    }
    match identity.iter().find(|(_, v)| v.is_default()) {
        Some((field, _)) => Err(Error::missing_identity(node.kind(), field.as_str())),
        None => Ok(()),
    }
}

/// Validate against the global registry with the strict policy.
pub fn validate(node: &dyn GraphNode) -> Result<()> {
    HierarchyRegistry::global().validate(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CustomNode, SchemaNode};

    #[test]
    fn global_is_built_once() {
        let a = HierarchyRegistry::global() as *const _;
        let b = HierarchyRegistry::global() as *const _;
        assert_eq!(a, b);
        assert_eq!(HierarchyRegistry::global().len(), REQUIRES_PARENT.len());
    }

    #[test]
    fn lookup() {
        let reg = HierarchyRegistry::global();
        assert_eq!(reg.requires_parent("host"), Some(false));
        assert_eq!(reg.requires_parent("port"), Some(true));
        assert_eq!(reg.requires_parent("acme:widget"), None);
    }

    #[test]
    fn root_with_stray_parent_is_fine() {
        let reg = HierarchyRegistry::from_entries(&[("acme:widget", false)]);
        let n = CustomNode::parse("acme:widget")
            .unwrap()
            .with_identity("id", "w1")
            .with_parent(graphclaw_core::NodeRef::new(
                "host",
                [("ip".to_string(), "1.1.1.1".into())].into_iter().collect(),
                "NEAR",
            ))
            .unwrap();
        assert!(reg.validate(&n).is_ok());
    }

    #[test]
    fn missing_identity_after_parent_check() {
        let host = SchemaNode::new("host").unwrap();
        let err = validate(&host).unwrap_err();
        assert!(matches!(err, Error::MissingIdentity { ref field, .. } if field == "ip"));
    }

    #[test]
    fn custom_kinds_need_opt_in() {
        let n = CustomNode::parse("acme:widget").unwrap().with_identity("sku", "W-1");
        let err = validate(&n).unwrap_err();
        assert!(err.to_string().contains("unknown node type"));

        let policy = ValidationPolicy {
            allow_namespaced_kinds: true,
        };
        let reg = HierarchyRegistry::global();
        assert!(reg.validate_with(&n, &policy).is_ok());

        let empty = CustomNode::parse("acme:widget").unwrap();
        assert!(matches!(
            reg.validate_with(&empty, &policy),
            Err(Error::MissingIdentity { .. })
        ));
        let plain = CustomNode::parse("acme:widget").unwrap().with_identity("sku", "");
        assert!(reg.validate_with(&plain, &policy).is_err());
    }
}
