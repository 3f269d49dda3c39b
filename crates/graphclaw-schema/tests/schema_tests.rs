//! Tests for graphclaw-schema: taxonomy coverage, node contract per kind,
//! belongs_to, validation decision table

use graphclaw_core::{Error, GraphNode, Identity, Value};
use graphclaw_schema::taxonomy::{self, FieldType, KindSpec};
use graphclaw_schema::*;
use std::collections::{BTreeMap, BTreeSet};

fn sample_value(spec: &KindSpec, field: &str, ty: FieldType) -> Value {
    match ty {
        FieldType::String => Value::from(format!("{}-{}", spec.kind, field)),
        FieldType::Int => Value::Int(7),
        FieldType::Float => Value::Float(1.5),
        FieldType::Bool => Value::Bool(true),
        FieldType::Bytes => Value::bytes(vec![1u8, 2, 3]),
        FieldType::List => Value::from(vec!["a", "b"]),
        FieldType::Map => {
            let mut m = BTreeMap::new();
            m.insert("k".to_string(), Value::from("v"));
            Value::Map(m)
        }
    }
}

/// A fully populated node of `kind`, attached to a fully populated parent chain.
fn sample(kind: &str) -> SchemaNode {
    let spec = kind_spec(kind).unwrap();
    let mut node = SchemaNode::new(kind).unwrap();
    for f in spec.identity.iter().chain(spec.optional) {
        if spec.parent.map(|l| l.key_field) == Some(f.name) {
            continue;
        }
        node.set(f.name, sample_value(spec, f.name, f.ty)).unwrap();
    }
    if let Some(link) = spec.parent {
        node.attach_to(&sample(link.kind)).unwrap();
    }
    node
}

fn host(ip: &str) -> SchemaNode {
    SchemaNode::new("host").unwrap().with("ip", ip).unwrap()
}

fn port(number: u16, protocol: &str) -> SchemaNode {
    SchemaNode::new("port")
        .unwrap()
        .with("number", number)
        .unwrap()
        .with("protocol", protocol)
        .unwrap()
}

fn ip_identity(ip: &str) -> Identity {
    let mut id = Identity::new();
    id.insert("ip".into(), Value::from(ip));
    id
}

// ===========================================================================
// Registry coverage
// ===========================================================================

#[test]
fn registry_covers_exactly_the_taxonomy() {
    let registry: BTreeSet<_> = HierarchyRegistry::global().kinds().collect();
    let taxonomy: BTreeSet<_> = taxonomy::kinds().collect();

    let missing: Vec<_> = taxonomy.difference(&registry).collect();
    let stray: Vec<_> = registry.difference(&taxonomy).collect();
    assert!(missing.is_empty(), "kinds missing from registry: {:?}", missing);
    assert!(stray.is_empty(), "registry entries with no kind: {:?}", stray);
    assert_eq!(REQUIRES_PARENT.len(), TAXONOMY.len(), "duplicate registry rows");
}

#[test]
fn registry_flags_match_parent_links() {
    let reg = HierarchyRegistry::global();
    for spec in TAXONOMY {
        assert_eq!(
            reg.requires_parent(spec.kind),
            Some(spec.requires_parent()),
            "{}",
            spec.kind
        );
    }
}

// ===========================================================================
// Node contract, every kind
// ===========================================================================

#[test]
fn identity_is_subset_of_properties_for_every_kind() {
    for spec in TAXONOMY {
        let node = sample(spec.kind);
        let identity = node.identity();
        let props = node.properties();
        assert_eq!(identity.len(), spec.identity.len(), "{}", spec.kind);
        for (k, v) in &identity {
            assert_eq!(props.get(k), Some(v), "{}.{}", spec.kind, k);
        }
        assert!(props.len() > identity.len() || spec.optional.is_empty());
    }
}

#[test]
fn every_sample_validates_and_resolves_consistently() {
    for spec in TAXONOMY {
        let node = sample(spec.kind);
        validate(&node).unwrap_or_else(|e| panic!("{}: {}", spec.kind, e));

        match spec.parent {
            Some(link) => {
                let parent = node.parent_reference().expect(spec.kind);
                assert_eq!(parent.kind, link.kind);
                assert_eq!(parent.relationship, link.relationship);
                assert_eq!(node.relationship_label(), link.relationship);
                assert_eq!(Some(parent), node.legacy_parent_reference(), "{}", spec.kind);
            }
            None => {
                assert!(node.parent_reference().is_none());
                assert_eq!(node.relationship_label(), "");
            }
        }
    }
}

#[test]
fn identity_is_deterministic() {
    for spec in TAXONOMY {
        assert_eq!(sample(spec.kind).identity(), sample(spec.kind).identity());
        assert_eq!(sample(spec.kind).node_key(), sample(spec.kind).node_key());
    }
}

#[test]
fn per_kind_relationship_labels() {
    let labels: BTreeMap<_, _> = TAXONOMY
        .iter()
        .filter_map(|s| s.parent.map(|l| (s.kind, l.relationship)))
        .collect();
    assert_eq!(labels["port"], "EXPOSED_BY");
    assert_eq!(labels["service"], "LISTENS_ON");
    assert_eq!(labels["endpoint"], "SERVED_BY");
    assert_eq!(labels["container"], "RUNS_ON");
    assert_eq!(labels["agent_run"], "RUN_IN");
    assert_eq!(labels["tool_call"], "INVOKED_DURING");
}

// ===========================================================================
// belongs_to
// ===========================================================================

#[test]
fn belongs_to_twice_last_write_wins() {
    let mut p = port(22, "tcp");
    p.attach_to(&host("10.0.0.1")).unwrap();
    p.attach_to(&host("10.0.0.2")).unwrap();

    let parent = p.parent_reference().unwrap();
    assert_eq!(parent.identity, ip_identity("10.0.0.2"));
    assert_eq!(p.get("host"), Some(&Value::from("10.0.0.2")));
    assert_eq!(p.legacy_parent_reference(), Some(parent));
}

#[test]
fn belongs_to_chains_through_three_levels() {
    let h = host("2001:db8::7");
    let p = port(8443, "tcp").belongs_to(&h).unwrap();
    let s = SchemaNode::new("service")
        .unwrap()
        .with("name", "https")
        .unwrap()
        .belongs_to(&p)
        .unwrap();
    let e = SchemaNode::new("endpoint")
        .unwrap()
        .with("path", "/healthz")
        .unwrap()
        .belongs_to(&s)
        .unwrap()
        .with("status_code", 200)
        .unwrap();

    assert_eq!(s.get("port_key"), Some(&Value::from("2001:db8::7:8443:tcp")));
    assert_eq!(e.get("service_key"), Some(&Value::from("2001:db8::7:8443:tcp:https")));

    let svc_ref = e.parent_reference().unwrap();
    assert_eq!(svc_ref.kind, "service");
    assert_eq!(svc_ref.identity, s.identity());

    let port_ref = s.legacy_parent_reference().unwrap();
    assert_eq!(port_ref.identity, p.identity());
}

#[test]
fn never_attached_child_has_no_parent() {
    let p = port(443, "tcp");
    assert!(p.parent_reference().is_none());
    assert!(p.legacy_parent_reference().is_none());
    assert_eq!(p.relationship_label(), "");
}

#[test]
fn legacy_field_alone_resolves() {
    let p = port(443, "tcp").with("host", "10.0.0.5").unwrap();
    let parent = p.parent_reference().unwrap();
    assert_eq!(parent.kind, "host");
    assert_eq!(parent.identity, ip_identity("10.0.0.5"));
}

#[test]
fn zero_port_parent_is_rejected() {
    let p = port(0, "tcp").belongs_to(&host("10.0.0.5")).unwrap();
    let err = SchemaNode::new("service")
        .unwrap()
        .belongs_to(&p)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParent { .. }));
}

// ===========================================================================
// validate decision table
// ===========================================================================

#[test]
fn root_without_parent_validates() {
    assert!(validate(&host("10.0.0.5")).is_ok());
}

#[test]
fn child_without_parent_fails() {
    let err = validate(&port(443, "tcp")).unwrap_err();
    assert!(matches!(err, Error::MissingParent(_)));
    let msg = err.to_string();
    assert!(msg.contains("port"));
    assert!(msg.contains("requires a parent"));
}

#[test]
fn child_with_undecodable_key_fails_as_missing_parent() {
    let svc = SchemaNode::new("service")
        .unwrap()
        .with("name", "http")
        .unwrap()
        .with("port_key", "10.0.0.5:http")
        .unwrap();
    assert!(matches!(validate(&svc), Err(Error::MissingParent(_))));
}

#[test]
fn unregistered_kind_fails() {
    let n = CustomNode::parse("scanner:finding").unwrap().with_identity("id", "f-1");
    let msg = validate(&n).unwrap_err().to_string();
    assert!(msg.contains("unknown node type"));
    assert!(msg.contains("scanner:finding"));
}

#[test]
fn validate_accepts_records() {
    let p = port(443, "tcp").belongs_to(&host("10.0.0.5")).unwrap();
    assert!(validate(&p.to_record()).is_ok());
}

// ===========================================================================
// End to end
// ===========================================================================

#[test]
fn host_port_scenario() {
    let h = host("10.0.0.5");
    let p = port(443, "tcp").belongs_to(&h).unwrap();

    let parent = p.parent_reference().unwrap();
    assert_eq!(parent.kind, "host");
    assert_eq!(parent.identity, ip_identity("10.0.0.5"));
    assert!(validate(&p).is_ok());

    let orphan = port(443, "tcp");
    let msg = validate(&orphan).unwrap_err().to_string();
    assert!(msg.contains("port"));
    assert!(msg.contains("requires a parent"));
}
