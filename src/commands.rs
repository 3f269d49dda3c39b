//! What the `graphclaw` subcommands do, kept apart from argument parsing so
//! the integration tests can drive them directly.

use crate::config::GraphclawConfig;
use anyhow::Context;
use graphclaw_discovery::{Batch, Rejected, WireBatch};
use graphclaw_schema::taxonomy::{self, KindSpec, TAXONOMY};
use std::fmt::Write;

/// The kind tree, roots first, one kind per line.
pub fn render_taxonomy() -> String {
    let mut out = String::new();
    for spec in TAXONOMY.iter().filter(|s| !s.requires_parent()) {
        render_kind(&mut out, spec, 0);
    }
    out
}

fn render_kind(out: &mut String, spec: &KindSpec, depth: usize) {
    let indent = "  ".repeat(depth);
    let identity: Vec<&str> = spec.identity.iter().map(|f| f.name).collect();
    match spec.parent {
        Some(link) => {
            let _ = writeln!(
                out,
                "{}[C] {} ({}) -[{}]-> {} key={} identity={}",
                indent,
                spec.kind,
                spec.name,
                link.relationship,
                link.kind,
                link.key_field,
                identity.join(",")
            );
        }
        None => {
            let _ = writeln!(
                out,
                "{}[R] {} ({}) identity={}",
                indent,
                spec.kind,
                spec.name,
                identity.join(",")
            );
        }
    }
    for child in taxonomy::children_of(spec.kind) {
        render_kind(out, child, depth + 1);
    }
}

/// Accepts `{"entities": [...]}` or a bare array of entities.
pub fn parse_wire(text: &str) -> anyhow::Result<WireBatch> {
    let raw: serde_json::Value = serde_json::from_str(text).context("batch is not valid JSON")?;
    let batch = if raw.is_array() {
        WireBatch {
            entities: serde_json::from_value(raw).context("invalid entity list")?,
        }
    } else {
        serde_json::from_value(raw).context("invalid batch document")?
    };
    Ok(batch)
}

/// Convert, validate and order a wire batch. Rejections (conversion or
/// validation) carry the entity's position in the input.
pub fn assemble(wire: WireBatch, config: &GraphclawConfig) -> Batch {
    let mut agg = config.aggregator();
    let mut positions = Vec::with_capacity(wire.entities.len());
    let mut unconverted = Vec::new();

    for (index, entity) in wire.entities.into_iter().enumerate() {
        let kind = entity.kind().to_string();
        match agg.push_wire(entity) {
            Ok(()) => positions.push(index),
            Err(e) => {
                tracing::warn!(index, kind = %kind, "entity not converted: {}", e);
                unconverted.push(Rejected {
                    index,
                    kind,
                    reason: e.to_string(),
                });
            }
        }
    }

    let mut batch = agg.finish();
    for r in &mut batch.rejected {
        r.index = positions[r.index];
    }
    batch.rejected.extend(unconverted);
    batch.rejected.sort_by_key(|r| r.index);
    batch
}

pub fn render_report(batch: &Batch) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "batch {}: {} accepted, {} rejected",
        batch.id,
        batch.nodes.len(),
        batch.rejected.len()
    );
    for (kind, count) in batch.summary() {
        let _ = writeln!(out, "  {:<20} {}", kind, count);
    }
    for r in &batch.rejected {
        let _ = writeln!(out, "  #{} {}: {}", r.index, r.kind, r.reason);
    }
    out
}

pub fn render_plan(batch: &Batch, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(batch)?
    } else {
        serde_json::to_string(batch)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_tree_nests_children() {
        let tree = render_taxonomy();
        assert!(tree.starts_with("[R] host (Host) identity=ip\n"));
        assert!(tree.contains("\n  [C] port (Port) -[EXPOSED_BY]-> host key=host"));
        assert!(tree.contains("\n    [C] service (Service) -[LISTENS_ON]-> port key=port_key"));
        assert_eq!(tree.lines().count(), TAXONOMY.len());
    }

    #[test]
    fn bare_array_and_document_both_parse() {
        let arr = parse_wire(r#"[{"type": "host", "ip": "10.0.0.5"}]"#).unwrap();
        let doc = parse_wire(r#"{"entities": [{"type": "host", "ip": "10.0.0.5"}]}"#).unwrap();
        assert_eq!(arr.entities.len(), 1);
        assert_eq!(doc.entities.len(), 1);
        assert!(parse_wire("{not json").is_err());
        assert!(parse_wire(r#"[{"type": "router"}]"#).is_err());
    }
}
