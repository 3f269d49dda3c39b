//! graphclaw schema - kind taxonomy, schema-driven nodes, hierarchy validation
//!
//! Every kind in [`taxonomy::TAXONOMY`] is served by the one generic
//! [`SchemaNode`]. Kinds outside the taxonomy go through [`CustomNode`].
//! [`validate`] is the gate every node passes before it is stored.

pub mod custom;
pub mod node;
pub mod registry;
pub mod taxonomy;

pub use custom::{is_namespaced, CustomNode};
pub use node::SchemaNode;
pub use registry::{validate, HierarchyRegistry, ValidationPolicy, REQUIRES_PARENT};
pub use taxonomy::{kind_spec, FieldSpec, FieldType, KeyCodec, KindSpec, ParentLink, TAXONOMY};
