//! graphclaw core - node contract, property values, composite keys, errors

pub mod error;
pub mod key;
pub mod node;
pub mod value;

pub use error::{Error, Result};
pub use key::{KeyError, PortKey, ServiceKey};
pub use node::{GraphNode, NodeKey, NodeRecord, NodeRef};
pub use value::{Identity, Properties, Value};
