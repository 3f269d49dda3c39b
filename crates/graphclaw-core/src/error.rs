//! Error types for graphclaw

use crate::key::KeyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown node type '{0}': add it to the kind taxonomy and the hierarchy registry")]
    UnknownNodeType(String),

    #[error("node type '{0}' requires a parent: attach one with belongs_to (BelongsTo) before storing it")]
    MissingParent(String),

    #[error("node type '{kind}' is missing identity field '{field}'")]
    MissingIdentity { kind: String, field: String },

    #[error("invalid custom kind '{0}': expected namespace:type")]
    InvalidKind(String),

    #[error("invalid parent for '{kind}': {reason}")]
    InvalidParent { kind: String, reason: String },

    #[error("node type '{kind}' has no field '{field}'")]
    UnknownField { kind: String, field: String },

    #[error("field '{kind}.{field}' expects type {expected}")]
    FieldType {
        kind: String,
        field: String,
        expected: &'static str,
    },

    #[error("key decode error: {0}")]
    KeyDecode(#[from] KeyError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn unknown_node_type(kind: impl Into<String>) -> Self {
        Self::UnknownNodeType(kind.into())
    }

    pub fn missing_parent(kind: impl Into<String>) -> Self {
        Self::MissingParent(kind.into())
    }

    pub fn missing_identity(kind: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingIdentity {
            kind: kind.into(),
            field: field.into(),
        }
    }

    pub fn invalid_parent(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParent {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_field(kind: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            kind: kind.into(),
            field: field.into(),
        }
    }

    /// Validation failures a batch can report per node and keep going.
    /// Builder errors are not in this set.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownNodeType(_) | Self::MissingParent(_) | Self::MissingIdentity { .. }
        )
    }
}
