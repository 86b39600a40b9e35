//! Error kinds surfaced by introspection.
//!
//! Mirrors the shape of a classic rich-context error enum: one variant per failure
//! family, each carrying the context needed to diagnose without re-deriving it from
//! logs (method signature, conflicting annotation name, ...).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntrospectionError {
    #[error("candidate interface reference was absent")]
    NullInput,

    #[error("interface '{interface}' is malformed: {reason}")]
    MalformedInterface { interface: String, reason: String },

    #[error("no method matching the given key was found")]
    NotFound,
}

impl IntrospectionError {
    pub(crate) fn malformed(interface: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInterface {
            interface: interface.into(),
            reason: reason.into(),
        }
    }
}
