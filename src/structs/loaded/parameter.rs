//! The final, canonically-interned parameter representation. See
//! [`crate::runtime::cache::IdentityCache`] for the interning rules.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::structs::loaded::interface::InterfaceDescriptor;

/// A serialized-type handle: an opaque name for whatever the transport's codec
/// uses to marshal a value-kind parameter. Array rank is tracked separately on
/// the owning [`ParameterDescriptor`], not folded into the handle itself.
///
/// `Deserialize` is safe to derive here: a value type has no embedded identity
/// to reconcile against a cache. The same is not true of [`ParamKind`] as a
/// whole, see its doc comment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueType(Arc<str>);

impl ValueType {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// No `Deserialize`: a `Remote` variant embeds a live, possibly self-referential
// `InterfaceDescriptor` handle, which only exists meaningfully inside an
// `IdentityCache`. Reconstructing one from a bare wire form requires resolving
// the embedded reference through a registry, which `crate::wire::WireSession`
// does explicitly; a derived `Deserialize` here would silently produce
// descriptors that never got canonically interned.
#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumAsInner, Serialize)]
pub enum ParamKind {
    Value(ValueType),
    Remote(InterfaceDescriptor),
}

#[derive(Clone, Serialize)]
pub struct ParameterDescriptor(Arc<ParameterDescriptorData>);

#[derive(Serialize)]
struct ParameterDescriptorData {
    kind: ParamKind,
    dimensions: u32,
    unshared: bool,
}

impl PartialEq for ParameterDescriptorData {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions == other.dimensions && self.unshared == other.unshared && self.kind == other.kind
    }
}
impl Eq for ParameterDescriptorData {}

impl Hash for ParameterDescriptorData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dimensions.hash(state);
        self.unshared.hash(state);
        self.kind.hash(state);
    }
}

impl PartialEq for ParameterDescriptor {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}
impl Eq for ParameterDescriptor {}

impl Hash for ParameterDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDescriptor")
            .field("kind", &self.0.kind)
            .field("dimensions", &self.0.dimensions)
            .field("unshared", &self.0.unshared)
            .finish()
    }
}

impl ParameterDescriptor {
    pub fn new(kind: ParamKind, dimensions: u32, unshared: bool) -> Self {
        Self(Arc::new(ParameterDescriptorData {
            kind,
            dimensions,
            unshared,
        }))
    }

    pub fn is_remote(&self) -> bool {
        self.0.kind.is_remote()
    }

    pub fn remote_type(&self) -> Option<&InterfaceDescriptor> {
        self.0.kind.as_remote()
    }

    pub fn serialized_type(&self) -> Option<&ValueType> {
        self.0.kind.as_value()
    }

    pub fn array_rank(&self) -> u32 {
        self.0.dimensions
    }

    pub fn is_unshared(&self) -> bool {
        self.0.unshared
    }

    pub fn kind(&self) -> &ParamKind {
        &self.0.kind
    }

    /// Returns a descriptor identical to this one but for the unshared flag.
    /// Callers must pass the result through [`crate::runtime::cache::IdentityCache::intern_parameter`]
    /// to get the canonical instance back; this constructor alone does not intern.
    pub fn with_unshared_uninterned(&self, unshared: bool) -> Self {
        if self.0.unshared == unshared {
            return self.clone();
        }
        Self::new(self.0.kind.clone(), self.0.dimensions, unshared)
    }

    /// True iff `self` and `other` would serialize under the same wire type: same
    /// kind variant, same underlying value type or remote interface identity, and
    /// same array rank. Ignores the unshared flag.
    pub fn same_serialized_type(&self, other: &Self) -> bool {
        if self.0.dimensions != other.0.dimensions {
            return false;
        }
        match (&self.0.kind, &other.0.kind) {
            (ParamKind::Value(a), ParamKind::Value(b)) => a == b,
            (ParamKind::Remote(a), ParamKind::Remote(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_parameters_compare_by_content() {
        let a = ParameterDescriptor::new(ParamKind::Value(ValueType::new("int")), 0, true);
        let b = ParameterDescriptor::new(ParamKind::Value(ValueType::new("int")), 0, true);
        assert_eq!(a, b);
    }

    #[test]
    fn dimensions_distinguish_otherwise_equal_descriptors() {
        let scalar = ParameterDescriptor::new(ParamKind::Value(ValueType::new("int")), 0, true);
        let array = ParameterDescriptor::new(ParamKind::Value(ValueType::new("int")), 1, true);
        assert_ne!(scalar, array);
        assert!(!scalar.same_serialized_type(&array));
    }
}
