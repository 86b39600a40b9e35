//! The final, resolved interface descriptor. Built by [`crate::runtime::introspector`]
//! and owned thereafter by the [`crate::runtime::cache::IdentityCache`].

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use tracing::trace;

use crate::error::IntrospectionError;
use crate::identifier::Identifier;
use crate::structs::loaded::method::MethodDescriptor;
use crate::structs::loaded::parameter::ParameterDescriptor;

/// Backing storage for an [`InterfaceDescriptor`]. Lives behind an `Arc` so a
/// `Remote` parameter can hold a handle to an interface still being resolved
/// (the self-referential case): the handle is stable the moment it's published,
/// even though `methods` is only filled in once `resolve` finishes.
pub(crate) struct InterfaceCell {
    pub id: Identifier,
    pub name: String,
    pub methods: RwLock<Vec<MethodDescriptor>>,
    by_name: RwLock<Option<HashMap<String, Vec<MethodDescriptor>>>>,
    by_id: RwLock<Option<HashMap<Identifier, MethodDescriptor>>>,
}

impl InterfaceCell {
    pub(crate) fn new_provisional(id: Identifier, name: String) -> Arc<Self> {
        Arc::new(Self {
            id,
            name,
            methods: RwLock::new(Vec::new()),
            by_name: RwLock::new(None),
            by_id: RwLock::new(None),
        })
    }

    pub(crate) fn publish(&self, methods: Vec<MethodDescriptor>) {
        *self.methods.write() = methods;
        // Indices are rebuilt lazily; stale memoized indices from a previous
        // (impossible, since ids are never reused) resolve would be wrong, so
        // clear them defensively.
        *self.by_name.write() = None;
        *self.by_id.write() = None;
    }
}

/// A cheap handle to an [`InterfaceCell`]. Clones share the same underlying cell.
#[derive(Clone)]
pub struct InterfaceDescriptor(pub(crate) Arc<InterfaceCell>);

impl InterfaceDescriptor {
    pub fn id(&self) -> Identifier {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn methods(&self) -> Vec<MethodDescriptor> {
        self.0.methods.read().clone()
    }

    pub fn methods_by_name(&self, name: &str) -> Vec<MethodDescriptor> {
        {
            let guard = self.0.by_name.read();
            if let Some(index) = guard.as_ref() {
                return index.get(name).cloned().unwrap_or_default();
            }
        }
        let index = self.build_by_name();
        let result = index.get(name).cloned().unwrap_or_default();
        *self.0.by_name.write() = Some(index);
        result
    }

    pub fn method_by_id(&self, id: Identifier) -> Result<MethodDescriptor, IntrospectionError> {
        {
            let guard = self.0.by_id.read();
            if let Some(index) = guard.as_ref() {
                return index.get(&id).cloned().ok_or(IntrospectionError::NotFound);
            }
        }
        let index = self.build_by_id();
        let result = index.get(&id).cloned().ok_or(IntrospectionError::NotFound);
        *self.0.by_id.write() = Some(index);
        result
    }

    /// Matches by exact, order-sensitive parameter-descriptor equality.
    pub fn find_method(
        &self,
        name: &str,
        parameter_types: &[ParameterDescriptor],
    ) -> Result<MethodDescriptor, IntrospectionError> {
        self.methods_by_name(name)
            .into_iter()
            .find(|m| m.parameters() == parameter_types)
            .ok_or(IntrospectionError::NotFound)
    }

    fn build_by_name(&self) -> HashMap<String, Vec<MethodDescriptor>> {
        trace!(interface = %self.name(), "building methods-by-name index");
        let mut index: HashMap<String, Vec<MethodDescriptor>> = HashMap::new();
        for method in self.0.methods.read().iter() {
            index.entry(method.name().to_string()).or_default().push(method.clone());
        }
        index
    }

    fn build_by_id(&self) -> HashMap<Identifier, MethodDescriptor> {
        trace!(interface = %self.name(), "building methods-by-id index");
        self.0
            .methods
            .read()
            .iter()
            .map(|m| (m.id(), m.clone()))
            .collect()
    }
}

// Equality and hashing are defined purely in terms of the identifier (plus name,
// matching the spec's `(name, id, methods)` tuple) so that a cyclic method graph
// never has to be compared or hashed structurally: the identifier is assigned
// once per introspection and is by construction the same for every handle to the
// same descriptor, so it already implies method-set equality.
impl PartialEq for InterfaceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id && self.0.name == other.0.name
    }
}
impl Eq for InterfaceDescriptor {}

impl Hash for InterfaceDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
        self.0.name.hash(state);
    }
}

impl fmt::Debug for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceDescriptor")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .finish()
    }
}

// Deliberately a reference stub: `{id, name}` only. Embedding the full method
// list here would recurse forever for a self-referential interface. The full
// content is captured once per distinct id by `crate::wire::WireSession`.
impl Serialize for InterfaceDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("InterfaceDescriptor", 2)?;
        state.serialize_field("id", &self.id())?;
        state.serialize_field("name", &self.name())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_identifier_based() {
        let cell = InterfaceCell::new_provisional(Identifier::fresh(), "P".to_string());
        let a = InterfaceDescriptor(cell.clone());
        let b = InterfaceDescriptor(cell);
        assert_eq!(a, b);
    }
}
