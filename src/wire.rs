//! Flattens a resolved, possibly cyclic interface graph into a serializable
//! table, and reconstructs an equivalent graph from that table.
//!
//! [`InterfaceDescriptor`]'s own `Serialize` impl only emits an `{id, name}`
//! stub (see its doc comment) so that a naive `serde_json::to_string` on a
//! single descriptor terminates even when the interface refers to itself.
//! `WireSession` is the mechanism that captures the full graph instead: it
//! walks every interface reachable from a root exactly once, recording each
//! one's methods by value, with `Remote` parameters replaced by the
//! referenced interface's id rather than its full descriptor. Reconstruction
//! mints fresh, process-local identifiers and re-interns every parameter
//! through the cache, mirroring a readResolve step.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::IntrospectionError;
use crate::identifier::Identifier;
use crate::runtime::context::IntrospectionContext;
use crate::structs::bitflag::MethodFlags;
use crate::structs::loaded::interface::InterfaceCell;
use crate::structs::loaded::{InterfaceDescriptor, MethodDescriptor, ParamKind, ParameterDescriptor, ValueType};

#[derive(Clone, Debug, Serialize, Deserialize)]
enum WireParamKind {
    Value(ValueType),
    Remote(Identifier),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireParameter {
    kind: WireParamKind,
    dimensions: u32,
    unshared: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireMethod {
    id: Identifier,
    name: String,
    return_type: Option<WireParameter>,
    parameters: Vec<WireParameter>,
    exceptions: Vec<WireParameter>,
    flags: MethodFlags,
    response_timeout_millis: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireInterface {
    id: Identifier,
    name: String,
    methods: Vec<WireMethod>,
}

/// A flattened, acyclic snapshot of one or more interface descriptors,
/// suitable for `serde_json::to_string` / `from_str` without recursion limits.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireSession {
    interfaces: Vec<WireInterface>,
    root: Option<Identifier>,
}

impl WireSession {
    /// Captures `root` and every interface reachable from it, each exactly once.
    pub fn capture(root: &InterfaceDescriptor) -> Self {
        let mut session = WireSession {
            interfaces: Vec::new(),
            root: Some(root.id()),
        };
        let mut seen = HashMap::new();
        session.visit(root, &mut seen);
        session
    }

    fn visit(&mut self, descriptor: &InterfaceDescriptor, seen: &mut HashMap<Identifier, ()>) {
        if seen.insert(descriptor.id(), ()).is_some() {
            return;
        }
        trace!(interface = %descriptor.name(), "capturing interface into wire session");

        let mut wire_methods = Vec::new();
        for method in descriptor.methods() {
            let return_type = method
                .return_type()
                .map(|p| self.visit_parameter(p, seen));
            let parameters = method
                .parameters()
                .iter()
                .map(|p| self.visit_parameter(p, seen))
                .collect();
            let exceptions = method
                .exceptions()
                .iter()
                .map(|p| self.visit_parameter(p, seen))
                .collect();
            wire_methods.push(WireMethod {
                id: method.id(),
                name: method.name().to_string(),
                return_type,
                parameters,
                exceptions,
                flags: flags_of(&method),
                response_timeout_millis: method.response_timeout_millis(),
            });
        }

        self.interfaces.push(WireInterface {
            id: descriptor.id(),
            name: descriptor.name().to_string(),
            methods: wire_methods,
        });
    }

    fn visit_parameter(&mut self, parameter: &ParameterDescriptor, seen: &mut HashMap<Identifier, ()>) -> WireParameter {
        let kind = match parameter.kind() {
            ParamKind::Value(v) => WireParamKind::Value(v.clone()),
            ParamKind::Remote(nested) => {
                self.visit(nested, seen);
                WireParamKind::Remote(nested.id())
            }
        };
        WireParameter {
            kind,
            dimensions: parameter.array_rank(),
            unshared: parameter.is_unshared(),
        }
    }
}

fn flags_of(method: &MethodDescriptor) -> MethodFlags {
    let mut flags = MethodFlags::empty();
    if method.is_asynchronous() {
        flags |= MethodFlags::ASYNCHRONOUS;
    }
    if method.is_idempotent() {
        flags |= MethodFlags::IDEMPOTENT;
    }
    flags
}

/// Rebuilds a graph equivalent to the one `WireSession::capture` was called on:
/// same shape and method content, but with fresh identifiers and parameters
/// re-interned through `ctx`'s cache, exactly as if the interfaces had just
/// been introspected in this process.
pub fn from_wire_session(
    ctx: &IntrospectionContext,
    session: &WireSession,
) -> Result<InterfaceDescriptor, IntrospectionError> {
    let root = session.root.ok_or(IntrospectionError::NotFound)?;

    // Phase 1: mint a provisional cell per wire interface before resolving any
    // method, so a `Remote` reference to an interface not yet fully resolved
    // (the cyclic case) can still be linked to a stable handle.
    let mut cells: HashMap<Identifier, Arc<InterfaceCell>> = HashMap::with_capacity(session.interfaces.len());
    for wire_iface in &session.interfaces {
        let cell = InterfaceCell::new_provisional(Identifier::fresh(), wire_iface.name.clone());
        cells.insert(wire_iface.id, cell);
    }

    for wire_iface in &session.interfaces {
        let cell = cells
            .get(&wire_iface.id)
            .expect("every wire interface was given a provisional cell in phase 1");

        let mut methods = Vec::with_capacity(wire_iface.methods.len());
        for wire_method in &wire_iface.methods {
            let return_type = wire_method
                .return_type
                .as_ref()
                .map(|p| rebuild_parameter(ctx, &cells, p))
                .transpose()?;
            let parameters = wire_method
                .parameters
                .iter()
                .map(|p| rebuild_parameter(ctx, &cells, p))
                .collect::<Result<_, _>>()?;
            let exceptions = wire_method
                .exceptions
                .iter()
                .map(|p| rebuild_parameter(ctx, &cells, p))
                .collect::<Result<_, _>>()?;

            methods.push(MethodDescriptor::new(
                Identifier::fresh(),
                wire_method.name.clone(),
                return_type,
                parameters,
                exceptions,
                wire_method.flags,
                wire_method.response_timeout_millis,
            ));
        }

        cell.publish(methods);
    }

    cells
        .get(&root)
        .cloned()
        .map(InterfaceDescriptor)
        .ok_or(IntrospectionError::NotFound)
}

fn rebuild_parameter(
    ctx: &IntrospectionContext,
    cells: &HashMap<Identifier, Arc<InterfaceCell>>,
    wire: &WireParameter,
) -> Result<ParameterDescriptor, IntrospectionError> {
    let kind = match &wire.kind {
        WireParamKind::Value(v) => ParamKind::Value(v.clone()),
        WireParamKind::Remote(id) => {
            let cell = cells.get(id).cloned().ok_or(IntrospectionError::NotFound)?;
            ParamKind::Remote(InterfaceDescriptor(cell))
        }
    };
    let descriptor = ParameterDescriptor::new(kind, wire.dimensions, wire.unshared);
    Ok(ctx.cache.intern_parameter(descriptor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Schema, SchemaRegistry};
    use crate::runtime::introspector::examine;

    fn sample_registry() -> SchemaRegistry {
        let json = r#"{
            "interfaces": [
                {
                    "name": "Greeter",
                    "supertypes": ["Remote"],
                    "methods": [
                        {
                            "name": "greet",
                            "parameters": [{"name": "string"}],
                            "return_type": {"name": "string"},
                            "exceptions": ["RemoteFailure"]
                        }
                    ]
                }
            ],
            "exceptions": { "parents": {} }
        }"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        SchemaRegistry::from_schema(schema)
    }

    #[test]
    fn round_trips_a_simple_interface_through_a_wire_session() {
        let ctx = IntrospectionContext::new();
        let registry = sample_registry();
        let source = registry.interface("Greeter").unwrap();
        let original = examine(&ctx, &registry, Some(&source)).unwrap();

        let session = WireSession::capture(&original);
        let rebuilt_ctx = IntrospectionContext::new();
        let rebuilt = from_wire_session(&rebuilt_ctx, &session).unwrap();

        assert_eq!(rebuilt.name(), original.name());
        assert_eq!(rebuilt.methods().len(), original.methods().len());
        assert_eq!(rebuilt.methods()[0].name(), "greet");
    }
}
