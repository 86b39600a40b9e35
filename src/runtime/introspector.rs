//! The introspection entry point: validates a candidate interface, merges
//! overrides inherited through multiple interface extension, publishes a
//! provisional descriptor so self-reference can terminate, then resolves
//! every parameter to its final, canonically-interned form.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::error::IntrospectionError;
use crate::model::{self, ExceptionHierarchy, SchemaRegistry, SourceInterface};
use crate::runtime::context::IntrospectionContext;
use crate::structs::bitflag::MethodFlags;
use crate::structs::loaded::interface::InterfaceCell;
use crate::structs::loaded::{InterfaceDescriptor, MethodDescriptor, ParamKind, ParameterDescriptor, ValueType};
use crate::structs::raw::method::MethodKey;
use crate::structs::raw::{RawMethod, RawParameter};
use crate::identifier::Identifier;

/// Validates `source`, merges its inherited overrides, and returns the
/// canonical, resolved descriptor. Cache hits on an interface already
/// introspected in this context return the same descriptor without
/// re-validating.
pub fn examine(
    ctx: &IntrospectionContext,
    registry: &SchemaRegistry,
    source: Option<&Arc<SourceInterface>>,
) -> Result<InterfaceDescriptor, IntrospectionError> {
    let source = source.ok_or(IntrospectionError::NullInput)?;

    // Held for the entire validate-merge-publish-resolve duration. Recursive
    // `examine` calls made while resolving parameters happen on the same
    // thread and reenter this same reentrant monitor instantly.
    let _guard = ctx.cache.lock();

    if let Some(existing) = ctx.cache.get_interface(source) {
        ctx.cache.record_cache_hit();
        trace!(interface = %source.name, "identity cache hit");
        return Ok(existing);
    }

    ctx.cache.record_validation();
    debug!(interface = %source.name, "introspecting interface");

    validate_shape(registry, source)?;

    let merged = collect_visible_raw_methods(registry, source)?;
    for method in &merged {
        validate_merged_method(registry, source, method)?;
    }

    let id = Identifier::fresh();
    let cell = InterfaceCell::new_provisional(id, source.name.clone());
    ctx.cache.put_interface(source, cell.clone());
    info!(interface = %source.name, methods = merged.len(), "published provisional interface descriptor");

    match resolve(ctx, registry, &cell, merged) {
        Ok(()) => {
            info!(interface = %source.name, "resolve finished");
            Ok(InterfaceDescriptor(cell))
        }
        Err(err) => {
            warn!(interface = %source.name, error = %err, "resolve failed, evicting provisional entry");
            ctx.cache.remove_interface(source);
            Err(err)
        }
    }
}

fn validate_shape(registry: &SchemaRegistry, source: &SourceInterface) -> Result<(), IntrospectionError> {
    if !source.is_interface {
        return Err(IntrospectionError::malformed(&source.name, "not an interface"));
    }
    if !source.public {
        return Err(IntrospectionError::malformed(&source.name, "not publicly visible"));
    }
    if !registry.extends_remote_marker(source) {
        return Err(IntrospectionError::malformed(
            &source.name,
            format!("does not transitively extend {}", model::ROOT_REMOTE_MARKER),
        ));
    }
    Ok(())
}

/// Gathers every method visible on `source` - declared or inherited through
/// interface extension - merging overrides with identical `(name, signature)`
/// as they're encountered. Supertypes are visited before the interface's own
/// declarations so that a local override is merged against its inherited
/// siblings, not the other way around.
fn collect_visible_raw_methods(
    registry: &SchemaRegistry,
    source: &SourceInterface,
) -> Result<Vec<RawMethod>, IntrospectionError> {
    let mut accumulator: Vec<(MethodKey, RawMethod)> = Vec::new();
    collect_into(registry, source, &mut accumulator, &mut HashSet::new())?;
    Ok(accumulator.into_iter().map(|(_, m)| m).collect())
}

fn collect_into(
    registry: &SchemaRegistry,
    source: &SourceInterface,
    accumulator: &mut Vec<(MethodKey, RawMethod)>,
    visited_interfaces: &mut HashSet<String>,
) -> Result<(), IntrospectionError> {
    if !visited_interfaces.insert(source.name.clone()) {
        return Ok(());
    }

    for supertype_name in &source.supertypes {
        if let Some(parent) = registry.interface(supertype_name) {
            collect_into(registry, &parent, accumulator, visited_interfaces)?;
        }
    }

    for method in &source.methods {
        let raw = RawMethod::from_source(method);
        merge_one(registry.exceptions(), &source.name, accumulator, raw)?;
    }

    Ok(())
}

fn merge_one(
    hierarchy: &ExceptionHierarchy,
    interface_name: &str,
    accumulator: &mut Vec<(MethodKey, RawMethod)>,
    incoming: RawMethod,
) -> Result<(), IntrospectionError> {
    let key = incoming.key();
    if let Some((_, existing)) = accumulator.iter_mut().find(|(k, _)| *k == key) {
        if existing.structurally_equal(&incoming) {
            return Ok(());
        }
        *existing = intersect(hierarchy, interface_name, existing, &incoming)?;
    } else {
        accumulator.push((key, incoming));
    }
    Ok(())
}

/// Implements the merge intersect rule: names/parameters/return already agree
/// (same key); behavioral flags must also agree exactly, and the exception set
/// becomes the mutual intersection (keeping `e` iff each side declares `e` or
/// a supertype of `e`).
fn intersect(
    hierarchy: &ExceptionHierarchy,
    interface_name: &str,
    existing: &RawMethod,
    incoming: &RawMethod,
) -> Result<RawMethod, IntrospectionError> {
    let conflict = |annotation: &str| {
        IntrospectionError::malformed(
            interface_name,
            format!(
                "method '{}' overrides disagree on '{annotation}'",
                existing.signature_string()
            ),
        )
    };

    if existing.flags.contains(MethodFlags::ASYNCHRONOUS) != incoming.flags.contains(MethodFlags::ASYNCHRONOUS) {
        return Err(conflict("asynchronous"));
    }
    if existing.flags.contains(MethodFlags::IDEMPOTENT) != incoming.flags.contains(MethodFlags::IDEMPOTENT) {
        return Err(conflict("idempotent"));
    }
    if existing.response_timeout_millis != incoming.response_timeout_millis {
        return Err(conflict("responseTimeout"));
    }

    let mut exceptions = Vec::new();
    for candidate in existing.exceptions.iter().chain(incoming.exceptions.iter()) {
        if exceptions.contains(candidate) {
            continue;
        }
        let left_covers = existing
            .exceptions
            .iter()
            .any(|e| hierarchy.is_supertype_or_equal(e, candidate));
        let right_covers = incoming
            .exceptions
            .iter()
            .any(|e| hierarchy.is_supertype_or_equal(e, candidate));
        if left_covers && right_covers {
            exceptions.push(candidate.clone());
        }
    }

    Ok(RawMethod {
        id: existing.id,
        name: existing.name.clone(),
        return_type: existing.return_type.clone(),
        parameters: existing.parameters.clone(),
        exceptions,
        flags: existing.flags,
        response_timeout_millis: existing.response_timeout_millis,
    })
}

/// Rules 2 and 3 from input validation, applied to the fully merged view of
/// each visible method (so an override arriving through multiple parents is
/// checked once, after intersection, rather than once per declaring parent).
fn validate_merged_method(
    registry: &SchemaRegistry,
    source: &SourceInterface,
    method: &RawMethod,
) -> Result<(), IntrospectionError> {
    let declares_remote_failure = method
        .exceptions
        .iter()
        .any(|e| registry.exceptions().is_supertype_or_equal(e, model::REMOTE_FAILURE));
    if !declares_remote_failure {
        return Err(IntrospectionError::malformed(
            &source.name,
            format!(
                "method '{}' does not declare {}",
                method.signature_string(),
                model::REMOTE_FAILURE
            ),
        ));
    }

    if method.flags.contains(MethodFlags::ASYNCHRONOUS) {
        if method.return_type.is_some() {
            return Err(IntrospectionError::malformed(
                &source.name,
                format!(
                    "asynchronous method '{}' must return void",
                    method.signature_string()
                ),
            ));
        }
        let only_remote_failure = method
            .exceptions
            .iter()
            .all(|e| registry.exceptions().is_supertype_or_equal(model::REMOTE_FAILURE, e));
        if !only_remote_failure {
            return Err(IntrospectionError::malformed(
                &source.name,
                format!(
                    "asynchronous method '{}' throws a non-remote exception",
                    method.signature_string()
                ),
            ));
        }
    }

    Ok(())
}

/// Replaces every temporary parameter with its final, canonically-interned
/// form and writes the resulting method list into `cell`.
fn resolve(
    ctx: &IntrospectionContext,
    registry: &SchemaRegistry,
    cell: &Arc<InterfaceCell>,
    raw_methods: Vec<RawMethod>,
) -> Result<(), IntrospectionError> {
    let mut resolved = Vec::with_capacity(raw_methods.len());

    for raw in raw_methods {
        let return_type = match &raw.return_type {
            Some(r) => Some(classify(ctx, registry, r)?),
            None => None,
        };

        let classified_parameters: Vec<ParameterDescriptor> = raw
            .parameters
            .iter()
            .map(|p| classify(ctx, registry, p))
            .collect::<Result<_, _>>()?;
        let swept = sweep_unshared(classified_parameters);
        let parameters: Vec<ParameterDescriptor> = swept
            .into_iter()
            .map(|p| ctx.cache.intern_parameter(p))
            .collect();

        let exceptions: Vec<ParameterDescriptor> = raw
            .exceptions
            .iter()
            .map(|name| {
                let value = classify_value(name, 0);
                ctx.cache.intern_parameter(value)
            })
            .collect();

        let return_type = match return_type {
            Some(r) => Some(ctx.cache.intern_parameter(r)),
            None => None,
        };

        resolved.push(MethodDescriptor::new(
            raw.id,
            raw.name,
            return_type,
            parameters,
            exceptions,
            raw.flags,
            raw.response_timeout_millis,
        ));
    }

    cell.publish(resolved);
    Ok(())
}

fn classify(
    ctx: &IntrospectionContext,
    registry: &SchemaRegistry,
    raw: &RawParameter,
) -> Result<ParameterDescriptor, IntrospectionError> {
    if let Some(nested) = registry.interface(&raw.type_name) {
        let resolved = examine(ctx, registry, Some(&nested))?;
        Ok(ParameterDescriptor::new(
            ParamKind::Remote(resolved),
            raw.dimensions,
            true,
        ))
    } else {
        Ok(classify_value(&raw.type_name, raw.dimensions))
    }
}

fn classify_value(type_name: &str, dimensions: u32) -> ParameterDescriptor {
    let unshared = model::is_primitive_like(type_name);
    ParameterDescriptor::new(ParamKind::Value(ValueType::new(type_name)), dimensions, unshared)
}

/// The unshared-classification sweep from the resolve pass: if any parameter
/// is not provisionally unshared, every parameter in the list becomes shared;
/// otherwise, parameters that share a serialized type with a later sibling
/// become shared (and the sibling is rewritten in place as a memo).
fn sweep_unshared(mut parameters: Vec<ParameterDescriptor>) -> Vec<ParameterDescriptor> {
    let any_provisionally_shared = parameters.iter().any(|p| !p.is_unshared());
    if any_provisionally_shared {
        return parameters
            .into_iter()
            .map(|p| p.with_unshared_uninterned(false))
            .collect();
    }

    for i in 0..parameters.len() {
        if !parameters[i].is_unshared() {
            continue;
        }
        for j in (i + 1)..parameters.len() {
            if parameters[i].same_serialized_type(&parameters[j]) {
                parameters[i] = parameters[i].with_unshared_uninterned(false);
                parameters[j] = parameters[j].with_unshared_uninterned(false);
            }
        }
    }

    parameters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Schema;
    use tracing_test::traced_test;

    fn registry_with_ping() -> SchemaRegistry {
        let json = r#"{
            "interfaces": [{
                "name": "Ping",
                "supertypes": ["Remote"],
                "methods": [{ "name": "ping", "exceptions": ["RemoteFailure"] }]
            }]
        }"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        SchemaRegistry::from_schema(schema)
    }

    #[traced_test]
    #[test]
    fn examine_logs_the_publish_event() {
        let ctx = IntrospectionContext::new();
        let registry = registry_with_ping();
        let source = registry.interface("Ping").unwrap();

        examine(&ctx, &registry, Some(&source)).unwrap();

        assert!(logs_contain("published provisional interface descriptor"));
    }

    #[test]
    fn null_input_yields_the_null_input_error() {
        let ctx = IntrospectionContext::new();
        let registry = registry_with_ping();
        assert_eq!(examine(&ctx, &registry, None), Err(IntrospectionError::NullInput));
    }
}
