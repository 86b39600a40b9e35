use remote_introspect::error::IntrospectionError;
use remote_introspect::model::{Schema, SchemaRegistry};
use remote_introspect::runtime::context::IntrospectionContext;
use remote_introspect::runtime::introspector::examine;

fn registry_from(json: &str) -> SchemaRegistry {
    let schema: Schema = serde_json::from_str(json).expect("fixture schema must parse");
    SchemaRegistry::from_schema(schema)
}

#[test]
fn s1_minimal_valid_interface() {
    let registry = registry_from(
        r#"{
            "interfaces": [{
                "name": "Ping",
                "supertypes": ["Remote"],
                "methods": [{
                    "name": "ping",
                    "return_type": { "name": "int" },
                    "exceptions": ["RemoteFailure"]
                }]
            }]
        }"#,
    );
    let ctx = IntrospectionContext::new();
    let source = registry.interface("Ping").unwrap();
    let descriptor = examine(&ctx, &registry, Some(&source)).unwrap();

    let methods = descriptor.methods();
    assert_eq!(methods.len(), 1);
    let ping = &methods[0];
    assert_eq!(ping.name(), "ping");
    assert!(ping.parameters().is_empty());
    assert_eq!(ping.return_type().unwrap().serialized_type().unwrap().name(), "int");
    assert!(!ping.is_asynchronous());
    assert!(!ping.is_idempotent());
    assert_eq!(ping.response_timeout_millis(), -1);
}

#[test]
fn s2_missing_mandatory_exception_is_rejected() {
    let registry = registry_from(
        r#"{
            "interfaces": [{
                "name": "Broken",
                "supertypes": ["Remote"],
                "methods": [{ "name": "work" }]
            }]
        }"#,
    );
    let ctx = IntrospectionContext::new();
    let source = registry.interface("Broken").unwrap();
    let err = examine(&ctx, &registry, Some(&source)).unwrap_err();
    match err {
        IntrospectionError::MalformedInterface { reason, .. } => {
            assert!(reason.contains("work"));
        }
        other => panic!("expected MalformedInterface, got {other:?}"),
    }
}

#[test]
fn s3_asynchronous_method_must_return_void() {
    let registry = registry_from(
        r#"{
            "interfaces": [{
                "name": "Ticker",
                "supertypes": ["Remote"],
                "methods": [{
                    "name": "tick",
                    "return_type": { "name": "int" },
                    "exceptions": ["RemoteFailure"],
                    "annotations": { "asynchronous": true }
                }]
            }]
        }"#,
    );
    let ctx = IntrospectionContext::new();
    let source = registry.interface("Ticker").unwrap();
    let err = examine(&ctx, &registry, Some(&source)).unwrap_err();
    assert!(matches!(err, IntrospectionError::MalformedInterface { .. }));
}

#[test]
fn s4_multiple_inheritance_intersects_exceptions() {
    let registry = registry_from(
        r#"{
            "interfaces": [
                {
                    "name": "A",
                    "supertypes": ["Remote"],
                    "methods": [{ "name": "op", "exceptions": ["RemoteFailure", "IOException"] }]
                },
                {
                    "name": "B",
                    "supertypes": ["Remote"],
                    "methods": [{ "name": "op", "exceptions": ["RemoteFailure", "SQLException"] }]
                },
                {
                    "name": "C",
                    "supertypes": ["A", "B", "Remote"],
                    "methods": []
                }
            ]
        }"#,
    );
    let ctx = IntrospectionContext::new();
    let source = registry.interface("C").unwrap();
    let descriptor = examine(&ctx, &registry, Some(&source)).unwrap();

    let op = descriptor.methods_by_name("op");
    assert_eq!(op.len(), 1);
    let exception_names: Vec<&str> = op[0]
        .exceptions()
        .iter()
        .map(|e| e.serialized_type().unwrap().name())
        .collect();
    assert_eq!(exception_names, vec!["RemoteFailure"]);
}

#[test]
fn s5_annotation_conflict_under_inheritance_is_rejected() {
    let registry = registry_from(
        r#"{
            "interfaces": [
                {
                    "name": "A",
                    "supertypes": ["Remote"],
                    "methods": [{
                        "name": "op",
                        "exceptions": ["RemoteFailure"],
                        "annotations": { "idempotent": true }
                    }]
                },
                {
                    "name": "B",
                    "supertypes": ["Remote"],
                    "methods": [{ "name": "op", "exceptions": ["RemoteFailure"] }]
                },
                {
                    "name": "C",
                    "supertypes": ["A", "B", "Remote"],
                    "methods": []
                }
            ]
        }"#,
    );
    let ctx = IntrospectionContext::new();
    let source = registry.interface("C").unwrap();
    let err = examine(&ctx, &registry, Some(&source)).unwrap_err();
    match err {
        IntrospectionError::MalformedInterface { reason, .. } => {
            assert!(reason.contains("idempotent"));
        }
        other => panic!("expected MalformedInterface, got {other:?}"),
    }
}

#[test]
fn s6_self_referential_interface_terminates_and_canonicalizes() {
    let registry = registry_from(
        r#"{
            "interfaces": [{
                "name": "LinkedNode",
                "supertypes": ["Remote"],
                "methods": [{
                    "name": "next",
                    "return_type": { "name": "LinkedNode" },
                    "exceptions": ["RemoteFailure"]
                }]
            }]
        }"#,
    );
    let ctx = IntrospectionContext::new();
    let source = registry.interface("LinkedNode").unwrap();
    let descriptor = examine(&ctx, &registry, Some(&source)).unwrap();

    let next = descriptor.find_method("next", &[]).unwrap();
    let returned = next.return_type().unwrap().remote_type().unwrap();
    assert_eq!(returned, &descriptor);

    let second = examine(&ctx, &registry, Some(&source)).unwrap();
    assert_eq!(second, descriptor);
}

#[test]
fn caching_performs_validation_at_most_once_per_interface() {
    let registry = registry_from(
        r#"{
            "interfaces": [{
                "name": "Ping",
                "supertypes": ["Remote"],
                "methods": [{
                    "name": "ping",
                    "exceptions": ["RemoteFailure"]
                }]
            }]
        }"#,
    );
    let ctx = IntrospectionContext::new();
    let source = registry.interface("Ping").unwrap();

    examine(&ctx, &registry, Some(&source)).unwrap();
    examine(&ctx, &registry, Some(&source)).unwrap();
    examine(&ctx, &registry, Some(&source)).unwrap();

    assert_eq!(ctx.cache().validation_count(), 1);
    assert_eq!(ctx.cache().cache_hit_count(), 2);
}

#[test]
fn null_input_is_reported_without_panicking() {
    let ctx = IntrospectionContext::new();
    let registry = registry_from(r#"{"interfaces": []}"#);
    let err = examine(&ctx, &registry, None).unwrap_err();
    assert_eq!(err, IntrospectionError::NullInput);
}

#[test]
fn unshared_sweep_downgrades_a_whole_parameter_list() {
    // `notes` is a complex value type (not primitive-like), so its presence
    // forces every sibling parameter - including the otherwise-unshared `id` -
    // to be treated as shared once resolved.
    let registry = registry_from(
        r#"{
            "interfaces": [{
                "name": "Notebook",
                "supertypes": ["Remote"],
                "methods": [{
                    "name": "annotate",
                    "parameters": [{ "name": "int" }, { "name": "NoteBody" }],
                    "exceptions": ["RemoteFailure"]
                }]
            }]
        }"#,
    );
    let ctx = IntrospectionContext::new();
    let source = registry.interface("Notebook").unwrap();
    let descriptor = examine(&ctx, &registry, Some(&source)).unwrap();

    let methods = descriptor.methods();
    let annotate = &methods[0];
    for parameter in annotate.parameters() {
        assert!(!parameter.is_unshared());
    }
}
