//! The reflective view of a candidate remote interface, as supplied by the environment.
//!
//! Nothing here is tied to any one reflection mechanism: the same shapes can be
//! built in-process by a stub generator, or loaded from a schema file (see
//! [`Schema`]), per the `annotations(method) -> flags` abstraction the design
//! calls for.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Name of the root remote marker type every candidate interface must transitively extend.
pub const ROOT_REMOTE_MARKER: &str = "Remote";

/// Name of the standard remote-failure exception every remote method must declare (or inherit).
pub const REMOTE_FAILURE: &str = "RemoteFailure";

/// Type names treated as always-unshared when classifying parameters: primitives, strings,
/// and their boxed-wrapper equivalents. Anything else is assumed to be a complex serialized
/// value unless it resolves to a remote interface.
const PRIMITIVE_LIKE_TYPES: &[&str] = &[
    "boolean", "byte", "short", "int", "long", "char", "float", "double", "void", "string",
    "Boolean", "Byte", "Short", "Integer", "Long", "Character", "Float", "Double", "String",
];

pub(crate) fn is_primitive_like(name: &str) -> bool {
    PRIMITIVE_LIKE_TYPES.contains(&name)
}

/// A reference to a type by name plus array rank, as it appears in a method signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    #[serde(default)]
    pub dimensions: u32,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimensions: 0,
        }
    }

    pub fn array(name: impl Into<String>, dimensions: u32) -> Self {
        Self {
            name: name.into(),
            dimensions,
        }
    }
}

/// Behavioral annotations recognized on input methods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub asynchronous: bool,
    #[serde(default)]
    pub idempotent: bool,
    #[serde(default = "default_response_timeout")]
    pub response_timeout_millis: i64,
}

fn default_response_timeout() -> i64 {
    -1
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            asynchronous: false,
            idempotent: false,
            response_timeout_millis: default_response_timeout(),
        }
    }
}

/// One method as declared (not yet merged with overrides) on a candidate interface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceMethod {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<TypeRef>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub exceptions: Vec<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

fn default_true() -> bool {
    true
}

/// A candidate remote interface as reflected by the environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceInterface {
    pub name: String,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default = "default_true")]
    pub is_interface: bool,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<SourceMethod>,
}

/// The exception type hierarchy: each name maps to its immediate declared supertypes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExceptionHierarchy {
    #[serde(default)]
    parents: HashMap<String, Vec<String>>,
}

impl ExceptionHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supertypes(mut self, name: impl Into<String>, parents: Vec<String>) -> Self {
        self.parents.insert(name.into(), parents);
        self
    }

    /// True iff `supertype == ty`, or `supertype` appears in `ty`'s ancestor chain.
    pub fn is_supertype_or_equal(&self, supertype: &str, ty: &str) -> bool {
        if supertype == ty {
            return true;
        }
        let mut frontier = vec![ty.to_string()];
        let mut seen = HashSet::new();
        while let Some(current) = frontier.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(parents) = self.parents.get(&current) {
                for parent in parents {
                    if parent == supertype {
                        return true;
                    }
                    frontier.push(parent.clone());
                }
            }
        }
        false
    }
}

/// A full interface schema: every candidate interface reachable by name, plus the
/// exception hierarchy used to validate throws-clauses. This is what the demo CLI
/// deserializes from a JSON file; programmatic callers can build a [`SchemaRegistry`]
/// directly instead.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Schema {
    pub interfaces: Vec<Arc<SourceInterface>>,
    #[serde(default)]
    pub exceptions: ExceptionHierarchy,
}

/// Resolves type names to either a registered interface or an opaque value type,
/// and answers exception-hierarchy questions. Built once from a [`Schema`] and
/// shared (read-only) across an introspection session.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    interfaces: HashMap<String, Arc<SourceInterface>>,
    exceptions: ExceptionHierarchy,
}

impl SchemaRegistry {
    pub fn from_schema(schema: Schema) -> Self {
        let mut interfaces = HashMap::with_capacity(schema.interfaces.len());
        for iface in schema.interfaces {
            interfaces.insert(iface.name.clone(), iface);
        }
        Self {
            interfaces,
            exceptions: schema.exceptions,
        }
    }

    pub fn interface(&self, name: &str) -> Option<Arc<SourceInterface>> {
        self.interfaces.get(name).cloned()
    }

    pub fn is_interface(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    pub fn exceptions(&self) -> &ExceptionHierarchy {
        &self.exceptions
    }

    /// True iff `iface` transitively extends [`ROOT_REMOTE_MARKER`].
    pub fn extends_remote_marker(&self, iface: &SourceInterface) -> bool {
        let mut frontier: Vec<String> = iface.supertypes.clone();
        let mut seen = HashSet::new();
        while let Some(name) = frontier.pop() {
            if name == ROOT_REMOTE_MARKER {
                return true;
            }
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(parent) = self.interfaces.get(&name) {
                frontier.extend(parent.supertypes.clone());
            }
        }
        false
    }
}
