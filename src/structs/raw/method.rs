//! Temporary method representation accumulated during merge, keyed by
//! `(name, parameter types, return type)` so overrides from multiple parent
//! interfaces collide on the same entry.

use crate::identifier::Identifier;
use crate::model::{Annotations, SourceMethod};
use crate::structs::bitflag::MethodFlags;
use crate::structs::raw::parameter::RawParameter;

pub type MethodKey = (String, Vec<RawParameter>, Option<RawParameter>);

#[derive(Clone, Debug)]
pub struct RawMethod {
    pub id: Identifier,
    pub name: String,
    pub return_type: Option<RawParameter>,
    pub parameters: Vec<RawParameter>,
    /// Declared exception type names. Treated as a set, but kept in first-seen order.
    pub exceptions: Vec<String>,
    pub flags: MethodFlags,
    pub response_timeout_millis: i64,
}

impl RawMethod {
    pub fn from_source(source: &SourceMethod) -> Self {
        Self {
            id: Identifier::fresh(),
            name: source.name.clone(),
            return_type: source.return_type.as_ref().map(RawParameter::from),
            parameters: source.parameters.iter().map(RawParameter::from).collect(),
            exceptions: source.exceptions.clone(),
            flags: annotation_flags(&source.annotations),
            response_timeout_millis: source.annotations.response_timeout_millis,
        }
    }

    pub fn key(&self) -> MethodKey {
        (
            self.name.clone(),
            self.parameters.clone(),
            self.return_type.clone(),
        )
    }

    /// Signature rendering used in diagnostics; doesn't need to be fast.
    pub fn signature_string(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{}{}", p.type_name, "[]".repeat(p.dimensions as usize)))
            .collect::<Vec<_>>()
            .join(", ");
        let ret = self
            .return_type
            .as_ref()
            .map(|p| format!("{}{}", p.type_name, "[]".repeat(p.dimensions as usize)))
            .unwrap_or_else(|| "void".to_string());
        format!("{ret} {name}({params})", name = self.name)
    }

    /// Structural equality over everything merge cares about, used to short-circuit
    /// the intersect step when two overrides happen to declare identical methods.
    pub fn structurally_equal(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parameters == other.parameters
            && self.return_type == other.return_type
            && self.flags == other.flags
            && self.response_timeout_millis == other.response_timeout_millis
            && exception_sets_equal(&self.exceptions, &other.exceptions)
    }
}

fn exception_sets_equal(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|e| b.contains(e))
}

fn annotation_flags(annotations: &Annotations) -> MethodFlags {
    let mut flags = MethodFlags::empty();
    if annotations.asynchronous {
        flags |= MethodFlags::ASYNCHRONOUS;
    }
    if annotations.idempotent {
        flags |= MethodFlags::IDEMPOTENT;
    }
    flags
}
