//! The final, immutable method descriptor.

use crate::identifier::Identifier;
use crate::model::ExceptionHierarchy;
use crate::structs::bitflag::MethodFlags;
use crate::structs::loaded::parameter::ParameterDescriptor;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MethodDescriptor {
    id: Identifier,
    name: String,
    return_type: Option<ParameterDescriptor>,
    parameters: Vec<ParameterDescriptor>,
    exceptions: Vec<ParameterDescriptor>,
    flags: MethodFlags,
    response_timeout_millis: i64,
}

impl MethodDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: Identifier,
        name: String,
        return_type: Option<ParameterDescriptor>,
        parameters: Vec<ParameterDescriptor>,
        exceptions: Vec<ParameterDescriptor>,
        flags: MethodFlags,
        response_timeout_millis: i64,
    ) -> Self {
        Self {
            id,
            name,
            return_type,
            parameters,
            exceptions,
            flags,
            response_timeout_millis,
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> Option<&ParameterDescriptor> {
        self.return_type.as_ref()
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn exceptions(&self) -> &[ParameterDescriptor] {
        &self.exceptions
    }

    pub fn is_asynchronous(&self) -> bool {
        self.flags.contains(MethodFlags::ASYNCHRONOUS)
    }

    pub fn is_idempotent(&self) -> bool {
        self.flags.contains(MethodFlags::IDEMPOTENT)
    }

    pub fn response_timeout_millis(&self) -> i64 {
        self.response_timeout_millis
    }

    /// True iff some declared exception is `candidate` or a supertype of it.
    pub fn declares_exception(
        &self,
        hierarchy: &ExceptionHierarchy,
        candidate: &ParameterDescriptor,
    ) -> bool {
        let candidate_name = match candidate.serialized_type() {
            Some(value) => value.name(),
            None => return false,
        };
        self.exceptions.iter().any(|declared| {
            declared
                .serialized_type()
                .map(|v| hierarchy.is_supertype_or_equal(v.name(), candidate_name))
                .unwrap_or(false)
        })
    }

    pub fn signature_string(&self, class_name: Option<&str>) -> String {
        let ret = self
            .return_type
            .as_ref()
            .map(describe_parameter)
            .unwrap_or_else(|| "void".to_string());
        let params = self
            .parameters
            .iter()
            .map(describe_parameter)
            .collect::<Vec<_>>()
            .join(", ");
        let exceptions = self
            .exceptions
            .iter()
            .map(describe_parameter)
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = class_name.map(|c| format!("{c}.")).unwrap_or_default();
        if exceptions.is_empty() {
            format!("{ret} {prefix}{name}({params})", name = self.name)
        } else {
            format!(
                "{ret} {prefix}{name}({params}) throws {exceptions}",
                name = self.name
            )
        }
    }
}

fn describe_parameter(p: &ParameterDescriptor) -> String {
    let base = if let Some(value) = p.serialized_type() {
        value.name().to_string()
    } else if let Some(remote) = p.remote_type() {
        remote.name().to_string()
    } else {
        "?".to_string()
    };
    format!("{base}{}", "[]".repeat(p.array_rank() as usize))
}
