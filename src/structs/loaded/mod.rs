//! Final, resolved descriptor forms: canonically interned, immutable once
//! `resolve` finishes, and safe to hash/compare/serialize even under cycles.

pub mod interface;
pub mod method;
pub mod parameter;

pub use interface::InterfaceDescriptor;
pub use method::MethodDescriptor;
pub use parameter::{ParamKind, ParameterDescriptor, ValueType};
