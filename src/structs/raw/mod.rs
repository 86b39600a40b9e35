//! Temporary, pre-resolve descriptor forms. See `structs::loaded` for their
//! final, canonically-interned counterparts.

pub mod method;
pub mod parameter;

pub use method::RawMethod;
pub use parameter::RawParameter;
