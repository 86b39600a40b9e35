//! Temporary parameter representation produced before a method descriptor's overrides
//! have been merged and before remote-reference parameters have been resolved.

use crate::model::TypeRef;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawParameter {
    pub type_name: String,
    pub dimensions: u32,
}

impl From<&TypeRef> for RawParameter {
    fn from(type_ref: &TypeRef) -> Self {
        Self {
            type_name: type_ref.name.clone(),
            dimensions: type_ref.dimensions,
        }
    }
}
