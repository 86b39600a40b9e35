//! Stable, comparable handles assigned once per introspection.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A process-local handle naming an interface or method descriptor.
///
/// Equality is value equality over the counter, which is equivalent to identity
/// equality over the canonical set: the only way two `Identifier`s compare equal
/// is if they came from the same call to [`Identifier::fresh`], and every
/// descriptor mints its identifier exactly once, the first time it is built.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Identifier(u64);

impl Identifier {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Renders the identifier as the compact opaque byte sequence the wire form uses.
    pub fn to_wire_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn from_wire_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({:#x})", self.0)
    }
}

impl Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.to_wire_bytes())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        let arr: [u8; 8] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("identifier wire form must be 8 bytes"))?;
        Ok(Self::from_wire_bytes(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_identifiers_are_distinct() {
        let a = Identifier::fresh();
        let b = Identifier::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn round_trips_through_wire_bytes() {
        let id = Identifier::fresh();
        let bytes = id.to_wire_bytes();
        assert_eq!(Identifier::from_wire_bytes(bytes), id);
    }
}
