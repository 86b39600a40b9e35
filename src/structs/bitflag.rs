//! Behavioral flags recognized on methods, packed into a bitset the way access
//! flags are packed elsewhere in this lineage.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    pub struct MethodFlags: u8 {
        const ASYNCHRONOUS = 0b0000_0001;
        const IDEMPOTENT   = 0b0000_0010;
    }
}

// bitflags 1.x doesn't derive serde impls, so the flags round-trip as their raw bits.
impl Serialize for MethodFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for MethodFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(MethodFlags::from_bits_truncate(bits))
    }
}
