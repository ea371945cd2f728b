//! Byte order policy: whether bytes read for a type must be swapped before decoding.
//!
//! Raw bytes are always read in host order. A type whose [ByteOrder] differs from the
//! host has every multi-byte primitive reversed before it is exposed.

/// Byte order of the data described by a schema, fixed when the schema is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ByteOrder {
    /// Data is in host order. Never swaps.
    #[default]
    Native,
    /// Data is little-endian. Swaps on big-endian hosts.
    Little,
    /// Data is big-endian. Swaps on little-endian hosts.
    Big,
    /// Always swaps, whatever the host.
    Swapped,
}

impl ByteOrder {
    /// Decides whether primitives read under this order must be byte-swapped.
    pub const fn needs_swap(self) -> bool {
        match self {
            ByteOrder::Native => false,
            ByteOrder::Little => cfg!(target_endian = "big"),
            ByteOrder::Big => cfg!(target_endian = "little"),
            ByteOrder::Swapped => true,
        }
    }
}

/// Reverses the byte order of one primitive's raw bytes in place. Self-inverse.
pub fn swap_bytes(raw: &mut [u8]) {
    raw.reverse();
}
