//! 256-bit slot arithmetic and `keccak256`-derived slot computation.
//!
//! Mirrors Solidity's own rules for locating a mapping entry or a dynamic
//! array's element region: both are rooted at `keccak256` of a 32-byte,
//! big-endian, left-padded input.

use alloy_primitives::{B256, U256, keccak256};
use std::fmt;

/// A 256-bit storage slot identifier.
///
/// Displays as a lower-case, `0x`-prefixed, zero-padded 64-hex-character
/// string — the canonical form every [`Slot`] is normalized to on
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(B256);

#[cfg(feature = "serde")]
impl serde::Serialize for Slot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Slot {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Slot {
    pub const ZERO: Self = Self(B256::ZERO);

    #[inline]
    pub const fn from_b256(value: B256) -> Self {
        Self(value)
    }

    #[inline]
    pub fn from_u256(value: U256) -> Self {
        Self(B256::from(value))
    }

    #[inline]
    pub const fn as_b256(&self) -> B256 {
        self.0
    }

    #[inline]
    pub fn as_u256(&self) -> U256 {
        U256::from_be_bytes(self.0.0)
    }

    /// Integer addition modulo 2^256.
    #[inline]
    pub fn add(&self, delta: U256) -> Self {
        Self::from_u256(self.as_u256().wrapping_add(delta))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:064x}", self.as_u256())
    }
}

impl std::str::FromStr for Slot {
    type Err = ParseSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        if hex.len() > 64 {
            return Err(ParseSlotError);
        }
        let padded = format!("{hex:0>64}");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes).map_err(|_| ParseSlotError)?;
        Ok(Self(B256::from(bytes)))
    }
}

/// A 32-byte value failed to parse as a canonical hex slot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid 32-byte hex slot")]
pub struct ParseSlotError;

impl From<B256> for Slot {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<U256> for Slot {
    fn from(value: U256) -> Self {
        Self::from_u256(value)
    }
}

/// Left-pads `data` to 32 bytes, matching Solidity's convention of
/// right-aligning any value shorter than a word inside the 32-byte slot
/// used as a `keccak256` preimage.
fn left_pad_to_32(data: &[u8]) -> [u8; 32] {
    let mut buf = [0u8; 32];
    let start = 32usize.saturating_sub(data.len());
    let take = data.len().min(32);
    buf[start..].copy_from_slice(&data[data.len() - take..]);
    buf
}

/// Computes the storage slot for a mapping entry: `keccak256(key ∥ base)`.
///
/// `key` is expected already in its 32-byte left-padded form (candidate
/// keys are canonicalized to 32 bytes before reaching this function), but
/// shorter byte strings are still accepted and left-padded defensively.
#[inline]
pub fn mapping_slot<K: AsRef<[u8]>>(key: K, base: Slot) -> Slot {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&left_pad_to_32(key.as_ref()));
    buf[32..].copy_from_slice(base.as_b256().as_slice());
    Slot(keccak256(buf))
}

/// Computes the base slot of a dynamic array's element region:
/// `keccak256(base)`.
#[inline]
pub fn dynamic_array_base(base: Slot) -> Slot {
    Slot(keccak256(base.as_b256().as_slice()))
}
