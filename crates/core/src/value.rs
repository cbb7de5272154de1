//! Decoded Solidity values.
//!
//! [`DecodedValue`] is the tagged-sum result of applying a [`PrimitiveKind`]
//! to a byte slice extracted from a slot. Narrow integers are exposed as
//! platform integers per spec.md §4.2 (<=48 bits unsigned, <=49 bits
//! signed); everything wider goes through `alloy_primitives`'s
//! arbitrary-precision `Uint`/`Signed`.

use alloy_primitives::{Address, I256, U256};

/// A fully decoded Solidity value, tagged by the kind that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum DecodedValue {
    Bool(bool),
    Address(Address),
    /// Narrow unsigned integer (<=48 bits), exposed as a platform `u64`.
    SmallUint(u64),
    /// Wide unsigned integer (>48 bits), exposed as an arbitrary-precision `U256`.
    Uint(U256),
    /// Narrow signed integer (<=49 bits), exposed as a platform `i64`.
    SmallInt(i64),
    /// Wide signed integer (>49 bits), exposed as an arbitrary-precision `I256`.
    Int(I256),
    /// `bytesN`, left-aligned within an N-byte buffer.
    FixedBytes(Vec<u8>),
    /// Raw `bytes`, when UTF-8 decoding was not attempted or failed.
    Bytes(Vec<u8>),
    /// `string`, or `bytes` that happened to decode as valid UTF-8 text
    /// when the declared type was `string`.
    Str(String),
}

impl DecodedValue {
    /// Renders the value the way it should appear inside a `fullExpression`
    /// mapping-key segment (`name[value]`), e.g. an address as its checksum
    /// or lower-case hex (per `checksum`, spec.md §6.3's `addressChecksum`),
    /// an integer in decimal.
    pub fn render(&self, checksum: bool) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Address(a) => {
                if checksum {
                    a.to_checksum(None)
                } else {
                    a.to_string()
                }
            }
            Self::SmallUint(v) => v.to_string(),
            Self::Uint(v) => v.to_string(),
            Self::SmallInt(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::FixedBytes(b) | Self::Bytes(b) => format!("0x{}", hex::encode(b)),
            Self::Str(s) => s.clone(),
        }
    }
}

/// Re-encodes a decoded primitive back into the `byte_len`-byte big-endian
/// buffer [`decode_primitive`] would have read it from.
///
/// The inverse of [`decode_primitive`] for the kinds it actually produces a
/// value for; `None` if `kind`/`value`/`byte_len` don't agree (e.g. an
/// `Address` value re-encoded at a width other than 20) or `kind` is one
/// `decode_primitive` never returns a value for. Proves spec.md §8's
/// primitive round-trip law: `decode_primitive(kind, encode_primitive(kind,
/// decode_primitive(kind, bytes).unwrap(), bytes.len()).unwrap())` is the
/// same value decoding started with.
pub fn encode_primitive(kind: &PrimitiveKind, value: &DecodedValue, byte_len: usize) -> Option<Vec<u8>> {
    if byte_len == 0 || byte_len > 32 {
        return None;
    }
    match (kind, value) {
        (PrimitiveKind::Bool, DecodedValue::Bool(b)) => {
            let mut buf = vec![0u8; byte_len];
            buf[byte_len - 1] = u8::from(*b);
            Some(buf)
        }
        (PrimitiveKind::Address, DecodedValue::Address(a)) => {
            if byte_len != 20 {
                return None;
            }
            Some(a.as_slice().to_vec())
        }
        (PrimitiveKind::UintN | PrimitiveKind::Enum, DecodedValue::SmallUint(v)) => {
            Some(uint_to_be_bytes(U256::from(*v), byte_len))
        }
        (PrimitiveKind::UintN | PrimitiveKind::Enum, DecodedValue::Uint(v)) => {
            Some(uint_to_be_bytes(*v, byte_len))
        }
        (PrimitiveKind::IntN, DecodedValue::SmallInt(v)) if byte_len <= 6 => {
            Some(small_int_to_be_bytes(*v, byte_len))
        }
        (PrimitiveKind::IntN, DecodedValue::Int(v)) if byte_len > 6 => {
            Some(int256_to_be_bytes(*v, byte_len))
        }
        (PrimitiveKind::FixedBytes, DecodedValue::FixedBytes(b)) => {
            if b.len() != byte_len {
                return None;
            }
            Some(b.clone())
        }
        _ => None,
    }
}

fn uint_to_be_bytes(value: U256, byte_len: usize) -> Vec<u8> {
    value.to_be_bytes::<32>()[32 - byte_len..].to_vec()
}

/// Encodes a narrow signed value (<=48 bits) back to its two's-complement
/// big-endian bytes. Truncating an `i64`'s own two's-complement bit pattern
/// to the low `bit_width` bits recovers the original narrow representation
/// exactly, the inverse of [`sign_extend_i64`]'s sign extension.
fn small_int_to_be_bytes(value: i64, byte_len: usize) -> Vec<u8> {
    let bit_width = byte_len * 8;
    let mask: u64 = if bit_width >= 64 { u64::MAX } else { (1u64 << bit_width) - 1 };
    let masked = (value as u64) & mask;
    let mut buf = vec![0u8; byte_len];
    for (i, byte) in buf.iter_mut().rev().enumerate() {
        *byte = ((masked >> (i * 8)) & 0xff) as u8;
    }
    buf
}

fn int256_to_be_bytes(value: I256, byte_len: usize) -> Vec<u8> {
    value.into_raw().to_be_bytes::<32>()[32 - byte_len..].to_vec()
}

/// The Solidity-level primitive shape of a value occupying `bytes` bytes
/// inside a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bool,
    Address,
    UintN,
    IntN,
    /// `bytesN`, `N` given by the byte count passed to [`decode_primitive`].
    FixedBytes,
    /// `enum`, treated as an unsigned integer of the declared width.
    Enum,
    /// Unrecognized type label; decoding always fails gracefully.
    Unknown,
}

impl PrimitiveKind {
    /// Classifies a Solidity type label into a [`PrimitiveKind`].
    ///
    /// Recognizes `bool`, `address`, `uintN`/`intN` (any bit width 8..=256,
    /// multiple of 8), `bytesN` (1..=32), and `enum ...` labels. Anything
    /// else (including aggregate labels like `mapping(...)` which never
    /// reach this function through the normal classify/decode path) yields
    /// [`PrimitiveKind::Unknown`].
    pub fn classify(label: &str) -> Self {
        if label == "bool" {
            return Self::Bool;
        }
        if label == "address" || label == "address payable" {
            return Self::Address;
        }
        if let Some(rest) = label.strip_prefix("uint") {
            if rest.is_empty() || rest.parse::<u32>().is_ok() {
                return Self::UintN;
            }
        }
        if let Some(rest) = label.strip_prefix("int") {
            if rest.is_empty() || rest.parse::<u32>().is_ok() {
                return Self::IntN;
            }
        }
        if let Some(rest) = label.strip_prefix("bytes") {
            if !rest.is_empty() && rest.parse::<u32>().is_ok() {
                return Self::FixedBytes;
            }
        }
        if label.starts_with("enum ") {
            return Self::Enum;
        }
        Self::Unknown
    }
}

/// Decodes `bytes` (1..=32) extracted from a slot according to `kind`.
///
/// Never panics. [`PrimitiveKind::Unknown`] (or a byte count of zero)
/// yields `None` — callers attach a [`crate::path::DecodeNote`] in that case
/// per spec.md §4.2's "decode failures never throw" contract.
pub fn decode_primitive(kind: &PrimitiveKind, bytes: &[u8]) -> Option<DecodedValue> {
    if bytes.is_empty() || bytes.len() > 32 {
        return None;
    }
    match kind {
        PrimitiveKind::Bool => Some(DecodedValue::Bool(bytes.iter().any(|b| *b != 0))),
        PrimitiveKind::Address => {
            if bytes.len() != 20 {
                return None;
            }
            Some(DecodedValue::Address(Address::from_slice(bytes)))
        }
        PrimitiveKind::Enum | PrimitiveKind::UintN => {
            let value = uint_from_be_bytes(bytes);
            if bytes.len() <= 6 {
                Some(DecodedValue::SmallUint(value.to::<u64>()))
            } else {
                Some(DecodedValue::Uint(value))
            }
        }
        PrimitiveKind::IntN => {
            let bit_width = bytes.len() * 8;
            if bytes.len() <= 6 {
                Some(DecodedValue::SmallInt(sign_extend_i64(bytes, bit_width)))
            } else {
                let unsigned = uint_from_be_bytes(bytes);
                Some(DecodedValue::Int(sign_extend_i256(unsigned, bit_width)))
            }
        }
        PrimitiveKind::FixedBytes => Some(DecodedValue::FixedBytes(bytes.to_vec())),
        PrimitiveKind::Unknown => None,
    }
}

fn uint_from_be_bytes(bytes: &[u8]) -> U256 {
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(bytes);
    U256::from_be_bytes(buf)
}

/// Sign-extends a big-endian buffer of at most 6 bytes (48 bits) into an
/// `i64`. 48 bits always fits comfortably in `i64`'s 63-bit range.
fn sign_extend_i64(bytes: &[u8], bit_width: usize) -> i64 {
    let mut unsigned: u64 = 0;
    for &b in bytes {
        unsigned = (unsigned << 8) | u64::from(b);
    }
    let sign_bit = 1u64 << (bit_width - 1);
    if unsigned & sign_bit != 0 {
        let mask = (1u64 << bit_width) - 1;
        -(((unsigned ^ mask) + 1) as i64)
    } else {
        unsigned as i64
    }
}

fn sign_extend_i256(unsigned: U256, bit_width: usize) -> I256 {
    if bit_width >= 256 {
        return I256::from_raw(unsigned);
    }
    let sign_bit = U256::from(1) << (bit_width - 1);
    if unsigned & sign_bit != U256::ZERO {
        let mask = (U256::from(1) << bit_width) - U256::from(1);
        let negative = (unsigned ^ mask) + U256::from(1);
        I256::from_raw(negative).wrapping_neg()
    } else {
        I256::from_raw(unsigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognizes_core_labels() {
        assert_eq!(PrimitiveKind::classify("bool"), PrimitiveKind::Bool);
        assert_eq!(PrimitiveKind::classify("address"), PrimitiveKind::Address);
        assert_eq!(PrimitiveKind::classify("uint256"), PrimitiveKind::UintN);
        assert_eq!(PrimitiveKind::classify("uint8"), PrimitiveKind::UintN);
        assert_eq!(PrimitiveKind::classify("int16"), PrimitiveKind::IntN);
        assert_eq!(PrimitiveKind::classify("bytes4"), PrimitiveKind::FixedBytes);
        assert_eq!(
            PrimitiveKind::classify("enum Foo.Bar"),
            PrimitiveKind::Enum
        );
        assert_eq!(
            PrimitiveKind::classify("mapping(address => uint256)"),
            PrimitiveKind::Unknown
        );
    }

    #[test]
    fn decode_bool_zero_and_nonzero() {
        assert_eq!(
            decode_primitive(&PrimitiveKind::Bool, &[0]),
            Some(DecodedValue::Bool(false))
        );
        assert_eq!(
            decode_primitive(&PrimitiveKind::Bool, &[1]),
            Some(DecodedValue::Bool(true))
        );
    }

    #[test]
    fn decode_uint8_small_uint() {
        assert_eq!(
            decode_primitive(&PrimitiveKind::UintN, &[42]),
            Some(DecodedValue::SmallUint(42))
        );
    }

    #[test]
    fn decode_uint256_max_is_exact() {
        let bytes = [0xffu8; 32];
        assert_eq!(
            decode_primitive(&PrimitiveKind::UintN, &bytes),
            Some(DecodedValue::Uint(U256::MAX))
        );
    }

    #[test]
    fn decode_int8_negative_one() {
        assert_eq!(
            decode_primitive(&PrimitiveKind::IntN, &[0xff]),
            Some(DecodedValue::SmallInt(-1))
        );
    }

    #[test]
    fn decode_int8_min() {
        assert_eq!(
            decode_primitive(&PrimitiveKind::IntN, &[0x80]),
            Some(DecodedValue::SmallInt(-128))
        );
    }

    #[test]
    fn decode_int256_min_wide_path() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x80;
        let decoded = decode_primitive(&PrimitiveKind::IntN, &bytes).unwrap();
        assert_eq!(decoded, DecodedValue::Int(I256::MIN));
    }

    #[test]
    fn decode_address_requires_20_bytes() {
        assert_eq!(decode_primitive(&PrimitiveKind::Address, &[0u8; 19]), None);
        let bytes = [0x11u8; 20];
        assert_eq!(
            decode_primitive(&PrimitiveKind::Address, &bytes),
            Some(DecodedValue::Address(Address::from_slice(&bytes)))
        );
    }

    #[test]
    fn decode_unknown_never_panics() {
        assert_eq!(decode_primitive(&PrimitiveKind::Unknown, &[1, 2, 3]), None);
    }

    #[test]
    fn decode_empty_bytes_is_none() {
        assert_eq!(decode_primitive(&PrimitiveKind::UintN, &[]), None);
    }

    #[test]
    fn encode_bool_round_trips() {
        let decoded = decode_primitive(&PrimitiveKind::Bool, &[1]).unwrap();
        let bytes = encode_primitive(&PrimitiveKind::Bool, &decoded, 1).unwrap();
        assert_eq!(decode_primitive(&PrimitiveKind::Bool, &bytes), Some(decoded));
    }

    #[test]
    fn encode_address_round_trips() {
        let raw = [0xabu8; 20];
        let decoded = decode_primitive(&PrimitiveKind::Address, &raw).unwrap();
        let bytes = encode_primitive(&PrimitiveKind::Address, &decoded, 20).unwrap();
        assert_eq!(bytes, raw);
    }

    #[test]
    fn encode_wide_int_min_round_trips() {
        let mut raw = [0u8; 32];
        raw[0] = 0x80;
        let decoded = decode_primitive(&PrimitiveKind::IntN, &raw).unwrap();
        let bytes = encode_primitive(&PrimitiveKind::IntN, &decoded, 32).unwrap();
        assert_eq!(bytes, raw);
    }

    #[test]
    fn encode_mismatched_kind_and_value_is_none() {
        assert_eq!(
            encode_primitive(&PrimitiveKind::Bool, &DecodedValue::SmallUint(1), 1),
            None
        );
    }

    // -- PROPERTY TESTS (spec.md §8's primitive round-trip law) -------------

    use proptest::prelude::*;

    fn roundtrip(kind: &PrimitiveKind, bytes: &[u8]) -> Result<(), TestCaseError> {
        let Some(decoded) = decode_primitive(kind, bytes) else {
            return Ok(());
        };
        let encoded = encode_primitive(kind, &decoded, bytes.len());
        prop_assert!(encoded.is_some(), "encode_primitive returned None for {decoded:?}");
        let redecoded = decode_primitive(kind, &encoded.unwrap());
        prop_assert_eq!(redecoded, Some(decoded));
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn proptest_roundtrip_bool(byte: u8) {
            roundtrip(&PrimitiveKind::Bool, &[byte])?;
        }

        #[test]
        fn proptest_roundtrip_address(raw in proptest::collection::vec(any::<u8>(), 20)) {
            roundtrip(&PrimitiveKind::Address, &raw)?;
        }

        #[test]
        fn proptest_roundtrip_uintn(bytes in proptest::collection::vec(any::<u8>(), 1..=32)) {
            roundtrip(&PrimitiveKind::UintN, &bytes)?;
        }

        #[test]
        fn proptest_roundtrip_intn(bytes in proptest::collection::vec(any::<u8>(), 1..=32)) {
            roundtrip(&PrimitiveKind::IntN, &bytes)?;
        }

        #[test]
        fn proptest_roundtrip_fixed_bytes(bytes in proptest::collection::vec(any::<u8>(), 1..=32)) {
            roundtrip(&PrimitiveKind::FixedBytes, &bytes)?;
        }
    }
}
