//! Byte extraction from a 32-byte slot value (C2 in spec.md §4.2).
//!
//! Solidity packs values from the low byte up: a value occupying `length`
//! bytes at `offset` lives at byte positions `[32 - offset - length, 32 -
//! offset)` of the slot.

use alloy_primitives::B256;

/// Extracts `length` bytes from `slot` at `offset`, per Solidity's packed
/// layout convention (`offset` counted from the low/right-most byte).
///
/// Returns `None` if `offset + length > 32` or `length == 0`.
pub fn extract_bytes(slot: B256, offset: u8, length: u8) -> Option<Vec<u8>> {
    let (offset, length) = (offset as usize, length as usize);
    if length == 0 || offset + length > 32 {
        return None;
    }
    let start = 32 - offset - length;
    let end = 32 - offset;
    Some(slot.as_slice()[start..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn slot_of(value: u64) -> B256 {
        B256::from(U256::from(value))
    }

    #[test]
    fn extract_full_slot() {
        let slot = slot_of(0x1234);
        let bytes = extract_bytes(slot, 0, 32).unwrap();
        assert_eq!(bytes, slot.as_slice());
    }

    #[test]
    fn extract_low_byte_at_offset_0() {
        let slot = slot_of(0xab);
        let bytes = extract_bytes(slot, 0, 1).unwrap();
        assert_eq!(bytes, vec![0xab]);
    }

    #[test]
    fn extract_second_byte_at_offset_1() {
        // 0x1234: low byte 0x34 at offset 0, next byte 0x12 at offset 1.
        let slot = slot_of(0x1234);
        assert_eq!(extract_bytes(slot, 0, 1).unwrap(), vec![0x34]);
        assert_eq!(extract_bytes(slot, 1, 1).unwrap(), vec![0x12]);
    }

    #[test]
    fn rejects_offset_plus_length_overflow() {
        let slot = slot_of(0);
        assert!(extract_bytes(slot, 31, 2).is_none());
        assert!(extract_bytes(slot, 32, 1).is_none());
    }

    #[test]
    fn rejects_zero_length() {
        assert!(extract_bytes(slot_of(0), 0, 0).is_none());
    }

    #[test]
    fn packed_triple_decodes_independently() {
        // uint8 @0, uint8 @1, bool @2, address @3 (S1 from spec.md §8).
        let mut bytes = [0u8; 32];
        bytes[31] = 42; // uint8 offset 0 -> byte index 31
        bytes[30] = 123; // uint8 offset 1 -> byte index 30
        bytes[29] = 1; // bool offset 2 -> byte index 29
        for i in 0..20 {
            bytes[9 + i] = 0xca; // address offset 3..23 -> byte indices 9..29
        }
        let slot = B256::from(bytes);

        assert_eq!(extract_bytes(slot, 0, 1).unwrap(), vec![42]);
        assert_eq!(extract_bytes(slot, 1, 1).unwrap(), vec![123]);
        assert_eq!(extract_bytes(slot, 2, 1).unwrap(), vec![1]);
        assert_eq!(extract_bytes(slot, 3, 20).unwrap(), vec![0xca; 20]);
    }
}
