//! Dynamic `bytes`/`string` reader (C3, spec.md §4.3).
//!
//! Solidity picks between two layouts based on the low bit of the base
//! slot's value: short-form packs data and length into one slot; long-form
//! roots data at `keccak256(baseSlot)` and spills across as many slots as
//! needed.

use crate::{
    diff::{DiffEntry, StorageDiff},
    path::PathSegment,
    record::{AccessRecord, HexValue},
    slot::{Slot, dynamic_array_base},
    value::DecodedValue,
};
use alloy_primitives::U256;

#[derive(Debug, Clone, Copy)]
enum Side {
    Current,
    Next,
}

impl Side {
    fn value(self, entry: &DiffEntry) -> alloy_primitives::B256 {
        match self {
            Self::Current => entry.current,
            Self::Next => entry.effective(),
        }
    }
}

struct BytesState {
    length: u64,
    data: Vec<u8>,
    slots_used: Vec<Slot>,
    truncated: bool,
    note: Option<String>,
}

fn decode_state(base: Slot, header: alloy_primitives::B256, diff: &StorageDiff, side: Side) -> BytesState {
    let low_byte = header.as_slice()[31];
    if low_byte & 1 == 0 {
        let length = u64::from(low_byte >> 1);
        let data = header.as_slice()[..length as usize].to_vec();
        return BytesState {
            length,
            data,
            slots_used: vec![base],
            truncated: false,
            note: None,
        };
    }

    let header_u256 = U256::from_be_bytes(header.0);
    let length = ((header_u256 - U256::from(1)) / U256::from(2)).to::<u64>();

    let mut data = Vec::with_capacity(length as usize);
    let mut slots_used = vec![base];
    let mut truncated = false;
    let mut note = None;
    let root = dynamic_array_base(base);

    let mut remaining = length;
    let mut index: u64 = 0;
    while remaining > 0 {
        let data_slot = root.add(U256::from(index));
        match diff.get(&data_slot) {
            Some(entry) => {
                slots_used.push(data_slot);
                let value = side.value(entry);
                let take = remaining.min(32) as usize;
                data.extend_from_slice(&value.as_slice()[..take]);
                remaining -= take as u64;
            }
            None => {
                truncated = true;
                note = Some(format!("missing long-form data slot {data_slot}"));
                break;
            }
        }
        index += 1;
    }

    BytesState {
        length,
        data,
        slots_used,
        truncated,
        note,
    }
}

fn render_content(data: &[u8], is_string: bool) -> (DecodedValue, Option<String>) {
    if !is_string {
        return (DecodedValue::Bytes(data.to_vec()), None);
    }
    match std::str::from_utf8(data) {
        Ok(s) if !s.contains('\u{fffd}') => (DecodedValue::Str(s.to_string()), None),
        _ => (
            DecodedValue::Bytes(data.to_vec()),
            Some("invalid UTF-8 in string; falling back to raw bytes".to_string()),
        ),
    }
}

fn join_notes(parts: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    let joined = parts.into_iter().flatten().collect::<Vec<_>>().join("; ");
    if joined.is_empty() { None } else { Some(joined) }
}

/// Decodes a `bytes`/`string` variable at `base_slot`, returning the length
/// record and the content record (spec.md §4.3). `None` if `base_slot` is
/// absent from the diff (the variable was never touched).
pub fn decode_bytes_or_string(
    name: &str,
    path_prefix: &[PathSegment],
    base_slot: Slot,
    diff: &StorageDiff,
    is_string: bool,
    checksum: bool,
) -> Option<(AccessRecord, AccessRecord)> {
    let entry = diff.get(&base_slot)?;
    let current = decode_state(base_slot, entry.current, diff, Side::Current);
    let next = entry
        .next
        .map(|next_header| decode_state(base_slot, next_header, diff, Side::Next));

    let mut length_path = path_prefix.to_vec();
    length_path.push(PathSegment::BytesLength);
    let length_current = HexValue::new(entry.current, Some(DecodedValue::SmallUint(current.length)));
    let length_next = entry.next.zip(next.as_ref()).map(|(next_hex, state)| {
        HexValue::new(next_hex, Some(DecodedValue::SmallUint(state.length)))
    });
    let length_record = AccessRecord::new(
        name,
        length_current,
        length_next,
        vec![base_slot],
        length_path,
        checksum,
    );

    let mut content_slots = current.slots_used.clone();
    if let Some(next_state) = &next {
        for slot in &next_state.slots_used {
            if !content_slots.contains(slot) {
                content_slots.push(*slot);
            }
        }
    }
    content_slots.sort();

    let (current_value, current_note) = render_content(&current.data, is_string);
    let content_current = HexValue::new(entry.current, Some(current_value));
    let content_next = entry.next.zip(next.as_ref()).map(|(next_hex, state)| {
        let (value, _) = render_content(&state.data, is_string);
        HexValue::new(next_hex, Some(value))
    });

    let note = join_notes([
        current_note,
        next.as_ref().and_then(|s| s.note.clone()),
        current.note.clone(),
    ]);

    let mut content_record = AccessRecord::new(
        name,
        content_current,
        content_next,
        content_slots,
        path_prefix.to_vec(),
        checksum,
    );
    content_record.note = note;
    if current.truncated || next.as_ref().is_some_and(|s| s.truncated) {
        content_record.note.get_or_insert_with(|| "truncated".to_string());
    }

    Some((length_record, content_record))
}
