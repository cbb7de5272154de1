//! Primitive/struct/bytes pass (C5, spec.md §4.5).
//!
//! Resolves every variable whose root slot is reachable without a mapping
//! or array descent: primitives decode straight from their base slot;
//! structs walk their members' precomputed `(slotRelative, offsetInSlot)`
//! positions (as supplied by the layout descriptor — see DESIGN.md for why
//! this crate trusts those positions rather than re-deriving them);
//! `bytes`/`string` defers to [`crate::dynamic_bytes`].

use crate::{
    diff::StorageDiff,
    dynamic_bytes::decode_bytes_or_string,
    layout::{Layout, StructMember, TypeDescriptor},
    path::PathSegment,
    primitive::extract_bytes,
    record::{AccessRecord, HexValue},
    slot::Slot,
    value::{PrimitiveKind, decode_primitive},
};
use alloy_primitives::U256;

/// Decodes a primitive variable at `slot`/`offset`, or `None` if `slot`
/// never appears in the diff (the variable was never touched).
pub(crate) fn decode_primitive_at(
    name: &str,
    path: &[PathSegment],
    slot: Slot,
    offset: u8,
    label: &str,
    size_bytes: u8,
    diff: &StorageDiff,
    checksum: bool,
) -> Option<AccessRecord> {
    let entry = diff.get(&slot)?;
    let kind = PrimitiveKind::classify(label);
    let current_decoded = extract_bytes(entry.current, offset, size_bytes)
        .and_then(|bytes| decode_primitive(&kind, &bytes));
    let current = HexValue::new(entry.current, current_decoded);
    let next = entry.next.map(|next_raw| {
        let next_decoded = extract_bytes(next_raw, offset, size_bytes)
            .and_then(|bytes| decode_primitive(&kind, &bytes));
        HexValue::new(next_raw, next_decoded)
    });
    Some(AccessRecord::new(name, current, next, vec![slot], path.to_vec(), checksum))
}

/// Top-level primitive variable (empty path — the record IS the variable).
pub fn decode_primitive_variable(
    name: &str,
    base_slot: Slot,
    offset_in_slot: u8,
    label: &str,
    size_bytes: u8,
    diff: &StorageDiff,
    checksum: bool,
) -> Option<AccessRecord> {
    decode_primitive_at(name, &[], base_slot, offset_in_slot, label, size_bytes, diff, checksum)
}

/// Walks a struct's members, producing one sub-record per touched member
/// (spec.md §4.5's member cursor-walk, here following the layout's own
/// precomputed positions). Struct and nested-struct members recurse;
/// dynamic-array and mapping members nested inside a struct are not
/// resolved here (their slots surface in `unexploredSlots` instead — see
/// DESIGN.md).
pub fn decode_struct_members(
    base_slot: Slot,
    members: &[StructMember],
    layout: &Layout,
    diff: &StorageDiff,
    path_prefix: &[PathSegment],
    checksum: bool,
) -> Vec<(String, AccessRecord)> {
    let mut fields = Vec::new();

    for member in members {
        let member_slot = base_slot.add(U256::from(member.slot_relative));
        let mut member_path = path_prefix.to_vec();
        member_path.push(PathSegment::StructField {
            name: member.label.clone(),
        });

        let Some(descriptor) = layout.type_of(&member.type_id) else {
            continue;
        };

        match descriptor {
            TypeDescriptor::Inplace { label, size_bytes } => {
                if let Some(record) = decode_primitive_at(
                    &member.label,
                    &member_path,
                    member_slot,
                    member.offset_in_slot,
                    label,
                    *size_bytes,
                    diff,
                    checksum,
                ) {
                    fields.push((member.label.clone(), record));
                }
            }
            TypeDescriptor::Bytes { label } => {
                if let Some((length_record, content_record)) = decode_bytes_or_string(
                    &member.label,
                    &member_path,
                    member_slot,
                    diff,
                    label == "string",
                    checksum,
                ) {
                    fields.push((format!("{}._length", member.label), length_record));
                    fields.push((member.label.clone(), content_record));
                }
            }
            TypeDescriptor::InplaceStruct {
                members: nested_members,
                ..
            } => {
                let nested = decode_struct_members(member_slot, nested_members, layout, diff, &member_path, checksum);
                if let Some(record) = assemble_struct_record(&member.label, member_slot, diff, nested, member_path, checksum) {
                    fields.push((member.label.clone(), record));
                }
            }
            TypeDescriptor::InplaceStaticArray { .. }
            | TypeDescriptor::DynamicArray { .. }
            | TypeDescriptor::Mapping { .. } => {
                // Not handled: see DESIGN.md's note on struct members of
                // reference-type kinds.
            }
        }
    }

    fields
}

/// Wraps a set of already-decoded field records into a struct-level
/// [`AccessRecord`], deriving `slots` as their union and `modified` as true
/// iff any field was modified. `None` if `fields` is empty (the struct was
/// never touched).
pub fn assemble_struct_record(
    name: &str,
    base_slot: Slot,
    diff: &StorageDiff,
    fields: Vec<(String, AccessRecord)>,
    path_prefix: Vec<PathSegment>,
    checksum: bool,
) -> Option<AccessRecord> {
    if fields.is_empty() {
        return None;
    }

    let mut slots: Vec<Slot> = fields.iter().flat_map(|(_, r)| r.slots.clone()).collect();
    slots.sort();
    slots.dedup();

    let modified = fields.iter().any(|(_, r)| r.modified);

    let (current_hex, next_hex) = match diff.get(&base_slot) {
        Some(entry) => (
            entry.current,
            if modified { Some(entry.next.unwrap_or(entry.current)) } else { None },
        ),
        None => {
            let first = &fields[0].1;
            (
                first.current.hex,
                if modified {
                    Some(first.next.as_ref().map(|n| n.hex).unwrap_or(first.current.hex))
                } else {
                    None
                },
            )
        }
    };

    let current = HexValue::new(current_hex, None);
    let next = next_hex.map(|hex| HexValue::new(hex, None));
    Some(AccessRecord::new(name, current, next, slots, path_prefix, checksum).with_fields(fields))
}

/// Top-level struct variable.
pub fn decode_struct_variable(
    name: &str,
    base_slot: Slot,
    members: &[StructMember],
    layout: &Layout,
    diff: &StorageDiff,
    checksum: bool,
) -> Option<AccessRecord> {
    let fields = decode_struct_members(base_slot, members, layout, diff, &[], checksum);
    assemble_struct_record(name, base_slot, diff, fields, vec![], checksum)
}
