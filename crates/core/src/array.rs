//! Array resolver (C7, spec.md §4.7).
//!
//! Static arrays use stride arithmetic over the element's own byte size.
//! Dynamic arrays read their length from the base slot, then iterate an
//! element region rooted at `keccak256(baseSlot)`.
//!
//! Solidity forbids `mapping` as an array element type, so this resolver
//! only ever descends into primitives, `bytes`/`string`, and structs.

use crate::{
    diff::StorageDiff,
    direct::{assemble_struct_record, decode_primitive_at, decode_struct_members},
    dynamic_bytes::decode_bytes_or_string,
    layout::{Layout, TypeDescriptor},
    path::PathSegment,
    record::AccessRecord,
    slot::{Slot, dynamic_array_base},
    value::DecodedValue,
};
use alloy_primitives::U256;

/// Byte size one element of this type occupies, for stride arithmetic.
/// Reference-type elements this resolver doesn't descend into (nested
/// arrays) default to a whole-slot stride of 32.
fn element_stride(descriptor: &TypeDescriptor) -> u64 {
    match descriptor {
        TypeDescriptor::Inplace { size_bytes, .. } => u64::from(*size_bytes),
        TypeDescriptor::InplaceStruct { size_bytes, .. } => *size_bytes,
        TypeDescriptor::InplaceStaticArray { size_bytes, .. } => *size_bytes,
        TypeDescriptor::Bytes { .. } | TypeDescriptor::DynamicArray { .. } | TypeDescriptor::Mapping { .. } => 32,
    }
}

fn length_from_be(value: alloy_primitives::B256) -> u64 {
    U256::from_be_bytes(value.0).try_into().unwrap_or(u64::MAX)
}

/// Decodes one array element at `(element_slot, element_offset)`, `None`
/// when the element's type isn't resolvable here (nested array/mapping) or
/// the element was never touched.
fn decode_element(
    name: &str,
    path_prefix: &[PathSegment],
    index: U256,
    element_slot: Slot,
    element_offset: u8,
    elem_descriptor: &TypeDescriptor,
    layout: &Layout,
    diff: &StorageDiff,
    checksum: bool,
) -> Option<AccessRecord> {
    let mut elem_path = path_prefix.to_vec();
    elem_path.push(PathSegment::ArrayIndex { index });

    let mut record = match elem_descriptor {
        TypeDescriptor::Inplace { label, size_bytes } => {
            decode_primitive_at(name, &elem_path, element_slot, element_offset, label, *size_bytes, diff, checksum)
        }
        TypeDescriptor::Bytes { label } => {
            decode_bytes_or_string(name, &elem_path, element_slot, diff, label == "string", checksum)
                .map(|(_, content)| content)
        }
        TypeDescriptor::InplaceStruct { members, .. } => {
            let fields = decode_struct_members(element_slot, members, layout, diff, &elem_path, checksum);
            assemble_struct_record(name, element_slot, diff, fields, elem_path.clone(), checksum)
        }
        TypeDescriptor::InplaceStaticArray { .. }
        | TypeDescriptor::DynamicArray { .. }
        | TypeDescriptor::Mapping { .. } => None,
    }?;

    record.index = Some(index);
    Some(record)
}

/// Static array (`T[n]`): iterates every element, returning records for
/// those whose slot(s) appear in the diff.
pub fn decode_static_array_elements(
    name: &str,
    path_prefix: &[PathSegment],
    base_slot: Slot,
    offset_in_slot: u8,
    array_size_bytes: u64,
    elem_type_id: &str,
    layout: &Layout,
    diff: &StorageDiff,
    checksum: bool,
) -> Vec<AccessRecord> {
    let Some(elem_descriptor) = layout.type_of(elem_type_id) else {
        return Vec::new();
    };
    let stride = element_stride(elem_descriptor);
    if stride == 0 {
        return Vec::new();
    }
    let count = array_size_bytes / stride;

    (0..count)
        .filter_map(|i| {
            let total_offset = u64::from(offset_in_slot) + i * stride;
            let element_slot = base_slot.add(U256::from(total_offset / 32));
            let element_offset = (total_offset % 32) as u8;
            decode_element(
                name,
                path_prefix,
                U256::from(i),
                element_slot,
                element_offset,
                elem_descriptor,
                layout,
                diff,
                checksum,
            )
        })
        .collect()
}

/// Dynamic array (`T[]`): reads the length from `base_slot`, then iterates
/// `max(current_length, next_length)` elements rooted at
/// `keccak256(base_slot)`. `None` if `base_slot` never appears in the diff.
pub fn decode_dynamic_array(
    name: &str,
    path_prefix: &[PathSegment],
    base_slot: Slot,
    elem_type_id: &str,
    layout: &Layout,
    diff: &StorageDiff,
    checksum: bool,
) -> Option<(AccessRecord, Vec<AccessRecord>)> {
    let entry = diff.get(&base_slot)?;
    let current_length = length_from_be(entry.current);
    let next_length = entry.next.map(length_from_be);
    let effective_length = next_length.map_or(current_length, |n| n.max(current_length));

    let mut length_path = path_prefix.to_vec();
    length_path.push(PathSegment::ArrayLength);
    let length_record = AccessRecord::new(
        name,
        crate::record::HexValue::new(entry.current, Some(DecodedValue::SmallUint(current_length))),
        entry
            .next
            .zip(next_length)
            .map(|(hex, length)| crate::record::HexValue::new(hex, Some(DecodedValue::SmallUint(length)))),
        vec![base_slot],
        length_path,
        checksum,
    );

    let Some(elem_descriptor) = layout.type_of(elem_type_id) else {
        return Some((length_record, Vec::new()));
    };
    let stride = element_stride(elem_descriptor);
    if stride == 0 {
        return Some((length_record, Vec::new()));
    }
    let root = dynamic_array_base(base_slot);

    let elements = (0..effective_length)
        .filter_map(|i| {
            let total_offset = i * stride;
            let element_slot = root.add(U256::from(total_offset / 32));
            let element_offset = (total_offset % 32) as u8;
            decode_element(
                name,
                path_prefix,
                U256::from(i),
                element_slot,
                element_offset,
                elem_descriptor,
                layout,
                diff,
                checksum,
            )
        })
        .collect();

    Some((length_record, elements))
}
