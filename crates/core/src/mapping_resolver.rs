//! Mapping resolver (C6, spec.md §4.6).
//!
//! A bounded breadth-first search over candidate keys: for each frontier
//! `(mapping type, current slot, path, depth)`, every candidate key derives
//! a slot via [`crate::slot::mapping_slot`]; nested mappings enqueue
//! unconditionally (intermediate slots never materialize in a diff),
//! everything else checks the diff for a match.

use crate::{
    array::{decode_dynamic_array, decode_static_array_elements},
    candidate_key::CandidateKey,
    config::DecodeConfig,
    diff::StorageDiff,
    direct::{assemble_struct_record, decode_primitive_at, decode_struct_members},
    dynamic_bytes::decode_bytes_or_string,
    layout::{Layout, TypeDescriptor},
    path::PathSegment,
    primitive::extract_bytes,
    record::AccessRecord,
    slot::{Slot, mapping_slot},
    value::{DecodedValue, PrimitiveKind, decode_primitive},
};
use alloy_primitives::B256;
use std::collections::{HashSet, VecDeque};

struct Frontier {
    slot: Slot,
    path: Vec<PathSegment>,
    keys: Vec<(String, DecodedValue)>,
    depth: usize,
    key_type_id: String,
    value_type_id: String,
}

/// Decodes a candidate key's hex against the mapping's declared key type,
/// falling back to the raw bytes if the key type isn't a recognized
/// primitive (mapping keys are always elementary types in Solidity, so this
/// fallback is defensive rather than expected).
fn decode_key(layout: &Layout, key_type_id: &str, key: &CandidateKey) -> (DecodedValue, String) {
    let descriptor = layout.type_of(key_type_id);
    let label = descriptor.map(TypeDescriptor::label).unwrap_or("unknown").to_string();
    let size_bytes = match descriptor {
        Some(TypeDescriptor::Inplace { size_bytes, .. }) => *size_bytes,
        _ => 32,
    };
    let kind = PrimitiveKind::classify(&label);
    let decoded = extract_bytes(key.hex, 0, size_bytes)
        .and_then(|bytes| decode_primitive(&kind, &bytes))
        .unwrap_or_else(|| DecodedValue::FixedBytes(key.hex.as_slice().to_vec()));
    (decoded, label)
}

/// Runs the BFS for one mapping variable, returning matches sorted by
/// derived slot in lexical hex order (spec.md §4.6).
///
/// `sorted_keys` must already be deduplicated and ordered per
/// [`crate::candidate_key::sort_candidate_keys_for_bfs`] — the same order
/// is reused, unsorted again, at every BFS level (spec.md §4.6: "sorted
/// once, stably").
pub fn resolve_mapping(
    name: &str,
    base_slot: Slot,
    key_type_id: &str,
    value_type_id: &str,
    layout: &Layout,
    diff: &StorageDiff,
    sorted_keys: &[CandidateKey],
    config: &DecodeConfig,
) -> Vec<AccessRecord> {
    let mut queue = VecDeque::new();
    queue.push_back(Frontier {
        slot: base_slot,
        path: Vec::new(),
        keys: Vec::new(),
        depth: 0,
        key_type_id: key_type_id.to_string(),
        value_type_id: value_type_id.to_string(),
    });

    let mut visited: HashSet<(Slot, B256)> = HashSet::new();
    let mut remaining_budget = config.mapping_exploration_limit;
    let mut matches_found = 0usize;
    let mut matches: Vec<(Slot, AccessRecord)> = Vec::new();

    'bfs: while let Some(frontier) = queue.pop_front() {
        if remaining_budget == 0 || matches_found >= config.early_termination_threshold {
            break;
        }
        if frontier.depth >= config.max_mapping_depth {
            continue;
        }
        let Some(value_descriptor) = layout.type_of(&frontier.value_type_id) else {
            continue;
        };

        for key in sorted_keys {
            if remaining_budget == 0 || matches_found >= config.early_termination_threshold {
                break 'bfs;
            }
            let combination = (frontier.slot, key.hex);
            if visited.contains(&combination) {
                continue;
            }
            visited.insert(combination);
            remaining_budget -= 1;

            let derived = mapping_slot(key.hex.as_slice(), frontier.slot);
            let (decoded_key, key_label) = decode_key(layout, &frontier.key_type_id, key);

            let mut path = frontier.path.clone();
            path.push(PathSegment::MappingKey {
                key: decoded_key.clone(),
                key_type: key_label.clone(),
            });
            let mut keys = frontier.keys.clone();
            keys.push((key_label, decoded_key));

            match value_descriptor {
                TypeDescriptor::Mapping {
                    key_type_id: inner_key,
                    value_type_id: inner_value,
                    ..
                } => {
                    queue.push_back(Frontier {
                        slot: derived,
                        path,
                        keys,
                        depth: frontier.depth + 1,
                        key_type_id: inner_key.clone(),
                        value_type_id: inner_value.clone(),
                    });
                }
                TypeDescriptor::InplaceStruct { members, .. } => {
                    let fields = decode_struct_members(derived, members, layout, diff, &path, config.address_checksum);
                    if let Some(record) = assemble_struct_record(name, derived, diff, fields, path.clone(), config.address_checksum) {
                        matches_found += 1;
                        matches.push((derived, record.with_keys(keys)));
                    }
                }
                TypeDescriptor::Inplace { label, size_bytes } => {
                    if let Some(record) = decode_primitive_at(name, &path, derived, 0, label, *size_bytes, diff, config.address_checksum) {
                        matches_found += 1;
                        matches.push((derived, record.with_keys(keys)));
                    }
                }
                TypeDescriptor::Bytes { label } => {
                    if let Some((_, content)) =
                        decode_bytes_or_string(name, &path, derived, diff, label == "string", config.address_checksum)
                    {
                        matches_found += 1;
                        matches.push((derived, content.with_keys(keys)));
                    }
                }
                // Arrays as mapping values are handled symmetrically with
                // struct values: attributed under the same key path rather
                // than surfaced as a separate top-level variable.
                TypeDescriptor::InplaceStaticArray {
                    size_bytes,
                    base_type_id,
                    ..
                } => {
                    let elements =
                        decode_static_array_elements(name, &path, derived, 0, *size_bytes, base_type_id, layout, diff, config.address_checksum);
                    if !elements.is_empty() {
                        matches_found += 1;
                        let mut slots: Vec<Slot> = elements.iter().flat_map(|e| e.slots.clone()).collect();
                        slots.sort();
                        slots.dedup();
                        let modified = elements.iter().any(|e| e.modified);
                        let current = crate::record::HexValue::new(
                            diff.get(&derived).map(|e| e.current).unwrap_or_default(),
                            None,
                        );
                        let next = modified
                            .then(|| diff.get(&derived).and_then(|e| e.next))
                            .flatten()
                            .map(|hex| crate::record::HexValue::new(hex, None));
                        let wrapper = AccessRecord::new(name, current, next, slots, path.clone(), config.address_checksum)
                            .with_fields(
                                elements
                                    .into_iter()
                                    .map(|e| (e.index.map(|i| i.to_string()).unwrap_or_default(), e))
                                    .collect(),
                            )
                            .with_keys(keys);
                        matches.push((derived, wrapper));
                    }
                }
                TypeDescriptor::DynamicArray { base_type_id, .. } => {
                    if let Some((length, elements)) =
                        decode_dynamic_array(name, &path, derived, base_type_id, layout, diff, config.address_checksum)
                    {
                        matches_found += 1;
                        let mut slots = length.slots.clone();
                        for e in &elements {
                            for s in &e.slots {
                                if !slots.contains(s) {
                                    slots.push(*s);
                                }
                            }
                        }
                        let modified = length.modified || elements.iter().any(|e| e.modified);
                        let mut fields = vec![("_length".to_string(), length.clone())];
                        fields.extend(
                            elements
                                .into_iter()
                                .map(|e| (e.index.map(|i| i.to_string()).unwrap_or_default(), e)),
                        );
                        let next = modified.then(|| length.next.clone()).flatten();
                        let wrapper = AccessRecord::new(name, length.current.clone(), next, slots, path.clone(), config.address_checksum)
                            .with_fields(fields)
                            .with_keys(keys);
                        matches.push((derived, wrapper));
                    }
                }
            }
        }
    }

    matches.sort_by_key(|(slot, _)| slot.as_u256());
    matches.into_iter().map(|(_, record)| record).collect()
}
