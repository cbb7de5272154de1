//! Trace assembler (C8, spec.md §4.8) and the unexplored-slot tracker (C9,
//! spec.md §4.9) — the top-level `decode` entry point that drives C4
//! through C7 and produces a [`DecodeResult`].

use crate::{
    array::{decode_dynamic_array, decode_static_array_elements},
    candidate_key::{CandidateKey, dedupe_candidate_keys, sort_candidate_keys_for_bfs},
    classify::classify,
    config::DecodeConfig,
    diff::StorageDiff,
    direct::{decode_primitive_variable, decode_struct_variable},
    dynamic_bytes::decode_bytes_or_string,
    error::{LayoutError, Result},
    layout::{Layout, TypeDescriptor},
    mapping_resolver::resolve_mapping,
    record::{DecodedMap, LabeledVariableAccess, Trace, VariableKind},
    slot::Slot,
};
use std::collections::{BTreeSet, HashSet};

/// The slots in the diff that no labeled variable claimed (C9, spec.md
/// §4.9): initialized to every diff slot, then shrunk as each resolver
/// attributes slots to a variable.
#[derive(Debug, Default)]
struct UnexploredTracker(BTreeSet<Slot>);

impl UnexploredTracker {
    fn new(diff: &StorageDiff) -> Self {
        Self(diff.keys().copied().collect())
    }

    fn claim(&mut self, slots: &[Slot]) {
        for slot in slots {
            self.0.remove(slot);
        }
    }

    fn into_sorted_vec(self) -> Vec<Slot> {
        self.0.into_iter().collect()
    }
}

/// Input to [`decode`] (spec.md §6.1): the raw diff, the storage-layout
/// descriptor, the candidate mapping keys harvested by the caller, and the
/// resolver's tunables.
#[derive(Debug)]
pub struct DecodeRequest<'a> {
    pub diff: &'a StorageDiff,
    pub layout: &'a Layout,
    pub candidate_keys: &'a [CandidateKey],
    pub config: DecodeConfig,
}

/// Output of [`decode`] (spec.md §4.8, §6.2).
#[derive(Debug, Clone)]
pub struct DecodeResult {
    pub decoded: DecodedMap,
    pub unexplored_slots: Vec<Slot>,
}

/// Checks every referenced `type_id` resolves and every primitive's
/// `offset_in_slot + size_bytes` fits in one slot (spec.md §7's
/// input-consistency fatal errors). Guards against cyclic type
/// dictionaries with a per-branch visited set, even though a conforming
/// layout's dictionary is a DAG (spec.md §9).
fn validate_layout(layout: &Layout) -> Result<()> {
    for variable in &layout.storage {
        let descriptor = layout
            .type_of(&variable.type_id)
            .ok_or_else(|| LayoutError::UnknownType {
                type_id: variable.type_id.clone(),
            })?;
        if let TypeDescriptor::Inplace { size_bytes, .. } = descriptor {
            let offset = usize::from(variable.offset_in_slot);
            if offset + usize::from(*size_bytes) > 32 {
                return Err(LayoutError::OffsetOverflow {
                    variable: variable.label.clone(),
                    offset: variable.offset_in_slot,
                    size: usize::from(*size_bytes),
                });
            }
        }
        validate_type_reachable(layout, &variable.type_id, &mut HashSet::new())?;
    }
    Ok(())
}

fn validate_type_reachable(layout: &Layout, type_id: &str, visited: &mut HashSet<String>) -> Result<()> {
    if !visited.insert(type_id.to_string()) {
        return Ok(());
    }
    let descriptor = layout.type_of(type_id).ok_or_else(|| LayoutError::UnknownType {
        type_id: type_id.to_string(),
    })?;
    match descriptor {
        TypeDescriptor::InplaceStruct { label, members, .. } => {
            for member in members {
                let member_descriptor =
                    layout
                        .type_of(&member.type_id)
                        .ok_or_else(|| LayoutError::UnknownStructMember {
                            struct_type: label.clone(),
                            member: member.label.clone(),
                        })?;
                if let TypeDescriptor::Inplace { size_bytes, .. } = member_descriptor {
                    let offset = usize::from(member.offset_in_slot);
                    if offset + usize::from(*size_bytes) > 32 {
                        return Err(LayoutError::OffsetOverflow {
                            variable: format!("{label}.{}", member.label),
                            offset: member.offset_in_slot,
                            size: usize::from(*size_bytes),
                        });
                    }
                }
                validate_type_reachable(layout, &member.type_id, visited)?;
            }
        }
        TypeDescriptor::InplaceStaticArray { base_type_id, .. }
        | TypeDescriptor::DynamicArray { base_type_id, .. } => {
            validate_type_reachable(layout, base_type_id, visited)?;
        }
        TypeDescriptor::Mapping {
            key_type_id,
            value_type_id,
            ..
        } => {
            validate_type_reachable(layout, key_type_id, visited)?;
            validate_type_reachable(layout, value_type_id, visited)?;
        }
        TypeDescriptor::Inplace { .. } | TypeDescriptor::Bytes { .. } => {}
    }
    Ok(())
}

fn labeled(
    name: &str,
    kind: VariableKind,
    type_label: Option<&str>,
    offset_in_slot: u8,
    trace: Trace,
) -> LabeledVariableAccess {
    LabeledVariableAccess {
        name: name.to_string(),
        kind,
        r#type: type_label.map(str::to_string),
        offset: (offset_in_slot != 0).then_some(offset_in_slot),
        trace,
    }
}

/// Drives the pipeline bucket by bucket — primitives/structs/static arrays,
/// then bytes/string, then dynamic arrays, then mappings (spec.md §4.8) —
/// and re-keys the results into the layout's original declaration order
/// before returning, since processing order and declaration order diverge
/// whenever a contract interleaves variable kinds.
#[tracing::instrument(skip(request), fields(variables = request.layout.storage.len()))]
pub fn decode(request: &DecodeRequest<'_>) -> Result<DecodeResult> {
    validate_layout(request.layout)?;

    let diff = request.diff;
    let layout = request.layout;
    let candidate_keys = request.candidate_keys;
    let config = &request.config;

    let classified = classify(layout);
    let mut tracker = UnexploredTracker::new(diff);
    let mut scratch: std::collections::HashMap<String, LabeledVariableAccess> = std::collections::HashMap::new();

    for variable in &classified.direct {
        let descriptor = layout
            .type_of(&variable.type_id)
            .expect("validate_layout already confirmed this type id resolves");
        match descriptor {
            TypeDescriptor::Inplace { label, size_bytes } => {
                if let Some(record) = decode_primitive_variable(
                    &variable.label,
                    variable.base_slot(),
                    variable.offset_in_slot,
                    label,
                    *size_bytes,
                    diff,
                    config.address_checksum,
                ) {
                    tracker.claim(&record.slots);
                    scratch.insert(
                        variable.label.clone(),
                        labeled(
                            &variable.label,
                            VariableKind::Primitive,
                            Some(label.as_str()),
                            variable.offset_in_slot,
                            Trace::Single(record),
                        ),
                    );
                }
            }
            TypeDescriptor::InplaceStruct { label, members, .. } => {
                if let Some(record) =
                    decode_struct_variable(&variable.label, variable.base_slot(), members, layout, diff, config.address_checksum)
                {
                    tracker.claim(&record.slots);
                    scratch.insert(
                        variable.label.clone(),
                        labeled(&variable.label, VariableKind::Struct, Some(label.as_str()), 0, Trace::Single(record)),
                    );
                }
            }
            TypeDescriptor::InplaceStaticArray {
                label,
                size_bytes,
                base_type_id,
            } => {
                let elements = decode_static_array_elements(
                    &variable.label,
                    &[],
                    variable.base_slot(),
                    variable.offset_in_slot,
                    *size_bytes,
                    base_type_id,
                    layout,
                    diff,
                    config.address_checksum,
                );
                if !elements.is_empty() {
                    for element in &elements {
                        tracker.claim(&element.slots);
                    }
                    scratch.insert(
                        variable.label.clone(),
                        labeled(
                            &variable.label,
                            VariableKind::StaticArray,
                            Some(label.as_str()),
                            0,
                            Trace::Many(elements),
                        ),
                    );
                }
            }
            TypeDescriptor::Bytes { .. } | TypeDescriptor::DynamicArray { .. } | TypeDescriptor::Mapping { .. } => {
                unreachable!("classify() only places Inplace/InplaceStruct/InplaceStaticArray in `direct`")
            }
        }
    }

    for variable in &classified.bytes_like {
        let descriptor = layout
            .type_of(&variable.type_id)
            .expect("validate_layout already confirmed this type id resolves");
        let TypeDescriptor::Bytes { label } = descriptor else {
            unreachable!("classify() only places Bytes descriptors in `bytes_like`")
        };
        if let Some((length_record, content_record)) =
            decode_bytes_or_string(&variable.label, &[], variable.base_slot(), diff, label == "string", config.address_checksum)
        {
            tracker.claim(&length_record.slots);
            tracker.claim(&content_record.slots);
            let combined = content_record.with_fields(vec![("_length".to_string(), length_record)]);
            scratch.insert(
                variable.label.clone(),
                labeled(&variable.label, VariableKind::Bytes, Some(label.as_str()), 0, Trace::Single(combined)),
            );
        }
    }

    for variable in &classified.dynamic_arrays {
        let descriptor = layout
            .type_of(&variable.type_id)
            .expect("validate_layout already confirmed this type id resolves");
        let TypeDescriptor::DynamicArray { label, base_type_id } = descriptor else {
            unreachable!("classify() only places DynamicArray descriptors in `dynamic_arrays`")
        };
        if let Some((length_record, elements)) =
            decode_dynamic_array(&variable.label, &[], variable.base_slot(), base_type_id, layout, diff, config.address_checksum)
        {
            tracker.claim(&length_record.slots);
            for element in &elements {
                tracker.claim(&element.slots);
            }
            let mut trace = vec![length_record];
            trace.extend(elements);
            scratch.insert(
                variable.label.clone(),
                labeled(&variable.label, VariableKind::DynamicArray, Some(label.as_str()), 0, Trace::Many(trace)),
            );
        }
    }

    let sorted_keys = sort_candidate_keys_for_bfs(dedupe_candidate_keys(candidate_keys.to_vec()));
    for variable in &classified.mappings {
        let descriptor = layout
            .type_of(&variable.type_id)
            .expect("validate_layout already confirmed this type id resolves");
        let TypeDescriptor::Mapping {
            label,
            key_type_id,
            value_type_id,
        } = descriptor
        else {
            unreachable!("classify() only places Mapping descriptors in `mappings`")
        };
        let records = resolve_mapping(
            &variable.label,
            variable.base_slot(),
            key_type_id,
            value_type_id,
            layout,
            diff,
            &sorted_keys,
            config,
        );
        if !records.is_empty() {
            for record in &records {
                tracker.claim(&record.slots);
            }
            tracing::debug!(mapping = %variable.label, matches = records.len(), "resolved mapping candidates");
            scratch.insert(
                variable.label.clone(),
                labeled(&variable.label, VariableKind::Mapping, Some(label.as_str()), 0, Trace::Many(records)),
            );
        }
    }

    let mut decoded = DecodedMap::new();
    for variable in &layout.storage {
        if let Some(entry) = scratch.remove(&variable.label) {
            decoded.insert(variable.label.clone(), entry);
        }
    }

    Ok(DecodeResult {
        decoded,
        unexplored_slots: tracker.into_sorted_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{diff::DiffEntry, value::DecodedValue};
    use alloy_primitives::{B256, U256};
    use std::collections::HashMap;

    #[test]
    fn unknown_type_id_is_a_fatal_error() {
        let layout = Layout {
            storage: vec![crate::layout::StorageVariable {
                label: "x".into(),
                type_id: "t_missing".into(),
                slot: U256::ZERO,
                offset_in_slot: 0,
            }],
            types: HashMap::new(),
        };
        let diff = StorageDiff::new();
        let request = DecodeRequest {
            diff: &diff,
            layout: &layout,
            candidate_keys: &[],
            config: DecodeConfig::default(),
        };
        let err = decode(&request).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownType { .. }));
    }

    #[test]
    fn offset_overflow_is_a_fatal_error() {
        let mut types = HashMap::new();
        types.insert(
            "t_uint256".to_string(),
            TypeDescriptor::Inplace {
                label: "uint256".into(),
                size_bytes: 32,
            },
        );
        let layout = Layout {
            storage: vec![crate::layout::StorageVariable {
                label: "x".into(),
                type_id: "t_uint256".into(),
                slot: U256::ZERO,
                offset_in_slot: 1,
            }],
            types,
        };
        let diff = StorageDiff::new();
        let request = DecodeRequest {
            diff: &diff,
            layout: &layout,
            candidate_keys: &[],
            config: DecodeConfig::default(),
        };
        assert!(matches!(decode(&request), Err(LayoutError::OffsetOverflow { .. })));
    }

    #[test]
    fn packed_primitives_match_s1() {
        let mut types = HashMap::new();
        types.insert(
            "t_uint8".to_string(),
            TypeDescriptor::Inplace {
                label: "uint8".into(),
                size_bytes: 1,
            },
        );
        types.insert(
            "t_bool".to_string(),
            TypeDescriptor::Inplace {
                label: "bool".into(),
                size_bytes: 1,
            },
        );
        types.insert(
            "t_address".to_string(),
            TypeDescriptor::Inplace {
                label: "address".into(),
                size_bytes: 20,
            },
        );
        let layout = Layout {
            storage: vec![
                crate::layout::StorageVariable {
                    label: "a".into(),
                    type_id: "t_uint8".into(),
                    slot: U256::ZERO,
                    offset_in_slot: 0,
                },
                crate::layout::StorageVariable {
                    label: "b".into(),
                    type_id: "t_uint8".into(),
                    slot: U256::ZERO,
                    offset_in_slot: 1,
                },
                crate::layout::StorageVariable {
                    label: "c".into(),
                    type_id: "t_bool".into(),
                    slot: U256::ZERO,
                    offset_in_slot: 2,
                },
                crate::layout::StorageVariable {
                    label: "d".into(),
                    type_id: "t_address".into(),
                    slot: U256::ZERO,
                    offset_in_slot: 3,
                },
            ],
            types,
        };

        let mut bytes = [0u8; 32];
        bytes[31] = 42;
        bytes[30] = 123;
        bytes[29] = 1;
        for i in 0..20 {
            bytes[9 + i] = 0xca;
        }

        let mut diff = StorageDiff::new();
        diff.insert(Slot::ZERO, DiffEntry::written(B256::ZERO, B256::from(bytes)));

        let request = DecodeRequest {
            diff: &diff,
            layout: &layout,
            candidate_keys: &[],
            config: DecodeConfig::default(),
        };
        let result = decode(&request).unwrap();
        assert_eq!(result.decoded.len(), 4);
        assert!(result.unexplored_slots.is_empty());
        for label in ["a", "b", "c", "d"] {
            let Trace::Single(record) = &result.decoded[label].trace else {
                panic!("expected a single record")
            };
            assert!(record.modified);
        }
        let Trace::Single(a) = &result.decoded["a"].trace else { unreachable!() };
        assert_eq!(a.next.as_ref().unwrap().decoded, Some(DecodedValue::SmallUint(42)));
    }

    #[test]
    fn unexplored_slots_exclude_everything_claimed() {
        let mut types = HashMap::new();
        types.insert(
            "t_uint256".to_string(),
            TypeDescriptor::Inplace {
                label: "uint256".into(),
                size_bytes: 32,
            },
        );
        let layout = Layout {
            storage: vec![crate::layout::StorageVariable {
                label: "x".into(),
                type_id: "t_uint256".into(),
                slot: U256::ZERO,
                offset_in_slot: 0,
            }],
            types,
        };
        let mut diff = StorageDiff::new();
        diff.insert(Slot::ZERO, DiffEntry::read(B256::from(U256::from(1))));
        diff.insert(
            Slot::from_u256(U256::from(999)),
            DiffEntry::read(B256::from(U256::from(2))),
        );

        let request = DecodeRequest {
            diff: &diff,
            layout: &layout,
            candidate_keys: &[],
            config: DecodeConfig::default(),
        };
        let result = decode(&request).unwrap();
        assert_eq!(result.unexplored_slots, vec![Slot::from_u256(U256::from(999))]);
    }
}
