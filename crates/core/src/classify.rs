//! Layout classifier (C4, spec.md §4.4).
//!
//! Partitions a layout's variables into the four buckets the assembler
//! drives separately, and orders mappings by nesting depth so shallow
//! mappings resolve (and claim slots) before deep ones.

use crate::layout::{Layout, StorageVariable, TypeDescriptor};

/// The four buckets C5/C6/C7 each own a slice of.
#[derive(Debug, Default)]
pub struct ClassifiedLayout<'a> {
    /// Primitives, structs, and static arrays — anything C5/C7 resolves
    /// directly from the variable's own base slot.
    pub direct: Vec<&'a StorageVariable>,
    pub bytes_like: Vec<&'a StorageVariable>,
    pub dynamic_arrays: Vec<&'a StorageVariable>,
    /// Ordered by ascending `mapping(` nesting depth (spec.md §4.4).
    pub mappings: Vec<&'a StorageVariable>,
}

/// Classifies every variable in `layout`. Variables referencing an unknown
/// `type_id` are skipped here; C8 surfaces that as a fatal
/// [`crate::error::LayoutError::UnknownType`] before classification even
/// starts.
pub fn classify(layout: &Layout) -> ClassifiedLayout<'_> {
    let mut classified = ClassifiedLayout::default();

    for variable in &layout.storage {
        let Some(descriptor) = layout.type_of(&variable.type_id) else {
            continue;
        };
        match descriptor {
            TypeDescriptor::Inplace { .. }
            | TypeDescriptor::InplaceStruct { .. }
            | TypeDescriptor::InplaceStaticArray { .. } => classified.direct.push(variable),
            TypeDescriptor::Bytes { .. } => classified.bytes_like.push(variable),
            TypeDescriptor::DynamicArray { .. } => classified.dynamic_arrays.push(variable),
            TypeDescriptor::Mapping { .. } => classified.mappings.push(variable),
        }
    }

    classified.mappings.sort_by_key(|variable| {
        layout
            .type_of(&variable.type_id)
            .map(TypeDescriptor::mapping_nesting_depth)
            .unwrap_or(0)
    });

    classified
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use std::collections::HashMap;

    fn variable(label: &str, type_id: &str, slot: u64) -> StorageVariable {
        StorageVariable {
            label: label.into(),
            type_id: type_id.into(),
            slot: U256::from(slot),
            offset_in_slot: 0,
        }
    }

    #[test]
    fn buckets_variables_by_descriptor_kind() {
        let mut types = HashMap::new();
        types.insert(
            "t_uint256".to_string(),
            TypeDescriptor::Inplace {
                label: "uint256".into(),
                size_bytes: 32,
            },
        );
        types.insert(
            "t_bytes_storage".to_string(),
            TypeDescriptor::Bytes { label: "bytes".into() },
        );
        types.insert(
            "t_array_uint256_dyn".to_string(),
            TypeDescriptor::DynamicArray {
                label: "uint256[]".into(),
                base_type_id: "t_uint256".into(),
            },
        );
        types.insert(
            "t_mapping_1".to_string(),
            TypeDescriptor::Mapping {
                label: "mapping(address => uint256)".into(),
                key_type_id: "t_address".into(),
                value_type_id: "t_uint256".into(),
            },
        );
        types.insert(
            "t_mapping_2".to_string(),
            TypeDescriptor::Mapping {
                label: "mapping(address => mapping(address => uint256))".into(),
                key_type_id: "t_address".into(),
                value_type_id: "t_mapping_1".into(),
            },
        );

        let layout = Layout {
            storage: vec![
                variable("total", "t_uint256", 0),
                variable("name", "t_bytes_storage", 1),
                variable("xs", "t_array_uint256_dyn", 2),
                variable("allowances", "t_mapping_2", 3),
                variable("balances", "t_mapping_1", 4),
            ],
            types,
        };

        let classified = classify(&layout);
        assert_eq!(classified.direct.len(), 1);
        assert_eq!(classified.bytes_like.len(), 1);
        assert_eq!(classified.dynamic_arrays.len(), 1);
        assert_eq!(classified.mappings.len(), 2);
        // Single-level `balances` (depth 1) must precede nested `allowances` (depth 2).
        assert_eq!(classified.mappings[0].label, "balances");
        assert_eq!(classified.mappings[1].label, "allowances");
    }

    #[test]
    fn unknown_type_id_is_skipped_not_panicked() {
        let layout = Layout {
            storage: vec![variable("ghost", "t_missing", 0)],
            types: HashMap::new(),
        };
        let classified = classify(&layout);
        assert!(classified.direct.is_empty());
        assert!(classified.mappings.is_empty());
    }
}
