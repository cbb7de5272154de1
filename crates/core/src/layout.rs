//! The storage-layout descriptor (spec.md §3, §6.1) — a solc-shaped type
//! dictionary plus the list of top-level storage variables.

use crate::slot::Slot;
use alloy_primitives::U256;
use std::collections::HashMap;

/// A Solidity type identifier, as assigned by the compiler (e.g.
/// `t_mapping(t_address,t_uint256)`). Opaque to this crate beyond
/// referential consistency: every `type_id` reachable from a
/// [`StorageVariable`] or nested [`TypeDescriptor`] must have an entry in
/// [`Layout::types`].
pub type TypeId = String;

/// One contract's storage layout: its top-level variables and the type
/// dictionary they reference.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    pub storage: Vec<StorageVariable>,
    pub types: HashMap<TypeId, TypeDescriptor>,
}

impl Layout {
    pub fn type_of(&self, type_id: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_id)
    }
}

/// A top-level storage variable declared by a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StorageVariable {
    pub label: String,
    #[cfg_attr(feature = "serde", serde(rename = "typeId"))]
    pub type_id: TypeId,
    #[cfg_attr(feature = "serde", serde(with = "crate::layout::u256_decimal"))]
    pub slot: U256,
    #[cfg_attr(feature = "serde", serde(rename = "offsetInSlot", default))]
    pub offset_in_slot: u8,
}

impl StorageVariable {
    pub fn base_slot(&self) -> Slot {
        Slot::from_u256(self.slot)
    }
}

/// A member of an `InplaceStruct`, positioned relative to the struct's base
/// slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructMember {
    pub label: String,
    #[cfg_attr(feature = "serde", serde(rename = "typeId"))]
    pub type_id: TypeId,
    #[cfg_attr(feature = "serde", serde(rename = "slotRelative"))]
    pub slot_relative: u64,
    #[cfg_attr(feature = "serde", serde(rename = "offsetInSlot", default))]
    pub offset_in_slot: u8,
}

/// One entry in the type dictionary (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind"))]
pub enum TypeDescriptor {
    Inplace {
        label: String,
        #[cfg_attr(feature = "serde", serde(rename = "sizeBytes"))]
        size_bytes: u8,
    },
    InplaceStruct {
        label: String,
        #[cfg_attr(feature = "serde", serde(rename = "sizeBytes"))]
        size_bytes: u64,
        members: Vec<StructMember>,
    },
    InplaceStaticArray {
        label: String,
        #[cfg_attr(feature = "serde", serde(rename = "sizeBytes"))]
        size_bytes: u64,
        #[cfg_attr(feature = "serde", serde(rename = "baseTypeId"))]
        base_type_id: TypeId,
    },
    Bytes {
        label: String,
    },
    DynamicArray {
        label: String,
        #[cfg_attr(feature = "serde", serde(rename = "baseTypeId"))]
        base_type_id: TypeId,
    },
    Mapping {
        label: String,
        #[cfg_attr(feature = "serde", serde(rename = "keyTypeId"))]
        key_type_id: TypeId,
        #[cfg_attr(feature = "serde", serde(rename = "valueTypeId"))]
        value_type_id: TypeId,
    },
}

impl TypeDescriptor {
    pub fn label(&self) -> &str {
        match self {
            Self::Inplace { label, .. }
            | Self::InplaceStruct { label, .. }
            | Self::InplaceStaticArray { label, .. }
            | Self::Bytes { label }
            | Self::DynamicArray { label, .. }
            | Self::Mapping { label, .. } => label,
        }
    }

    /// Number of `mapping(` occurrences in this type's label — used by C4
    /// to order mapping variables by nesting depth.
    pub fn mapping_nesting_depth(&self) -> usize {
        self.label().matches("mapping(").count()
    }
}

#[cfg(feature = "serde")]
mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &U256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        let s = String::deserialize(d)?;
        U256::from_str_radix(s.trim_start_matches("0x"), if s.starts_with("0x") { 16 } else { 10 })
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_nesting_depth_counts_occurrences() {
        let single = TypeDescriptor::Mapping {
            label: "mapping(address => uint256)".into(),
            key_type_id: "t_address".into(),
            value_type_id: "t_uint256".into(),
        };
        assert_eq!(single.mapping_nesting_depth(), 1);

        let nested = TypeDescriptor::Mapping {
            label: "mapping(address => mapping(address => uint256))".into(),
            key_type_id: "t_address".into(),
            value_type_id: "t_mapping".into(),
        };
        assert_eq!(nested.mapping_nesting_depth(), 2);
    }

    #[test]
    fn type_of_looks_up_by_id() {
        let mut types = HashMap::new();
        types.insert(
            "t_uint256".to_string(),
            TypeDescriptor::Inplace {
                label: "uint256".into(),
                size_bytes: 32,
            },
        );
        let layout = Layout {
            storage: vec![],
            types,
        };
        assert!(layout.type_of("t_uint256").is_some());
        assert!(layout.type_of("t_missing").is_none());
    }
}
