//! Output data model (spec.md §3, §6.2): access records and the top-level
//! labeled-variable-access map.

use crate::{
    path::{PathSegment, render_full_expression},
    slot::Slot,
    value::DecodedValue,
};
use alloy_primitives::B256;

/// A slot's hex value, plus its decoded interpretation when decoding
/// succeeded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HexValue {
    pub hex: B256,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub decoded: Option<DecodedValue>,
}

impl HexValue {
    pub fn new(hex: B256, decoded: Option<DecodedValue>) -> Self {
        Self { hex, decoded }
    }
}

/// One observed access of a scalar, slot group, or length field (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AccessRecord {
    pub current: HexValue,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub next: Option<HexValue>,
    pub modified: bool,
    pub slots: Vec<Slot>,
    pub path: Vec<PathSegment>,
    pub full_expression: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub note: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub index: Option<alloy_primitives::U256>,
    /// Sub-records for structural kinds embedded in a mapping/array value
    /// (e.g. a struct's per-field decode; spec.md §4.6 step 4, §8 S6).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub fields: Vec<(String, AccessRecord)>,
    /// Mapping-only: the typed key sequence that led to this record,
    /// outermost first (spec.md §6.2's `keys?`).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty", default))]
    pub keys: Vec<(String, DecodedValue)>,
}

impl AccessRecord {
    /// Builds a record, deriving `modified` and `full_expression` from the
    /// given variable name and path. `checksum` controls how an address
    /// appearing in a `MappingKey` segment renders (spec.md §6.3's
    /// `addressChecksum`).
    pub fn new(
        name: &str,
        current: HexValue,
        next: Option<HexValue>,
        slots: Vec<Slot>,
        path: Vec<PathSegment>,
        checksum: bool,
    ) -> Self {
        let modified = next.is_some();
        let full_expression = render_full_expression(name, &path, checksum);
        Self {
            current,
            next,
            modified,
            slots,
            path,
            full_expression,
            note: None,
            index: None,
            fields: Vec::new(),
            keys: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_index(mut self, index: alloy_primitives::U256) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_fields(mut self, fields: Vec<(String, AccessRecord)>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_keys(mut self, keys: Vec<(String, DecodedValue)>) -> Self {
        self.keys = keys;
        self
    }
}

/// The classification of a top-level storage variable (spec.md §3, §6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VariableKind {
    Primitive,
    Struct,
    StaticArray,
    DynamicArray,
    Bytes,
    Mapping,
}

/// Either a single record (primitive/struct/bytes) or a list of records
/// (arrays/mappings), per spec.md §4.8.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Trace {
    Single(AccessRecord),
    Many(Vec<AccessRecord>),
}

/// Top-level output per storage variable (spec.md §3, §6.2).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LabeledVariableAccess {
    pub name: String,
    pub kind: VariableKind,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub r#type: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub offset: Option<u8>,
    pub trace: Trace,
}

/// `DecodeResult.decoded`, keyed by variable label (spec.md §4.8).
///
/// An ordered map so the output preserves the layout's declaration order
/// (spec.md §5) without re-sorting downstream.
pub type DecodedMap = indexmap::IndexMap<String, LabeledVariableAccess>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn modified_is_equivalent_to_next_presence() {
        let unmodified = AccessRecord::new(
            "x",
            HexValue::new(B256::ZERO, None),
            None,
            vec![],
            vec![],
            false,
        );
        assert!(!unmodified.modified);

        let modified = AccessRecord::new(
            "x",
            HexValue::new(B256::ZERO, None),
            Some(HexValue::new(B256::from(U256::from(1)), None)),
            vec![],
            vec![],
            false,
        );
        assert!(modified.modified);
    }

    #[test]
    fn full_expression_matches_name_and_path() {
        let record = AccessRecord::new(
            "balances",
            HexValue::new(B256::ZERO, None),
            None,
            vec![],
            vec![PathSegment::MappingKey {
                key: DecodedValue::SmallUint(7),
                key_type: "address".into(),
            }],
            false,
        );
        assert_eq!(record.full_expression, "balances[7]");
    }
}
