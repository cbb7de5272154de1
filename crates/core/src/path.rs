//! Path segments and `fullExpression` rendering (spec.md §3, §6.2).

use crate::value::DecodedValue;
use alloy_primitives::U256;

/// One step in the path from a top-level variable name to a specific
/// access (struct field, array index, mapping key, or a length sentinel).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind"))]
pub enum PathSegment {
    StructField { name: String },
    ArrayIndex { index: U256 },
    /// Sentinel for a dynamic array's length slot.
    ArrayLength,
    /// Sentinel for a `bytes`/`string`'s length/short-form slot.
    BytesLength,
    MappingKey { key: DecodedValue, key_type: String },
}

impl PathSegment {
    /// Renders this segment's contribution to a `fullExpression` string.
    /// `checksum` controls whether a `MappingKey` holding an address renders
    /// EIP-55 checksummed or lower-case (spec.md §6.3's `addressChecksum`).
    pub fn render(&self, checksum: bool) -> String {
        match self {
            Self::StructField { name } => format!(".{name}"),
            Self::ArrayIndex { index } => format!("[{index}]"),
            Self::ArrayLength | Self::BytesLength => "._length".to_string(),
            Self::MappingKey { key, .. } => format!("[{}]", key.render(checksum)),
        }
    }
}

/// Renders a variable name plus an ordered path into the canonical
/// `fullExpression` (spec.md §6.2).
pub fn render_full_expression(name: &str, path: &[PathSegment], checksum: bool) -> String {
    let mut out = String::from(name);
    for segment in path {
        out.push_str(&segment.render(checksum));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_field_renders_dotted() {
        let path = vec![PathSegment::StructField {
            name: "balance".into(),
        }];
        assert_eq!(render_full_expression("userInfo", &path, false), "userInfo.balance");
    }

    #[test]
    fn array_index_renders_bracketed() {
        let path = vec![PathSegment::ArrayIndex {
            index: U256::from(3),
        }];
        assert_eq!(render_full_expression("xs", &path, false), "xs[3]");
    }

    #[test]
    fn length_sentinels_render_underscore_length() {
        assert_eq!(
            render_full_expression("xs", &[PathSegment::ArrayLength], false),
            "xs._length"
        );
        assert_eq!(
            render_full_expression("name", &[PathSegment::BytesLength], false),
            "name._length"
        );
    }

    #[test]
    fn mapping_key_renders_decoded_value() {
        use alloy_primitives::address;
        let path = vec![PathSegment::MappingKey {
            key: DecodedValue::Address(address!("0x00000000000000000000000000000000000000aa")),
            key_type: "address".into(),
        }];
        assert_eq!(
            render_full_expression("balances", &path, false),
            "balances[0x00000000000000000000000000000000000000aa]"
        );
    }

    #[test]
    fn mapping_key_renders_checksummed_address_when_enabled() {
        use alloy_primitives::address;
        // EIP-55 worked example (from the EIP's own test vectors).
        let path = vec![PathSegment::MappingKey {
            key: DecodedValue::Address(address!("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")),
            key_type: "address".into(),
        }];
        assert_eq!(
            render_full_expression("balances", &path, true),
            "balances[0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed]"
        );
    }

    #[test]
    fn nested_mapping_keys_render_in_order() {
        let path = vec![
            PathSegment::MappingKey {
                key: DecodedValue::SmallUint(1),
                key_type: "address".into(),
            },
            PathSegment::MappingKey {
                key: DecodedValue::SmallUint(2),
                key_type: "address".into(),
            },
        ];
        assert_eq!(render_full_expression("allowances", &path, false), "allowances[1][2]");
    }
}
