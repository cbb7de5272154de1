//! Fatal, input-consistency errors (spec.md §7).
//!
//! Everything else spec.md calls an error — decode-local recoverable
//! failures and budget exhaustion — is non-fatal and accumulated inside
//! [`crate::record::AccessRecord::note`] rather than returned here.

/// A malformed [`crate::layout::Layout`] or an internal consistency
/// violation discovered while decoding. Returned from [`crate::decode`] as
/// `Err`; a well-formed input never produces one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("type id `{type_id}` referenced by the layout has no dictionary entry")]
    UnknownType { type_id: String },

    #[error(
        "variable `{variable}` has offset {offset} and would overflow its slot \
         (size {size}, offset + size must be <= 32)"
    )]
    OffsetOverflow {
        variable: String,
        offset: u8,
        size: usize,
    },

    #[error("struct member `{member}` of `{struct_type}` references an unknown type")]
    UnknownStructMember { struct_type: String, member: String },
}

pub type Result<T> = std::result::Result<T, LayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_offending_variable() {
        let err = LayoutError::OffsetOverflow {
            variable: "flags".into(),
            offset: 31,
            size: 4,
        };
        let message = err.to_string();
        assert!(message.contains("flags"));
        assert!(message.contains("31"));
    }
}
