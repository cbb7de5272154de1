//! Decodes an EVM storage diff into labeled variable accesses, given a
//! storage-layout descriptor and a set of candidate mapping keys.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub use error::{LayoutError, Result};

pub mod config;
pub use config::DecodeConfig;

pub mod slot;
pub use slot::Slot;

pub mod value;
pub use value::DecodedValue;

pub mod primitive;
pub mod path;
pub use path::PathSegment;

pub mod layout;
pub use layout::{Layout, StorageVariable, StructMember, TypeDescriptor};

pub mod diff;
pub use diff::{DiffEntry, StorageDiff};

pub mod candidate_key;
pub use candidate_key::CandidateKey;

pub mod record;
pub use record::{AccessRecord, DecodedMap, LabeledVariableAccess, Trace, VariableKind};

mod classify;
mod direct;
mod dynamic_bytes;
mod array;
mod mapping_resolver;

pub mod assemble;
pub use assemble::{DecodeRequest, DecodeResult, decode};
