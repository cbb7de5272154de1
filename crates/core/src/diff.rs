//! The raw storage diff (spec.md §3, §6.1): a map from slot to its
//! pre/post-transaction 32-byte values.

use crate::slot::Slot;
use alloy_primitives::B256;
use std::collections::BTreeMap;

/// `current`/`next` values observed for one slot.
///
/// `next` is present iff the slot was written during the transaction;
/// `modified` downstream is always equivalent to `next.is_some()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiffEntry {
    pub current: B256,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub next: Option<B256>,
}

impl DiffEntry {
    pub fn read(current: B256) -> Self {
        Self {
            current,
            next: None,
        }
    }

    pub fn written(current: B256, next: B256) -> Self {
        Self {
            current,
            next: Some(next),
        }
    }

    pub fn modified(&self) -> bool {
        self.next.is_some()
    }

    /// The value this slot held after the transaction, falling back to
    /// `current` when the slot was only read.
    pub fn effective(&self) -> B256 {
        self.next.unwrap_or(self.current)
    }
}

/// The per-account storage diff fed to [`crate::decode`].
///
/// An ordered map keeps slot iteration deterministic without relying on
/// hash-map iteration order, consistent with spec.md §5's determinism
/// requirement.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StorageDiff(BTreeMap<Slot, DiffEntry>);

impl StorageDiff {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, slot: Slot, entry: DiffEntry) -> &mut Self {
        self.0.insert(slot, entry);
        self
    }

    pub fn get(&self, slot: &Slot) -> Option<&DiffEntry> {
        self.0.get(slot)
    }

    pub fn contains(&self, slot: &Slot) -> bool {
        self.0.contains_key(slot)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Slot> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Slot, DiffEntry)> for StorageDiff {
    fn from_iter<I: IntoIterator<Item = (Slot, DiffEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
