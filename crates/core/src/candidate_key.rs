//! Candidate mapping keys (spec.md §3, §6.1) harvested by the caller from
//! transaction inputs, addresses, and the execution stack.

use alloy_primitives::B256;

/// A 32-byte padded value that might unlock a mapping slot, optionally
/// typed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateKey {
    pub hex: B256,
    pub ty: Option<String>,
}

impl CandidateKey {
    pub fn untyped(hex: B256) -> Self {
        Self { hex, ty: None }
    }

    pub fn typed(hex: B256, ty: impl Into<String>) -> Self {
        Self {
            hex,
            ty: Some(ty.into()),
        }
    }

    /// True if the top 12 bytes are zero and the low 20 bytes look like an
    /// address — spec.md §4.6's first tie-break tier.
    pub fn is_address_shaped(&self) -> bool {
        self.hex.as_slice()[..12].iter().all(|b| *b == 0)
    }
}

/// Deduplicates candidate keys by `hex`; when a key appears both typed and
/// untyped, the typed one wins (spec.md §3).
///
/// Preserves the first-seen relative order among keys that remain, which
/// feeds directly into the BFS's stable tie-break ordering (spec.md §4.6).
pub fn dedupe_candidate_keys(keys: Vec<CandidateKey>) -> Vec<CandidateKey> {
    let mut order: Vec<B256> = Vec::new();
    let mut best: std::collections::HashMap<B256, CandidateKey> = std::collections::HashMap::new();

    for key in keys {
        match best.get(&key.hex) {
            None => {
                order.push(key.hex);
                best.insert(key.hex, key);
            }
            Some(existing) if existing.ty.is_none() && key.ty.is_some() => {
                best.insert(key.hex, key);
            }
            _ => {}
        }
    }

    order
        .into_iter()
        .map(|hex| best.remove(&hex).expect("key tracked in `order` is always present in `best`"))
        .collect()
}

/// Sorts candidate keys once, stably, by spec.md §4.6's tie-break
/// precedence: (1) address-shaped, (2) typed (any type), (3) untyped.
/// Within a class, input order (insertion order) is preserved.
pub fn sort_candidate_keys_for_bfs(mut keys: Vec<CandidateKey>) -> Vec<CandidateKey> {
    keys.sort_by_key(|k| bfs_priority(k));
    keys
}

fn bfs_priority(key: &CandidateKey) -> u8 {
    if key.is_address_shaped() {
        0
    } else if key.ty.is_some() {
        1
    } else {
        2
    }
}

/// Convenience constructor for an address-shaped candidate key.
pub fn address_key(raw: [u8; 20]) -> CandidateKey {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(&raw);
    CandidateKey::typed(B256::from(bytes), "address")
}
