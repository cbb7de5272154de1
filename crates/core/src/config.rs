//! Decode-time configuration knobs (spec.md §6.3).

/// Tunables for one [`crate::decode`] call. All fields have the defaults
/// spec.md documents; construct with [`DecodeConfig::default`] and override
/// individual fields, or use the builder-style `with_*` methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecodeConfig {
    /// Hard cap on key probes across all nested mappings of one variable.
    pub mapping_exploration_limit: usize,
    /// BFS depth limit per mapping variable.
    pub max_mapping_depth: usize,
    /// Per-variable cap on matches before BFS stops early.
    pub early_termination_threshold: usize,
    /// Emit addresses in EIP-55 checksum form instead of lower-case.
    pub address_checksum: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            mapping_exploration_limit: 10_000,
            max_mapping_depth: 5,
            early_termination_threshold: 1_000,
            address_checksum: false,
        }
    }
}

impl DecodeConfig {
    pub fn with_mapping_exploration_limit(mut self, limit: usize) -> Self {
        self.mapping_exploration_limit = limit;
        self
    }

    pub fn with_max_mapping_depth(mut self, depth: usize) -> Self {
        self.max_mapping_depth = depth;
        self
    }

    pub fn with_early_termination_threshold(mut self, threshold: usize) -> Self {
        self.early_termination_threshold = threshold;
        self
    }

    pub fn with_address_checksum(mut self, enabled: bool) -> Self {
        self.address_checksum = enabled;
        self
    }
}
