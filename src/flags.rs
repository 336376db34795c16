use std::path::PathBuf;

use crate::config::{LevelConfig, SimConfig};
use crate::memory::replacement::ReplacementPolicyKind;
use crate::memory::InclusionPolicy;

xflags::xflags! {
    /// Trace-driven two-level cache hierarchy simulator.
    cmd CacheSimArgs {
        /// Block size in bytes, shared by both levels.
        required block_size: u64
        /// L1 size in bytes.
        required l1_size: u64
        /// L1 associativity.
        required l1_assoc: usize
        /// L2 size in bytes, 0 for a single-level hierarchy.
        required l2_size: u64
        /// L2 associativity.
        required l2_assoc: usize
        /// Replacement policy: LRU, FIFO, optimal, MRU or LIFO.
        required replacement: ReplacementPolicyKind
        /// Inclusion property: non-inclusive, inclusive or exclusive.
        required inclusion: InclusionPolicy
        /// Path to the trace file.
        required trace_file: PathBuf

        /// Also write the raw results to a CSV file.
        optional --csv path: PathBuf

        /// Enables verbose mode, logging evictions during simulation.
        /// Largely used for debugging purposes.
        optional -v, --verbose
    }
}

impl CacheSimArgs {
    pub fn config(&self) -> SimConfig {
        SimConfig::make(
            self.block_size,
            LevelConfig::make(self.l1_size, self.l1_assoc),
            LevelConfig::make(self.l2_size, self.l2_assoc),
            self.replacement,
            self.inclusion,
        )
    }
}
