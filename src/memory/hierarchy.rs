//! Two-level cache hierarchy
//!
//! Every access is classified by where its line currently lives,
//! then dispatched according to the inclusion policy.

use super::cache::CacheLevel;
use super::geometry::Coordinates;
use super::{AccessType, Eviction, InclusionPolicy};
use crate::config::SimConfig;
use crate::error::{MemoryError, SimulatorResult};

/// Where the line of an access lives before the access
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Residency {
    Both,
    L1Only,
    L2Only,
    Neither,
}

/// L1, an optional L2, and the rule tying them together
#[derive(Debug)]
pub struct Hierarchy {
    l1: CacheLevel,
    l2: Option<CacheLevel>,
    inclusion: InclusionPolicy,
}

impl Hierarchy {
    /// The configuration must have been validated
    pub fn make(config: &SimConfig) -> Self {
        let l1 =
            CacheLevel::make("L1", config.block_size, config.l1, config.replacement);
        let l2 = config.l2.map(|l2| {
            CacheLevel::make("L2", config.block_size, l2, config.replacement)
        });
        Self { l1, l2, inclusion: config.inclusion }
    }

    pub fn l1(&self) -> &CacheLevel {
        &self.l1
    }

    pub fn l2(&self) -> Option<&CacheLevel> {
        self.l2.as_ref()
    }

    pub fn inclusion(&self) -> InclusionPolicy {
        self.inclusion
    }

    /// Block-aligned form of an address; the block size is shared
    pub fn block_address(&self, address: u64) -> u64 {
        self.l1.geometry().block_address(address)
    }

    /// Advance the trace position of every level
    pub fn advance(&mut self) {
        self.l1.advance();
        if let Some(l2) = &mut self.l2 {
            l2.advance();
        }
    }

    pub fn residency(&self, address: u64) -> Residency {
        let in_l1 = self.l1.contains(self.l1.decode(address));
        let in_l2 = self
            .l2
            .as_ref()
            .is_some_and(|l2| l2.contains(l2.decode(address)));
        match (in_l1, in_l2) {
            (true, true) => Residency::Both,
            (true, false) => Residency::L1Only,
            (false, true) => Residency::L2Only,
            (false, false) => Residency::Neither,
        }
    }

    /// Apply one trace record to the hierarchy.
    /// `trace` holds the block addresses of the whole trace.
    pub fn access(&mut self, op: AccessType, address: u64, trace: &[u64]) {
        let l1_coords = self.l1.decode(address);
        let l2_coords = match &self.l2 {
            Some(l2) => l2.decode(address),
            None => {
                self.l1.access(op, l1_coords, trace);
                return;
            }
        };

        let residency = self.residency(address);
        log::trace!("{:?} {:#x}: {:?}", op, address, residency);

        match self.inclusion {
            InclusionPolicy::NonInclusive | InclusionPolicy::Inclusive => {
                self.access_shared(op, residency, l1_coords, l2_coords, trace)
            }
            InclusionPolicy::Exclusive => self
                .access_exclusive(op, residency, l1_coords, l2_coords, trace),
        }
    }

    /// Lines may live in both levels.
    /// Inclusive mode takes the same path: an L1-only line is
    /// handled as in non-inclusive mode and L2 never back-invalidates.
    fn access_shared(
        &mut self,
        op: AccessType,
        residency: Residency,
        l1_coords: Coordinates,
        l2_coords: Coordinates,
        trace: &[u64],
    ) {
        match residency {
            Residency::Both | Residency::L1Only => {
                let eviction = self.l1.access(op, l1_coords, trace);
                self.write_back(eviction, trace);
            }
            Residency::L2Only => {
                // Read before move-in
                if op.is_write() {
                    self.l2_mut().record_read();
                }
                let eviction = self.l1.access(op, l1_coords, trace);
                self.write_back(eviction, trace);
                self.l2_mut().access(op, l2_coords, trace);
            }
            Residency::Neither => {
                let eviction = self.l1.access(op, l1_coords, trace);
                self.write_back(eviction, trace);
                self.l2_mut().access(AccessType::Read, l2_coords, trace);
            }
        }
    }

    /// A line lives in at most one level
    fn access_exclusive(
        &mut self,
        op: AccessType,
        residency: Residency,
        l1_coords: Coordinates,
        l2_coords: Coordinates,
        trace: &[u64],
    ) {
        match residency {
            Residency::Both | Residency::L1Only => {
                let eviction = self.l1.access(op, l1_coords, trace);
                self.demote(eviction, trace);
            }
            Residency::L2Only => {
                // Move the line up, carrying its dirty bit
                let l2 = self.l2_mut();
                l2.access(AccessType::Read, l2_coords, trace);
                let moved = l2.invalidate(l2_coords);

                let eviction = self.l1.access(op, l1_coords, trace);
                if moved.is_some_and(|block| block.dirty) {
                    self.l1.mark_dirty(l1_coords);
                }
                self.demote(eviction, trace);
            }
            Residency::Neither => {
                // Fetched from memory straight into L1
                self.l2_mut().record_miss_without_fill(AccessType::Read);
                let eviction = self.l1.access(op, l1_coords, trace);
                self.demote(eviction, trace);
            }
        }
    }

    fn l2_mut(&mut self) -> &mut CacheLevel {
        self.l2.as_mut().expect("two-level dispatch without an L2")
    }

    /// Forward a dirty L1 victim to L2
    fn write_back(&mut self, eviction: Eviction, trace: &[u64]) {
        if let Some(block) = eviction.dirty_block() {
            log::debug!("writing back {:#x} to L2", block.block_address);
            let l2 = self.l2_mut();
            let coords = l2.decode(block.block_address);
            l2.access(AccessType::Write, coords, trace);
        }
    }

    /// Place every L1 victim into L2
    fn demote(&mut self, eviction: Eviction, trace: &[u64]) {
        if let Some(block) = eviction.block() {
            log::debug!(
                "demoting {:#x} to L2 (dirty = {})",
                block.block_address,
                block.dirty
            );
            self.l2_mut().demote(block, trace);
        }
    }

    /// Check that exclusive mode never holds a line in both levels.
    /// The other modes allow any placement.
    pub fn verify_inclusion(&self) -> SimulatorResult<()> {
        let Some(l2) = &self.l2 else {
            return Ok(());
        };
        if self.inclusion != InclusionPolicy::Exclusive {
            return Ok(());
        }

        for block in self.l1.sets().iter().flat_map(|set| set.blocks()) {
            let address = block.block_address;
            if l2.contains(l2.decode(address)) {
                return Err(MemoryError::CacheInconsistency(
                    2,
                    format!(
                        "Cache level 2 duplicates address {:#010x} found in level 1",
                        address
                    ),
                )
                .into());
            }
        }

        Ok(())
    }
}
