//! Cache level implementation

use super::geometry::{Coordinates, Geometry};
use super::replacement::{
    Lookahead, ReplacementPolicy, ReplacementPolicyKind,
};
use super::set::CacheSet;
use super::{AccessType, Block, Eviction};
use crate::config::LevelConfig;

/// A single set-associative cache level
#[derive(Debug)]
pub struct CacheLevel {
    pub name: &'static str,

    geometry: Geometry,
    replacement: Box<dyn ReplacementPolicy>,
    sets: Vec<CacheSet>,

    /// Index of the current record in the global trace
    position: usize,

    stats: LevelStats,
}

impl CacheLevel {
    /// The configuration must have been validated
    pub fn make(
        name: &'static str,
        block_size: u64,
        config: LevelConfig,
        replacement: ReplacementPolicyKind,
    ) -> Self {
        let num_sets = config.num_sets(block_size);
        assert!(num_sets > 0, "{} has no sets", name);

        Self {
            name,
            geometry: Geometry::new(block_size, num_sets),
            replacement: replacement.build(),
            sets: vec![CacheSet::new(config.associativity); num_sets],
            position: 0,
            stats: LevelStats::default(),
        }
    }

    pub fn decode(&self, address: u64) -> Coordinates {
        self.geometry.decode(address)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn stats(&self) -> &LevelStats {
        &self.stats
    }

    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Move on to the next trace record
    pub fn advance(&mut self) {
        self.position += 1;
    }

    pub fn contains(&self, coords: Coordinates) -> bool {
        self.sets[coords.set].contains(coords.tag)
    }

    /// Apply a read or write to the block at `coords`.
    /// `trace` holds the block addresses of the whole trace,
    /// only the optimal policy looks at it.
    pub fn access(
        &mut self,
        op: AccessType,
        coords: Coordinates,
        trace: &[u64],
    ) -> Eviction {
        self.stats.record_access(op);

        let set = &mut self.sets[coords.set];
        if let Some(way) = set.position(coords.tag) {
            if op.is_write() {
                set.mark_dirty(way);
            }
            if self.replacement.promotes_on_hit() {
                set.promote(way);
            }
            return Eviction::None;
        }

        self.stats.record_miss(op);
        self.fill(coords.set, Block::make(coords, op.is_write()), trace)
    }

    /// Place a block evicted from the level above.
    /// A dirty block arrives as a write, a clean one is installed
    /// without being counted.
    pub fn demote(&mut self, block: Block, trace: &[u64]) -> Eviction {
        let coords = self.decode(block.block_address);
        if block.dirty {
            return self.access(AccessType::Write, coords, trace);
        }
        if self.contains(coords) {
            return Eviction::None;
        }
        self.fill(coords.set, Block::make(coords, false), trace)
    }

    /// Drop a resident block without touching the counters
    pub fn invalidate(&mut self, coords: Coordinates) -> Option<Block> {
        let set = &mut self.sets[coords.set];
        set.position(coords.tag).map(|way| set.remove(way))
    }

    /// Mark a resident block dirty without counting an access.
    /// Returns false if the block is not resident.
    pub fn mark_dirty(&mut self, coords: Coordinates) -> bool {
        let set = &mut self.sets[coords.set];
        match set.position(coords.tag) {
            Some(way) => {
                set.mark_dirty(way);
                true
            }
            None => false,
        }
    }

    /// Count an access that misses here but is not allocated here
    pub fn record_miss_without_fill(&mut self, op: AccessType) {
        self.stats.record_access(op);
        self.stats.record_miss(op);
    }

    /// Count a read that moves nothing
    pub fn record_read(&mut self) {
        self.stats.reads += 1;
    }

    fn fill(&mut self, index: usize, block: Block, trace: &[u64]) -> Eviction {
        let set = &mut self.sets[index];
        if !set.is_full() {
            set.push_front(block);
            return Eviction::None;
        }

        let lookahead = Lookahead::new(trace, self.position);
        let way = self.replacement.select_victim(set, &lookahead);
        let victim = if self.replacement.fills_in_place() {
            set.replace(way, block)
        } else {
            let victim = set.remove(way);
            set.push_front(block);
            victim
        };

        if victim.dirty {
            self.stats.writebacks += 1;
        }
        log::trace!(
            "{}: set {} evicts tag {:#x} (dirty = {})",
            self.name,
            index,
            victim.tag,
            victim.dirty
        );
        Eviction::Evicted(victim)
    }
}

/// Per-level counters
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct LevelStats {
    pub reads: u64,
    pub read_misses: u64,
    pub writes: u64,
    pub write_misses: u64,
    pub writebacks: u64,
}

impl LevelStats {
    fn record_access(&mut self, op: AccessType) {
        match op {
            AccessType::Read => self.reads += 1,
            AccessType::Write => self.writes += 1,
        }
    }

    fn record_miss(&mut self, op: AccessType) {
        match op {
            AccessType::Read => self.read_misses += 1,
            AccessType::Write => self.write_misses += 1,
        }
    }

    pub fn accesses(&self) -> u64 {
        self.reads + self.writes
    }

    pub fn misses(&self) -> u64 {
        self.read_misses + self.write_misses
    }

    /// Combined read and write miss rate
    pub fn get_miss_rate(&self) -> f64 {
        match self.accesses() {
            0 => 0.0,
            accesses => self.misses() as f64 / accesses as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_TRACE: &[u64] = &[];

    fn level(
        size: u64,
        associativity: usize,
        kind: ReplacementPolicyKind,
    ) -> CacheLevel {
        CacheLevel::make("L1", 16, LevelConfig::make(size, associativity), kind)
    }

    /// Tags of a set, head first
    fn tags(cache: &CacheLevel, set: usize) -> Vec<u64> {
        cache.sets()[set].tags().copied().collect()
    }

    fn read(cache: &mut CacheLevel, address: u64) -> Eviction {
        let coords = cache.decode(address);
        cache.access(AccessType::Read, coords, NO_TRACE)
    }

    fn write(cache: &mut CacheLevel, address: u64) -> Eviction {
        let coords = cache.decode(address);
        cache.access(AccessType::Write, coords, NO_TRACE)
    }

    #[test]
    fn test_direct_mapped_example() {
        let mut cache = level(256, 1, ReplacementPolicyKind::Lru);
        assert_eq!(cache.sets().len(), 16);

        read(&mut cache, 0x0);
        read(&mut cache, 0x10);
        read(&mut cache, 0x0);

        let stats = cache.stats();
        assert_eq!(stats.reads, 3);
        assert_eq!(stats.read_misses, 2);
        assert_eq!(format!("{:.6}", stats.get_miss_rate()), "0.666667");
    }

    #[test]
    fn test_lru_hit_promotes_and_protects() {
        // One set, 2 ways: 0x00, 0x10, 0x20 all collide
        let mut cache = level(32, 2, ReplacementPolicyKind::Lru);
        read(&mut cache, 0x00);
        read(&mut cache, 0x10);
        assert_eq!(tags(&cache, 0), vec![1, 0]);

        read(&mut cache, 0x00);
        assert_eq!(tags(&cache, 0), vec![0, 1]);

        let evicted = read(&mut cache, 0x20).block().unwrap();
        assert_eq!(evicted.tag, 1);
        assert_eq!(tags(&cache, 0), vec![2, 0]);
    }

    #[test]
    fn test_fifo_hits_do_not_reorder() {
        let mut cache = level(32, 2, ReplacementPolicyKind::Fifo);
        read(&mut cache, 0x00);
        read(&mut cache, 0x10);
        read(&mut cache, 0x00);
        assert_eq!(tags(&cache, 0), vec![1, 0]);

        let evicted = read(&mut cache, 0x20).block().unwrap();
        assert_eq!(evicted.tag, 0);
        assert_eq!(tags(&cache, 0), vec![2, 1]);
    }

    #[test]
    fn test_mru_evicts_most_recent() {
        let mut cache = level(32, 2, ReplacementPolicyKind::Mru);
        read(&mut cache, 0x00);
        read(&mut cache, 0x10);
        read(&mut cache, 0x00);
        let evicted = read(&mut cache, 0x20).block().unwrap();
        assert_eq!(evicted.tag, 0);
        assert_eq!(tags(&cache, 0), vec![2, 1]);
    }

    #[test]
    fn test_lifo_evicts_last_inserted() {
        let mut cache = level(32, 2, ReplacementPolicyKind::Lifo);
        read(&mut cache, 0x00);
        read(&mut cache, 0x10);
        read(&mut cache, 0x00);
        let evicted = read(&mut cache, 0x20).block().unwrap();
        assert_eq!(evicted.tag, 1);
        assert_eq!(tags(&cache, 0), vec![2, 0]);
    }

    #[test]
    fn test_optimal_uses_position_and_keeps_slot() {
        let mut cache = level(32, 2, ReplacementPolicyKind::Optimal);
        // 0x00 comes back, 0x10 never does
        let trace = [0x00, 0x10, 0x20, 0x00];
        for &address in &trace[..2] {
            let coords = cache.decode(address);
            cache.access(AccessType::Read, coords, &trace);
            cache.advance();
        }
        assert_eq!(tags(&cache, 0), vec![1, 0]);

        let coords = cache.decode(0x20);
        let evicted = cache.access(AccessType::Read, coords, &trace);
        assert_eq!(evicted.block().map(|b| b.tag), Some(1));
        assert_eq!(tags(&cache, 0), vec![2, 0]);
        assert_eq!(cache.position(), 2);
    }

    #[test]
    fn test_write_marks_dirty_and_counts_writeback() {
        let mut cache = level(16, 1, ReplacementPolicyKind::Lru);
        assert_eq!(write(&mut cache, 0x00), Eviction::None);
        assert_eq!(cache.stats().write_misses, 1);

        read(&mut cache, 0x04);
        assert_eq!(cache.stats().read_misses, 0);

        let evicted = read(&mut cache, 0x10);
        assert_eq!(
            evicted,
            Eviction::Evicted(Block { tag: 0, block_address: 0, dirty: true })
        );
        assert_eq!(cache.stats().writebacks, 1);

        // Clean victim
        read(&mut cache, 0x20);
        assert_eq!(cache.stats().writebacks, 1);
    }

    #[test]
    fn test_write_hit_dirties_resident_block() {
        let mut cache = level(64, 2, ReplacementPolicyKind::Lru);
        read(&mut cache, 0x40);
        write(&mut cache, 0x44);
        let block = cache.sets()[0].get(0).unwrap();
        assert!(block.dirty);
        assert_eq!(cache.stats().writes, 1);
        assert_eq!(cache.stats().write_misses, 0);
    }

    #[test]
    fn test_sets_never_overflow() {
        let mut cache = level(128, 4, ReplacementPolicyKind::Fifo);
        for i in 0..200u64 {
            let address = (i * 0x34) % 0x800;
            if i % 3 == 0 {
                write(&mut cache, address);
            } else {
                read(&mut cache, address);
            }
        }
        for set in cache.sets() {
            assert!(set.len() <= 4);
            assert!(set.is_consistent());
        }
        let stats = cache.stats();
        assert_eq!(stats.accesses(), 200);
        assert!(stats.read_misses <= stats.reads);
        assert!(stats.write_misses <= stats.writes);
    }

    #[test]
    fn test_invalidate_and_demote() {
        let mut cache = level(32, 2, ReplacementPolicyKind::Lru);
        read(&mut cache, 0x10);
        let coords = cache.decode(0x10);
        assert!(cache.invalidate(coords).is_some());
        assert!(!cache.contains(coords));
        assert!(cache.invalidate(coords).is_none());

        let clean = Block { tag: 0, block_address: 0x30, dirty: false };
        cache.demote(clean, NO_TRACE);
        assert!(cache.contains(cache.decode(0x30)));
        assert_eq!(cache.stats().accesses(), 1);

        let dirty = Block { tag: 0, block_address: 0x50, dirty: true };
        cache.demote(dirty, NO_TRACE);
        assert_eq!(cache.stats().writes, 1);
        assert_eq!(cache.stats().write_misses, 1);
    }
}
