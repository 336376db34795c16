//! Memory hierarchy structure

pub mod cache;
pub mod geometry;
pub mod hierarchy;
pub mod replacement;
pub mod set;

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use geometry::Coordinates;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

impl AccessType {
    /// Decode a trace operation code (`r` or `w`, any case)
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_lowercase() {
            'r' => Some(AccessType::Read),
            'w' => Some(AccessType::Write),
            _ => None,
        }
    }

    pub fn is_write(self) -> bool {
        self == AccessType::Write
    }
}

/// One record of a memory trace
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    pub op: AccessType,
    pub address: u64,
}

impl Access {
    pub fn read(address: u64) -> Self {
        Self { op: AccessType::Read, address }
    }

    pub fn write(address: u64) -> Self {
        Self { op: AccessType::Write, address }
    }
}

/// A resident cache line.
/// Blocks only exist inside a set, so a block is always valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub tag: u64,
    /// Block-aligned address, used to re-decode the block
    /// for another level and to match future accesses
    pub block_address: u64,
    pub dirty: bool,
}

impl Block {
    pub fn make(coords: Coordinates, dirty: bool) -> Self {
        Self { tag: coords.tag, block_address: coords.block_address, dirty }
    }
}

/// Outcome of an access with respect to replacement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eviction {
    None,
    Evicted(Block),
}

impl Eviction {
    pub fn block(self) -> Option<Block> {
        match self {
            Eviction::None => None,
            Eviction::Evicted(block) => Some(block),
        }
    }

    /// The evicted block, if there is one and it must be written back
    pub fn dirty_block(self) -> Option<Block> {
        self.block().filter(|block| block.dirty)
    }
}

/// Rule governing which lines L2 holds relative to L1
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InclusionPolicy {
    #[default]
    NonInclusive,
    Inclusive,
    Exclusive,
}

impl InclusionPolicy {
    pub const ALL: [InclusionPolicy; 3] = [
        InclusionPolicy::NonInclusive,
        InclusionPolicy::Inclusive,
        InclusionPolicy::Exclusive,
    ];
}

impl FromStr for InclusionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "non-inclusive" | "noninclusive" | "nine" => {
                Ok(InclusionPolicy::NonInclusive)
            }
            "inclusive" => Ok(InclusionPolicy::Inclusive),
            "exclusive" => Ok(InclusionPolicy::Exclusive),
            _ => Err(ConfigError::UnknownInclusionPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for InclusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InclusionPolicy::NonInclusive => "non-inclusive",
            InclusionPolicy::Inclusive => "inclusive",
            InclusionPolicy::Exclusive => "exclusive",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_type_from_code() {
        assert_eq!(AccessType::from_code('r'), Some(AccessType::Read));
        assert_eq!(AccessType::from_code('W'), Some(AccessType::Write));
        assert_eq!(AccessType::from_code('x'), None);
    }

    #[test]
    fn test_inclusion_round_trip_names() {
        for inclusion in InclusionPolicy::ALL {
            let parsed: InclusionPolicy =
                inclusion.to_string().parse().unwrap();
            assert_eq!(parsed, inclusion);
        }
        assert!("strict".parse::<InclusionPolicy>().is_err());
    }

    #[test]
    fn test_dirty_block_filters_clean_evictions() {
        let clean = Block { tag: 1, block_address: 0x40, dirty: false };
        assert_eq!(Eviction::Evicted(clean).dirty_block(), None);
        assert_eq!(Eviction::None.dirty_block(), None);

        let dirty = Block { dirty: true, ..clean };
        assert_eq!(Eviction::Evicted(dirty).dirty_block(), Some(dirty));
    }
}
