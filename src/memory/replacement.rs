//! Replacement policies
//!
//! A policy only decides which block of a full set leaves.
//! Counting misses and writebacks is the job of the cache level.

use std::fmt;
use std::str::FromStr;

use super::set::CacheSet;
use crate::error::ConfigError;

/// Read-only view of the part of the trace that has not been replayed yet,
/// as block-aligned addresses. The current access is included.
#[derive(Clone, Copy, Debug)]
pub struct Lookahead<'a> {
    remaining: &'a [u64],
}

impl<'a> Lookahead<'a> {
    pub fn new(trace: &'a [u64], position: usize) -> Self {
        Self { remaining: trace.get(position..).unwrap_or(&[]) }
    }

    pub fn empty() -> Self {
        Self { remaining: &[] }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Distance to the next access of `block_address`, if any
    pub fn next_use(&self, block_address: u64) -> Option<usize> {
        self.remaining.iter().position(|&address| address == block_address)
    }
}

pub trait ReplacementPolicy: fmt::Debug {
    fn kind(&self) -> ReplacementPolicyKind;

    /// Whether a hit moves the block to the head of its set
    fn promotes_on_hit(&self) -> bool {
        false
    }

    /// Whether the incoming block takes the victim's slot
    /// instead of becoming the new head
    fn fills_in_place(&self) -> bool {
        false
    }

    /// Pick the way to evict from a full set
    fn select_victim(&self, set: &CacheSet, lookahead: &Lookahead) -> usize;
}

fn tail(set: &CacheSet) -> usize {
    set.len().saturating_sub(1)
}

#[derive(Debug, Default)]
pub struct Lru;

impl ReplacementPolicy for Lru {
    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::Lru
    }

    fn promotes_on_hit(&self) -> bool {
        true
    }

    fn select_victim(&self, set: &CacheSet, _: &Lookahead) -> usize {
        tail(set)
    }
}

#[derive(Debug, Default)]
pub struct Fifo;

impl ReplacementPolicy for Fifo {
    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::Fifo
    }

    fn select_victim(&self, set: &CacheSet, _: &Lookahead) -> usize {
        tail(set)
    }
}

#[derive(Debug, Default)]
pub struct Mru;

impl ReplacementPolicy for Mru {
    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::Mru
    }

    fn promotes_on_hit(&self) -> bool {
        true
    }

    fn select_victim(&self, _: &CacheSet, _: &Lookahead) -> usize {
        0
    }
}

#[derive(Debug, Default)]
pub struct Lifo;

impl ReplacementPolicy for Lifo {
    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::Lifo
    }

    fn select_victim(&self, _: &CacheSet, _: &Lookahead) -> usize {
        0
    }
}

/// Belady's optimal policy.
///
/// The set order never changes under this policy, so ties resolve
/// by the order blocks were first placed in the set.
#[derive(Debug, Default)]
pub struct Optimal;

impl ReplacementPolicy for Optimal {
    fn kind(&self) -> ReplacementPolicyKind {
        ReplacementPolicyKind::Optimal
    }

    fn fills_in_place(&self) -> bool {
        true
    }

    fn select_victim(&self, set: &CacheSet, lookahead: &Lookahead) -> usize {
        if lookahead.is_exhausted() {
            return tail(set);
        }

        let mut victim = None;
        let mut furthest = 0;
        for (way, block) in set.blocks().enumerate() {
            match lookahead.next_use(block.block_address) {
                // Never used again
                None => return way,
                Some(distance) => {
                    if victim.is_none() || distance > furthest {
                        furthest = distance;
                        victim = Some(way);
                    }
                }
            }
        }

        victim.unwrap_or_else(|| tail(set))
    }
}

/// Replacement policy selector, as named in configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReplacementPolicyKind {
    #[default]
    Lru,
    Fifo,
    Optimal,
    Mru,
    Lifo,
}

impl ReplacementPolicyKind {
    pub const ALL: [ReplacementPolicyKind; 5] = [
        ReplacementPolicyKind::Lru,
        ReplacementPolicyKind::Fifo,
        ReplacementPolicyKind::Optimal,
        ReplacementPolicyKind::Mru,
        ReplacementPolicyKind::Lifo,
    ];

    pub fn build(self) -> Box<dyn ReplacementPolicy> {
        match self {
            ReplacementPolicyKind::Lru => Box::new(Lru),
            ReplacementPolicyKind::Fifo => Box::new(Fifo),
            ReplacementPolicyKind::Optimal => Box::new(Optimal),
            ReplacementPolicyKind::Mru => Box::new(Mru),
            ReplacementPolicyKind::Lifo => Box::new(Lifo),
        }
    }
}

impl FromStr for ReplacementPolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LRU" => Ok(ReplacementPolicyKind::Lru),
            "FIFO" => Ok(ReplacementPolicyKind::Fifo),
            "OPTIMAL" | "OPT" => Ok(ReplacementPolicyKind::Optimal),
            "MRU" => Ok(ReplacementPolicyKind::Mru),
            "LIFO" => Ok(ReplacementPolicyKind::Lifo),
            _ => Err(ConfigError::UnknownReplacementPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ReplacementPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplacementPolicyKind::Lru => "LRU",
            ReplacementPolicyKind::Fifo => "FIFO",
            ReplacementPolicyKind::Optimal => "optimal",
            ReplacementPolicyKind::Mru => "MRU",
            ReplacementPolicyKind::Lifo => "LIFO",
        };
        f.write_str(name)
    }
}
