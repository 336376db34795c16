//! A single associative set

use std::collections::VecDeque;

use super::Block;

/// Ordered group of at most `associativity` blocks.
/// The head is the most recently used or inserted block,
/// depending on the replacement policy in charge.
///
/// Tags are kept in a parallel sequence in lock-step with the blocks,
/// so position `i` in one always describes position `i` in the other.
#[derive(Clone, Debug)]
pub struct CacheSet {
    associativity: usize,
    tags: VecDeque<u64>,
    blocks: VecDeque<Block>,
}

impl CacheSet {
    pub fn new(associativity: usize) -> Self {
        Self {
            associativity,
            tags: VecDeque::with_capacity(associativity),
            blocks: VecDeque::with_capacity(associativity),
        }
    }

    pub fn associativity(&self) -> usize {
        self.associativity
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.blocks.len() >= self.associativity
    }

    /// Position of the block holding `tag`, if resident
    pub fn position(&self, tag: u64) -> Option<usize> {
        self.blocks.iter().position(|block| block.tag == tag)
    }

    pub fn contains(&self, tag: u64) -> bool {
        self.position(tag).is_some()
    }

    pub fn get(&self, way: usize) -> Option<&Block> {
        self.blocks.get(way)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = &u64> {
        self.tags.iter()
    }

    pub fn mark_dirty(&mut self, way: usize) {
        self.blocks[way].dirty = true;
    }

    /// Insert a block as the new head
    pub fn push_front(&mut self, block: Block) {
        assert!(!self.is_full(), "insertion into a full set");
        self.tags.push_front(block.tag);
        self.blocks.push_front(block);
    }

    /// Move the block at `way` to the head
    pub fn promote(&mut self, way: usize) {
        if way == 0 {
            return;
        }
        let block = self.remove(way);
        self.push_front(block);
    }

    pub fn remove(&mut self, way: usize) -> Block {
        self.tags.remove(way);
        self.blocks
            .remove(way)
            .unwrap_or_else(|| panic!("way {} out of range", way))
    }

    /// Put `block` in the slot at `way`, returning the previous occupant
    pub fn replace(&mut self, way: usize, block: Block) -> Block {
        self.tags[way] = block.tag;
        std::mem::replace(&mut self.blocks[way], block)
    }

    /// Check that the tag order mirrors the block order
    pub fn is_consistent(&self) -> bool {
        self.tags.len() == self.blocks.len()
            && self.blocks.len() <= self.associativity
            && self.tags.iter().zip(&self.blocks).all(|(t, b)| *t == b.tag)
    }
}
