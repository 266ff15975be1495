//! Buddy-system allocator for the dynamic region
//!
//! The arena is managed as a binary tree of power-of-two blocks. Every block
//! that exists (leaf or split) sits in the list of its level, where the level
//! is `log2(size)`; the lists are doubly linked and ordered so that the
//! left-most block produced by the latest split is at the head.
//!
//! # Block Arena
//!
//! Blocks are stored in a `Vec` and refer to each other by [`BlockId`]
//! (parent, children and list neighbours). Slots freed by coalescing are
//! recycled, so the tree never holds dangling links.
//!
//! # Allocation
//!
//! ```text
//! allocate(100)  on a 1024-byte arena
//!
//! [0..1024)                         split
//! [0..512)           [512..1024)    split left
//! [0..256) [256..512)               split left
//! [0..128) [128..256)               take [0..128)
//! ```
//!
//! The requested size is written at the start of each allocated block so the
//! dump can report it. [`BuddyAllocator::free`] merges a freed block with its
//! buddy while the buddy is a free leaf.

use super::errors::MemoryError;
use super::layout::{Region, DEFAULT_HEAP_SIZE};
use log::trace;

/// Index of a block in the allocator's block arena
pub type BlockId = usize;

/// Bytes reserved at the start of a block for its requested size
const SIZE_HEADER: usize = 4;

/// A node of the buddy tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyBlock {
    pub offset: usize,
    pub size: usize,
    pub free: bool,
    pub parent: Option<BlockId>,
    pub left: Option<BlockId>,
    pub right: Option<BlockId>,
    pub prev: Option<BlockId>,
    pub next: Option<BlockId>,
}

impl BuddyBlock {
    fn new(offset: usize, size: usize, parent: Option<BlockId>) -> Self {
        BuddyBlock {
            offset,
            size,
            free: true,
            parent,
            left: None,
            right: None,
            prev: None,
            next: None,
        }
    }

    /// A block is a leaf when it has not been split
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Only free leaves can be handed out
    pub fn is_available(&self) -> bool {
        self.is_leaf() && self.free
    }

    /// Leaf currently handed out to a caller
    pub fn is_allocated(&self) -> bool {
        self.is_leaf() && !self.free
    }
}

/// Binary buddy allocator over a fixed byte arena
#[derive(Debug, Clone)]
pub struct BuddyAllocator {
    arena: Vec<u8>,
    blocks: Vec<BuddyBlock>,
    vacant: Vec<BlockId>,
    heads: Vec<Option<BlockId>>, // Level -> first block in that level's list
    root: BlockId,
}

impl BuddyAllocator {
    /// Create an allocator over an arena of `size` bytes.
    ///
    /// `size` must be a non-zero power of two.
    pub fn new(size: usize) -> Result<Self, MemoryError> {
        if !size.is_power_of_two() {
            return Err(MemoryError::InvalidArenaSize { size });
        }
        Ok(Self::with_arena(size))
    }

    fn with_arena(size: usize) -> Self {
        let top = level_of(size);
        let mut heads = vec![None; top + 1];
        heads[top] = Some(0);

        BuddyAllocator {
            arena: vec![0; size],
            blocks: vec![BuddyBlock::new(0, size, None)],
            vacant: Vec::new(),
            heads,
            root: 0,
        }
    }

    /// Allocate a block large enough for `requested` bytes and return its offset
    pub fn allocate(&mut self, requested: i64) -> Result<usize, MemoryError> {
        if requested <= 0 {
            return Err(MemoryError::InvalidAllocationSize { requested });
        }
        let requested = usize::try_from(requested)
            .ok()
            .filter(|&r| r <= self.arena.len())
            .ok_or(MemoryError::OutOfMemory {
                requested: requested as usize,
            })?;

        let level = level_of(requested.next_power_of_two());

        let id = match self.find_available(level) {
            Some(id) => id,
            None => {
                let (found_level, found) = (level + 1..self.heads.len())
                    .find_map(|l| self.find_available(l).map(|id| (l, id)))
                    .ok_or(MemoryError::OutOfMemory { requested })?;

                // Each split puts the new left half at the head of the level below
                let mut current = self.split(found)?;
                for _ in (level + 1..found_level).rev() {
                    current = self.split(current)?;
                }
                current
            }
        };

        self.blocks[id].free = false;
        let offset = self.blocks[id].offset;
        self.write_requested_size(id, requested);
        trace!(
            "allocated {} bytes at offset {} (block size {})",
            requested,
            offset,
            self.blocks[id].size
        );
        Ok(offset)
    }

    /// Release the allocated block starting at `offset`, merging buddies
    pub fn free(&mut self, offset: usize) -> Result<(), MemoryError> {
        let mut id = self
            .leaf_at(offset)
            .filter(|&id| self.blocks[id].offset == offset && !self.blocks[id].free)
            .ok_or(MemoryError::InvalidFree { offset })?;

        self.blocks[id].free = true;

        while let Some(parent) = self.blocks[id].parent {
            let (Some(left), Some(right)) = (self.blocks[parent].left, self.blocks[parent].right)
            else {
                break;
            };
            let buddy = if left == id { right } else { left };
            if !self.blocks[buddy].is_available() {
                break;
            }

            self.unlink(left);
            self.unlink(right);
            self.vacant.push(left);
            self.vacant.push(right);

            let block = &mut self.blocks[parent];
            block.left = None;
            block.right = None;
            block.free = true;
            trace!("merged buddies into block {} (size {})", block.offset, block.size);
            id = parent;
        }
        Ok(())
    }

    /// Split the free leaf `id` into two halves and return the left one.
    fn split(&mut self, id: BlockId) -> Result<BlockId, MemoryError> {
        let target = &self.blocks[id];
        if !target.is_available() || target.size < 2 {
            return Err(MemoryError::InvalidSplit {
                offset: target.offset,
                size: target.size,
            });
        }
        let half = target.size / 2;
        let offset = target.offset;
        let level = level_of(half);

        let left = self.insert_block(BuddyBlock::new(offset, half, Some(id)));
        let right = self.insert_block(BuddyBlock::new(offset + half, half, Some(id)));

        // left <-> right <-> old head
        let old_head = self.heads[level];
        self.blocks[left].next = Some(right);
        self.blocks[right].prev = Some(left);
        self.blocks[right].next = old_head;
        if let Some(head) = old_head {
            self.blocks[head].prev = Some(right);
        }
        self.heads[level] = Some(left);

        let parent = &mut self.blocks[id];
        parent.left = Some(left);
        parent.right = Some(right);
        parent.free = false;
        trace!("split block {} (size {}) into two of {}", offset, half * 2, half);
        Ok(left)
    }

    /// First free leaf in list order at `level`
    fn find_available(&self, level: usize) -> Option<BlockId> {
        self.level_ids(level).find(|&id| self.blocks[id].is_available())
    }

    /// Leaf whose range contains `offset`
    fn leaf_at(&self, offset: usize) -> Option<BlockId> {
        if offset >= self.arena.len() {
            return None;
        }
        let mut id = self.root;
        while let (Some(left), Some(right)) = (self.blocks[id].left, self.blocks[id].right) {
            id = if offset < self.blocks[right].offset {
                left
            } else {
                right
            };
        }
        Some(id)
    }

    fn insert_block(&mut self, block: BuddyBlock) -> BlockId {
        match self.vacant.pop() {
            Some(id) => {
                self.blocks[id] = block;
                id
            }
            None => {
                self.blocks.push(block);
                self.blocks.len() - 1
            }
        }
    }

    fn unlink(&mut self, id: BlockId) {
        let (prev, next) = (self.blocks[id].prev, self.blocks[id].next);
        match prev {
            Some(p) => self.blocks[p].next = next,
            None => self.heads[level_of(self.blocks[id].size)] = next,
        }
        if let Some(n) = next {
            self.blocks[n].prev = prev;
        }
        self.blocks[id].prev = None;
        self.blocks[id].next = None;
    }

    fn write_requested_size(&mut self, id: BlockId, requested: usize) {
        let block = &self.blocks[id];
        let len = SIZE_HEADER.min(block.size);
        let bytes = (requested as u32).to_le_bytes();
        self.arena[block.offset..block.offset + len].copy_from_slice(&bytes[..len]);
    }

    /// Read back the requested size stored at the start of an allocated block
    pub fn requested_size(&self, offset: usize) -> Result<u32, MemoryError> {
        let id = self
            .leaf_at(offset)
            .filter(|&id| self.blocks[id].offset == offset && !self.blocks[id].free)
            .ok_or(MemoryError::NotAllocated { offset })?;
        let len = SIZE_HEADER.min(self.blocks[id].size);
        let mut bytes = [0u8; SIZE_HEADER];
        bytes[..len].copy_from_slice(&self.arena[offset..offset + len]);
        Ok(u32::from_le_bytes(bytes))
    }

    /// Bytes `[offset, offset + len)` of the arena
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&[u8], MemoryError> {
        self.check_range(offset, len)?;
        Ok(&self.arena[offset..offset + len])
    }

    /// Mutable bytes `[offset, offset + len)` of the arena
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], MemoryError> {
        self.check_range(offset, len)?;
        Ok(&mut self.arena[offset..offset + len])
    }

    /// The arena from `offset` to its end
    pub fn tail(&self, offset: usize) -> Result<&[u8], MemoryError> {
        self.check_range(offset, 1)?;
        Ok(&self.arena[offset..])
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<(), MemoryError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.arena.len() && offset < self.arena.len() => Ok(()),
            _ => Err(MemoryError::IndexOutOfBounds {
                region: Region::Dynamic,
                index: offset,
                extent: self.arena.len(),
            }),
        }
    }

    /// Arena size in bytes
    pub fn size(&self) -> usize {
        self.arena.len()
    }

    /// Number of size-class lists (`log2(size) + 1`)
    pub fn level_count(&self) -> usize {
        self.heads.len()
    }

    /// Blocks of one level, in list order
    pub fn level(&self, level: usize) -> impl Iterator<Item = &BuddyBlock> + '_ {
        self.level_ids(level).map(move |id| &self.blocks[id])
    }

    fn level_ids(&self, level: usize) -> LevelIds<'_> {
        LevelIds {
            blocks: &self.blocks,
            next: self.heads.get(level).copied().flatten(),
        }
    }

    /// Allocated leaves sorted by offset
    pub fn allocated(&self) -> Vec<&BuddyBlock> {
        let mut used: Vec<_> = (0..self.heads.len())
            .flat_map(|level| self.level(level))
            .filter(|block| block.is_allocated())
            .collect();
        used.sort_by_key(|block| block.offset);
        used
    }

    /// Total bytes held by free leaves
    pub fn free_bytes(&self) -> usize {
        (0..self.heads.len())
            .flat_map(|level| self.level(level))
            .filter(|block| block.is_available())
            .map(|block| block.size)
            .sum()
    }
}

impl Default for BuddyAllocator {
    fn default() -> Self {
        Self::with_arena(DEFAULT_HEAP_SIZE)
    }
}

struct LevelIds<'a> {
    blocks: &'a [BuddyBlock],
    next: Option<BlockId>,
}

impl Iterator for LevelIds<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        let id = self.next?;
        self.next = self.blocks[id].next;
        Some(id)
    }
}

/// `log2` of a power of two
fn level_of(size: usize) -> usize {
    size.trailing_zeros() as usize
}
