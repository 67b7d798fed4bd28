//! # Chunk Module
//!
//! This module provides the `Chunk` struct, a dense 32x32x32 array of block IDs,
//! together with its position type (`chunk_index`) and the chunk suppliers used to
//! fill new chunks (`chunk_creation`).
//!
//! ## Copy-on-Write
//!
//! Once a chunk is published to the world it is shared as an `Arc<Chunk>` and never
//! mutated again: the mesh manager, in-flight tesselation jobs and old cache entries
//! may all be reading it. Edits clone the chunk (a deep copy of the ID array sharing
//! the same registry), change the copy, and publish the copy as a replacement.
//! `Arc` enforces this: the mutating methods need `&mut Chunk`, which a shared
//! snapshot cannot hand out.

use std::sync::Arc;

use super::block::block_type::BlockType;
use super::block::registry::BlockTypeRegistry;
use super::block::{BlockId, AIR_ID};
use super::error::VoxelError;
use chunk_index::ChunkIndex;

pub mod chunk_creation;
pub mod chunk_index;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 32;
/// Chunk extent along X.
pub const CHUNK_X_SIZE: i32 = CHUNK_DIMENSION;
/// Chunk extent along Y.
pub const CHUNK_Y_SIZE: i32 = CHUNK_DIMENSION;
/// Chunk extent along Z.
pub const CHUNK_Z_SIZE: i32 = CHUNK_DIMENSION;
/// The total number of blocks in a chunk.
pub const CHUNK_SIZE: usize = (CHUNK_X_SIZE * CHUNK_Y_SIZE * CHUNK_Z_SIZE) as usize;

/// A fixed-size 3D grid of block IDs tied to one block type registry.
///
/// Cloning a chunk deep-copies the block array and shares the registry handle,
/// which is exactly the copy step of a copy-on-write edit.
#[derive(Clone)]
pub struct Chunk {
    registry: Arc<BlockTypeRegistry>,
    blocks: Box<[BlockId]>,
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let solid = self.blocks.iter().filter(|id| **id != AIR_ID).count();
        f.debug_struct("Chunk")
            .field("non_air_blocks", &solid)
            .finish()
    }
}

impl Chunk {
    /// Creates a new, completely empty chunk (all blocks are air).
    pub fn new(registry: Arc<BlockTypeRegistry>) -> Self {
        Chunk {
            registry,
            blocks: vec![AIR_ID; CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Creates a chunk with every cell set to `id`.
    ///
    /// # Errors
    /// `BadId` if `id` is not issued by `registry`.
    pub fn filled(registry: Arc<BlockTypeRegistry>, id: BlockId) -> Result<Self, VoxelError> {
        let mut chunk = Chunk::new(registry);
        chunk.fill(id)?;
        Ok(chunk)
    }

    /// Wraps an existing ID array without validating the IDs.
    ///
    /// This is the entry point for externally produced data; IDs unknown to the
    /// registry are reported as `CorruptBlock` when the chunk is resolved or
    /// tesselated.
    ///
    /// # Returns
    /// `None` if `blocks` does not hold exactly `CHUNK_SIZE` entries.
    pub fn from_raw(registry: Arc<BlockTypeRegistry>, blocks: Vec<BlockId>) -> Option<Self> {
        (blocks.len() == CHUNK_SIZE).then(|| Chunk {
            registry,
            blocks: blocks.into_boxed_slice(),
        })
    }

    /// The registry this chunk's IDs refer to.
    pub fn registry(&self) -> &Arc<BlockTypeRegistry> {
        &self.registry
    }

    /// The raw block array in scan order.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Sets every cell to `id`.
    pub fn fill(&mut self, id: BlockId) -> Result<(), VoxelError> {
        self.check_id(id)?;
        self.blocks.fill(id);
        Ok(())
    }

    /// The block ID at a valid position.
    ///
    /// # Panics
    /// Panics if `pos` is outside the chunk. Positions produced by
    /// `ChunkIndex::range()` or filtered through `is_valid` never are.
    pub fn get_block(&self, pos: ChunkIndex) -> BlockId {
        assert!(pos.is_valid(), "chunk position {} out of range", pos);
        self.blocks[pos.offset()]
    }

    /// The block ID at `pos`, or `PositionOutOfRange`.
    pub fn try_get_block(&self, pos: ChunkIndex) -> Result<BlockId, VoxelError> {
        pos.checked_offset()
            .map(|offset| self.blocks[offset])
            .ok_or(VoxelError::PositionOutOfRange(pos))
    }

    /// The block ID at a flat offset, or `OffsetOutOfRange`.
    pub fn get_block_at_offset(&self, offset: usize) -> Result<BlockId, VoxelError> {
        self.blocks
            .get(offset)
            .copied()
            .ok_or(VoxelError::OffsetOutOfRange { offset })
    }

    /// Resolves the block at `pos` to its full type.
    ///
    /// # Errors
    /// `PositionOutOfRange` for positions outside the chunk and `CorruptBlock`
    /// when the stored ID is unknown to the registry.
    pub fn block_type(&self, pos: ChunkIndex) -> Result<&BlockType, VoxelError> {
        let id = self.try_get_block(pos)?;
        self.registry
            .get_type(id)
            .map_err(|_| VoxelError::CorruptBlock { id, pos })
    }

    /// Writes `id` at `pos`.
    ///
    /// Only callable on a chunk that is not shared yet (see the module docs).
    pub fn set_block(&mut self, pos: ChunkIndex, id: BlockId) -> Result<(), VoxelError> {
        let offset = pos
            .checked_offset()
            .ok_or(VoxelError::PositionOutOfRange(pos))?;
        self.check_id(id)?;
        self.blocks[offset] = id;
        Ok(())
    }

    /// Writes `id` at a flat offset.
    pub fn set_block_at_offset(&mut self, offset: usize, id: BlockId) -> Result<(), VoxelError> {
        if offset >= CHUNK_SIZE {
            return Err(VoxelError::OffsetOutOfRange { offset });
        }
        self.check_id(id)?;
        self.blocks[offset] = id;
        Ok(())
    }

    /// Returns a copy of this chunk with one cell changed.
    pub fn with_block(&self, pos: ChunkIndex, id: BlockId) -> Result<Chunk, VoxelError> {
        let mut copy = self.clone();
        copy.set_block(pos, id)?;
        Ok(copy)
    }

    /// Returns `true` if every cell is air.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|id| *id == AIR_ID)
    }

    fn check_id(&self, id: BlockId) -> Result<(), VoxelError> {
        self.registry.get_type(id).map(|_| ())
    }
}
