//! Errors raised by the block registry, chunks and the world grid.

use cgmath::Point3;
use thiserror::Error;

use super::block::BlockId;
use super::chunk::chunk_index::ChunkIndex;

/// Failures of voxel data lookups and edits.
///
/// Everything except `CorruptBlock` and `ChunkNotLoaded` indicates a programming
/// error at the call site. `CorruptBlock` means chunk data holds an id its own
/// registry never issued, which is never treated as air.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoxelError {
    #[error("block type `{0}` not found")]
    NotFound(String),
    #[error("block type id {id} out of range (registry holds {count} types)")]
    BadId { id: BlockId, count: usize },
    #[error("block type `{0}` is already registered")]
    DuplicateName(String),
    #[error("block type registry is full")]
    RegistryFull,
    #[error("chunk offset {offset} out of range")]
    OffsetOutOfRange { offset: usize },
    #[error("chunk position {0} out of range")]
    PositionOutOfRange(ChunkIndex),
    #[error("corrupt chunk data: unknown block id {id} at {pos}")]
    CorruptBlock { id: BlockId, pos: ChunkIndex },
    #[error("no chunk loaded at {0:?}")]
    ChunkNotLoaded(Point3<i32>),
}
