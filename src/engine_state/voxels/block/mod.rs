//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel engine.
//! It includes block type definitions, the registry that owns them, and face handling.

pub mod block_type;
pub mod face;
pub mod registry;

/// The underlying integer type used to represent block types in memory.
///
/// Chunks store one of these per cell; the full `BlockType` is resolved on
/// demand through the registry.
pub type BlockId = u16;

/// The reserved ID of the empty ("air") block.
pub const AIR_ID: BlockId = 0;
