//! Chunk tesselation: one chunk in, one mesh out.
//!
//! Every cell is visited in scan order. Cells whose type has no visual (air,
//! invisible types) are skipped; everything else is handed to its visual, which
//! appends whatever faces it decides are exposed.
//!
//! Faces on the chunk boundary are always emitted, because the neighbor across
//! the boundary belongs to another chunk and is not consulted.
//!
//! The pass is all-or-nothing: any error aborts it and no mesh is produced.

use super::mesh::{Mesh, MeshBuilder, MeshFormat};
use crate::engine_state::rendering::error::MeshError;
use crate::engine_state::rendering::visuals::BlockVisualRegistry;
use crate::engine_state::voxels::chunk::chunk_index::ChunkIndex;
use crate::engine_state::voxels::chunk::Chunk;

/// Builds the mesh for `chunk`, using `builder` as scratch space.
///
/// The builder is reset to the block vertex format first, so it may hold
/// leftovers from a previous chunk.
///
/// # Errors
/// `Voxel(CorruptBlock)` if the chunk holds an ID its registry never issued,
/// or any builder error a visual runs into.
pub fn tesselate(
    builder: &mut MeshBuilder,
    visuals: &BlockVisualRegistry,
    chunk: &Chunk,
) -> Result<Mesh, MeshError> {
    builder.reset(MeshFormat::block());

    for pos in ChunkIndex::range() {
        let block = chunk.block_type(pos)?;
        if let Some(visual) = visuals.get_visual(block.id()) {
            visual.tesselate(builder, visuals, chunk, pos, block)?;
        }
    }

    builder.build()
}

/// Convenience wrapper that tesselates with a fresh builder.
pub fn tesselate_chunk(visuals: &BlockVisualRegistry, chunk: &Chunk) -> Result<Mesh, MeshError> {
    tesselate(&mut MeshBuilder::default(), visuals, chunk)
}
