#![allow(dead_code)]

use std::sync::Arc;

use voxel_renderer::engine_state::rendering::visuals::{
    BlockVisualRegistry, BlockVisualRegistryBuilder, CubeVisual, PlantVisual,
};
use voxel_renderer::engine_state::voxels::block::block_type::BlockTypeInfo;
use voxel_renderer::engine_state::voxels::block::registry::BlockTypeRegistry;
use voxel_renderer::engine_state::voxels::block::BlockId;
use voxel_renderer::engine_state::voxels::chunk::chunk_index::ChunkIndex;
use voxel_renderer::engine_state::voxels::chunk::Chunk;

/// Attribute floats per vertex in the block format.
pub const VERTEX_FLOATS: usize = 9;

/// A small block set: air, opaque stone, a plant, and an invisible marker.
pub struct Content {
    pub registry: Arc<BlockTypeRegistry>,
    pub visuals: Arc<BlockVisualRegistry>,
    pub stone: BlockId,
    pub flower: BlockId,
    pub marker: BlockId,
}

pub fn content() -> Content {
    let mut registry = BlockTypeRegistry::new();
    let mut visuals = BlockVisualRegistryBuilder::new(4);

    let mut info = BlockTypeInfo::default();
    info.set_all_face_textures(visuals.add_color([128, 128, 128, 255]).unwrap());
    let stone = registry.make_type("stone", info).unwrap();
    let stone_id = stone.id();
    visuals.set_visual(stone_id, Box::new(CubeVisual::from_block_type(stone)));

    let flower_layer = visuals.add_color([230, 60, 60, 255]).unwrap();
    let mut info = BlockTypeInfo {
        solid: false,
        ..BlockTypeInfo::default()
    };
    info.set_all_face_textures(flower_layer);
    let flower_id = registry.make_type("flower", info).unwrap().id();
    visuals.set_visual(flower_id, Box::new(PlantVisual::new(flower_layer)));

    let marker_id = registry
        .make_type(
            "marker",
            BlockTypeInfo {
                visible: false,
                ..BlockTypeInfo::default()
            },
        )
        .unwrap()
        .id();

    Content {
        registry: Arc::new(registry),
        visuals: Arc::new(visuals.build()),
        stone: stone_id,
        flower: flower_id,
        marker: marker_id,
    }
}

impl Content {
    pub fn empty_chunk(&self) -> Chunk {
        Chunk::new(self.registry.clone())
    }

    /// A chunk with `id` at each of `positions`, air elsewhere.
    pub fn chunk_with(&self, id: BlockId, positions: &[(i32, i32, i32)]) -> Chunk {
        let mut chunk = self.empty_chunk();
        for &(x, y, z) in positions {
            chunk.set_block(ChunkIndex::new(x, y, z), id).unwrap();
        }
        chunk
    }
}
