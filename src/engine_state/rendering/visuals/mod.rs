//! # Block Visuals
//!
//! A `BlockVisual` turns one occupied block into geometry. Tesselation looks the
//! visual up by block ID and hands it the chunk and the position; the visual
//! decides which faces to emit and appends them to the mesh builder.
//!
//! Two shapes ship with the engine:
//! - `CubeVisual`: up to six textured faces, each culled against its neighbor
//! - `PlantVisual`: two crossed double-sided quads, never culled
//!
//! The `BlockVisualRegistry` owns the visuals and the block texture array they
//! refer to. It is assembled through `BlockVisualRegistryBuilder` and is
//! read-only afterwards, so tesselation workers share it through an `Arc`.

use cgmath::{Point3, Vector3};

use super::error::{MeshError, TextureError};
use super::meshing::mesh::{Index, MeshBuilder};
use super::texture_array::{ArrayTexture, TextureArrayBuilder};
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::BlockId;
use crate::engine_state::voxels::chunk::chunk_index::ChunkIndex;
use crate::engine_state::voxels::chunk::Chunk;

pub mod cube;
pub mod plant;

pub use cube::CubeVisual;
pub use plant::PlantVisual;

/// Geometry emitter for one block type.
pub trait BlockVisual: Send + Sync + std::fmt::Debug {
    /// Appends the geometry of the block at `pos` to `builder`.
    ///
    /// `visuals` is the registry this visual belongs to; cube faces use it to
    /// check whether a neighbor hides them.
    fn tesselate(
        &self,
        builder: &mut MeshBuilder,
        visuals: &BlockVisualRegistry,
        chunk: &Chunk,
        pos: ChunkIndex,
        block: &BlockType,
    ) -> Result<(), MeshError>;

    /// Whether faces behind this block can be seen through it.
    fn is_transparent(&self) -> bool;
}

/// A quad corner: position offset within the cell and `(u, v)`.
pub(crate) type Corner = (Vector3<f32>, [f32; 2]);

/// Emits one quad as `v0, a, b, a, v3, b`: 4 unique vertices, 6 indices.
pub(crate) fn emit_quad(
    builder: &mut MeshBuilder,
    origin: Point3<f32>,
    normal: Vector3<f32>,
    layer: u32,
    corners: [Corner; 4],
) -> Result<(), MeshError> {
    let [v0, v1, v2, v3] = corners.map(|(offset, [u, v])| {
        (origin + offset, Vector3::new(u, v, layer as f32))
    });
    builder.make_vertex(v0.0, normal, v0.1)?;
    let a: Index = builder.make_vertex(v1.0, normal, v1.1)?;
    let b: Index = builder.make_vertex(v2.0, normal, v2.1)?;
    builder.repeat_vertex(a)?;
    builder.make_vertex(v3.0, normal, v3.1)?;
    builder.repeat_vertex(b)
}

/// Maps block IDs to visuals and owns the block texture array.
#[derive(Debug)]
pub struct BlockVisualRegistry {
    visuals: Vec<Option<Box<dyn BlockVisual>>>,
    block_texture: ArrayTexture,
}

impl BlockVisualRegistry {
    /// The visual for `id`, or `None` for air and other undrawn types.
    pub fn get_visual(&self, id: BlockId) -> Option<&dyn BlockVisual> {
        self.visuals.get(id as usize)?.as_deref()
    }

    pub fn has_visual(&self, id: BlockId) -> bool {
        self.get_visual(id).is_some()
    }

    /// The texture array every visual's layer indices refer to.
    pub fn block_texture(&self) -> &ArrayTexture {
        &self.block_texture
    }

    /// Number of IDs with a visual.
    pub fn visual_count(&self) -> usize {
        self.visuals.iter().filter(|v| v.is_some()).count()
    }
}

/// Assembles a `BlockVisualRegistry`.
///
/// Textures go in first (their layer indices are needed to build the visuals),
/// then visuals are attached per block ID, then `build` finalizes both.
#[derive(Debug)]
pub struct BlockVisualRegistryBuilder {
    textures: TextureArrayBuilder,
    visuals: Vec<Option<Box<dyn BlockVisual>>>,
}

impl BlockVisualRegistryBuilder {
    /// Creates a builder whose texture layers are `texture_size` pixels square.
    pub fn new(texture_size: u32) -> Self {
        BlockVisualRegistryBuilder {
            textures: TextureArrayBuilder::new(texture_size, texture_size),
            visuals: Vec::new(),
        }
    }

    pub fn textures(&mut self) -> &mut TextureArrayBuilder {
        &mut self.textures
    }

    /// Adds a solid-colour texture layer.
    pub fn add_color(&mut self, rgba: [u8; 4]) -> Result<u32, TextureError> {
        self.textures.add_color(rgba)
    }

    /// Attaches `visual` to block `id`, replacing any earlier one.
    pub fn set_visual(&mut self, id: BlockId, visual: Box<dyn BlockVisual>) -> &mut Self {
        let index = id as usize;
        if self.visuals.len() <= index {
            self.visuals.resize_with(index + 1, || None);
        }
        self.visuals[index] = Some(visual);
        self
    }

    pub fn build(self) -> BlockVisualRegistry {
        BlockVisualRegistry {
            visuals: self.visuals,
            block_texture: self.textures.build(),
        }
    }
}
