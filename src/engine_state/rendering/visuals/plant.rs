//! Cross-shaped foliage: two diagonal planes through the cell, each drawn from
//! both sides.

use cgmath::{InnerSpace, Point3, Vector3};

use super::{emit_quad, BlockVisual, BlockVisualRegistry};
use crate::engine_state::rendering::error::MeshError;
use crate::engine_state::rendering::meshing::mesh::MeshBuilder;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::chunk::chunk_index::ChunkIndex;
use crate::engine_state::voxels::chunk::Chunk;

const BFL: Vector3<f32> = Vector3::new(0.0, 0.0, 0.0);
const BFR: Vector3<f32> = Vector3::new(1.0, 0.0, 0.0);
const BBL: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);
const BBR: Vector3<f32> = Vector3::new(1.0, 1.0, 0.0);
const TFL: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);
const TFR: Vector3<f32> = Vector3::new(1.0, 0.0, 1.0);
const TBL: Vector3<f32> = Vector3::new(0.0, 1.0, 1.0);
const TBR: Vector3<f32> = Vector3::new(1.0, 1.0, 1.0);

/// Two crossed, double-sided quads with a single texture layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantVisual {
    layer: u32,
}

impl PlantVisual {
    pub fn new(layer: u32) -> Self {
        PlantVisual { layer }
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    /// The back side of a diagonal plane: same corners, mirrored `u`, reversed
    /// winding.
    fn emit_back(
        &self,
        builder: &mut MeshBuilder,
        origin: Point3<f32>,
        normal: Vector3<f32>,
        [low_a, low_b, high_a, high_b]: [Vector3<f32>; 4],
    ) -> Result<(), MeshError> {
        let tex = |u: f32, v: f32| Vector3::new(u, v, self.layer as f32);
        let a = builder.make_vertex(origin + low_b, normal, tex(0.0, 0.0))?;
        builder.make_vertex(origin + low_a, normal, tex(1.0, 0.0))?;
        let b = builder.make_vertex(origin + high_a, normal, tex(1.0, 1.0))?;
        builder.repeat_vertex(a)?;
        builder.repeat_vertex(b)?;
        builder.make_vertex(origin + high_b, normal, tex(0.0, 1.0))?;
        Ok(())
    }
}

impl BlockVisual for PlantVisual {
    fn tesselate(
        &self,
        builder: &mut MeshBuilder,
        _visuals: &BlockVisualRegistry,
        _chunk: &Chunk,
        pos: ChunkIndex,
        _block: &BlockType,
    ) -> Result<(), MeshError> {
        let origin = pos.to_point();

        let n = Vector3::new(1.0, -1.0, 0.0).normalize();
        emit_quad(
            builder,
            origin,
            n,
            self.layer,
            [
                (BFL, [0.0, 0.0]),
                (BBR, [1.0, 0.0]),
                (TFL, [0.0, 1.0]),
                (TBR, [1.0, 1.0]),
            ],
        )?;
        self.emit_back(builder, origin, -n, [BFL, BBR, TFL, TBR])?;

        let n = Vector3::new(-1.0, -1.0, 0.0).normalize();
        emit_quad(
            builder,
            origin,
            n,
            self.layer,
            [
                (BBL, [0.0, 0.0]),
                (BFR, [1.0, 0.0]),
                (TBL, [0.0, 1.0]),
                (TFR, [1.0, 1.0]),
            ],
        )?;
        self.emit_back(builder, origin, -n, [BBL, BFR, TBL, TFR])
    }

    fn is_transparent(&self) -> bool {
        true
    }
}
