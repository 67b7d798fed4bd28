//! The plain textured cube.

use cgmath::Vector3;

use super::{emit_quad, BlockVisual, BlockVisualRegistry, Corner};
use crate::engine_state::rendering::error::MeshError;
use crate::engine_state::rendering::meshing::mesh::MeshBuilder;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::face::{Face, FaceMap};
use crate::engine_state::voxels::chunk::chunk_index::ChunkIndex;
use crate::engine_state::voxels::chunk::Chunk;

// Cell corners: (b)ottom/(t)op along z, (f)ront/(b)ack along y, (l)eft/(r)ight along x.
const BFL: Vector3<f32> = Vector3::new(0.0, 0.0, 0.0);
const BFR: Vector3<f32> = Vector3::new(1.0, 0.0, 0.0);
const BBL: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);
const BBR: Vector3<f32> = Vector3::new(1.0, 1.0, 0.0);
const TFL: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);
const TFR: Vector3<f32> = Vector3::new(1.0, 0.0, 1.0);
const TBL: Vector3<f32> = Vector3::new(0.0, 1.0, 1.0);
const TBR: Vector3<f32> = Vector3::new(1.0, 1.0, 1.0);

const TEX_BL: [f32; 2] = [0.0, 0.0];
const TEX_BR: [f32; 2] = [1.0, 0.0];
const TEX_TL: [f32; 2] = [0.0, 1.0];
const TEX_TR: [f32; 2] = [1.0, 1.0];

/// Quad corners per face, in emission order `v0, a, b, v3`. Winding and UV
/// orientation are part of the vertex contract; shaders and backface culling
/// rely on them.
pub(crate) fn face_corners(face: Face) -> [Corner; 4] {
    match face {
        Face::RIGHT => [(BFR, TEX_BL), (BBR, TEX_BR), (TFR, TEX_TL), (TBR, TEX_TR)],
        Face::LEFT => [(BFL, TEX_BR), (TFL, TEX_TR), (BBL, TEX_BL), (TBL, TEX_TL)],
        Face::BACK => [(BBL, TEX_BR), (TBL, TEX_TR), (BBR, TEX_BL), (TBR, TEX_TL)],
        Face::FRONT => [(BFL, TEX_BL), (BFR, TEX_BR), (TFL, TEX_TL), (TFR, TEX_TR)],
        Face::TOP => [(TFL, TEX_BL), (TFR, TEX_BR), (TBL, TEX_TL), (TBR, TEX_TR)],
        Face::BOTTOM => [(BFL, TEX_TL), (BBL, TEX_BL), (BFR, TEX_TR), (BBR, TEX_BR)],
    }
}

/// A unit cube with one texture layer per face.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeVisual {
    layers: FaceMap<u32>,
}

impl CubeVisual {
    pub fn new(layers: FaceMap<u32>) -> Self {
        CubeVisual { layers }
    }

    /// A cube using the face textures recorded in the block type.
    pub fn from_block_type(block: &BlockType) -> Self {
        CubeVisual::new(block.info().face_textures)
    }

    pub fn layer(&self, face: Face) -> u32 {
        self.layers[face]
    }

    /// A face is hidden only when this block is solid and the in-chunk
    /// neighbor behind it has an opaque visual.
    fn is_face_hidden(
        &self,
        visuals: &BlockVisualRegistry,
        chunk: &Chunk,
        pos: ChunkIndex,
        block: &BlockType,
        face: Face,
    ) -> bool {
        if !block.is_solid() {
            return false;
        }
        pos.valid_adjacent(face)
            .and_then(|neighbor| visuals.get_visual(chunk.get_block(neighbor)))
            .is_some_and(|visual| !visual.is_transparent())
    }
}

impl BlockVisual for CubeVisual {
    fn tesselate(
        &self,
        builder: &mut MeshBuilder,
        visuals: &BlockVisualRegistry,
        chunk: &Chunk,
        pos: ChunkIndex,
        block: &BlockType,
    ) -> Result<(), MeshError> {
        let origin = pos.to_point();
        for face in Face::ALL {
            if self.is_face_hidden(visuals, chunk, pos, block, face) {
                continue;
            }
            emit_quad(
                builder,
                origin,
                face.normal_f32(),
                self.layers[face],
                face_corners(face),
            )?;
        }
        Ok(())
    }

    fn is_transparent(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    /// Every face's quad lies in the plane its normal points out of, and the
    /// first triangle winds counter-clockwise seen from outside.
    #[test]
    fn corners_lie_on_their_face_and_wind_outwards() {
        for face in Face::ALL {
            let n = face.normal_f32();
            let corners = face_corners(face);
            let plane = corners[0].0.dot(n);
            assert!(corners.iter().all(|(c, _)| c.dot(n) == plane), "{:?}", face);
            assert!(plane == 1.0 || plane == 0.0);

            let [v0, a, b, _] = corners.map(|(c, _)| c);
            let winding = (a - v0).cross(b - v0).dot(n);
            assert!(winding > 0.0, "{:?} winds inwards", face);
        }
    }

    #[test]
    fn corners_cover_all_four_uvs() {
        for face in Face::ALL {
            let mut uvs: Vec<[f32; 2]> = face_corners(face).iter().map(|(_, uv)| *uv).collect();
            uvs.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(uvs, vec![TEX_BL, TEX_TL, TEX_BR, TEX_TR]);
        }
    }
}
