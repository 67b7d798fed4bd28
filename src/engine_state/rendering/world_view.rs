//! Per-frame selection of chunk meshes around the camera.

use std::sync::Arc;

use cgmath::{Matrix4, Point3, Vector3};

use super::chunk_mesh_manager::ChunkMeshManager;
use super::meshing::Mesh;
use crate::engine_state::voxels::world::{block_containing, chunk_origin, pos_to_chunk_block, ChunkGrid};

/// Default view radius, in chunks.
pub const DEFAULT_VIEW_RADIUS: i32 = 3;

/// One mesh to draw this frame.
#[derive(Debug, Clone)]
pub struct ChunkDraw {
    pub position: Point3<i32>,
    /// Chunk-local to world transform
    pub model: Matrix4<f32>,
    pub mesh: Arc<Mesh>,
}

/// Walks the cube of chunks around the camera, keeps their meshes current and
/// reports what to draw.
#[derive(Debug, Clone, Copy)]
pub struct WorldView {
    radius: i32,
}

impl Default for WorldView {
    fn default() -> Self {
        WorldView::new(DEFAULT_VIEW_RADIUS)
    }
}

impl WorldView {
    pub fn new(radius: i32) -> Self {
        WorldView {
            radius: radius.max(0),
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Runs one frame of mesh upkeep.
    ///
    /// Every chunk coordinate within `radius` of the camera's chunk (per axis)
    /// goes through `update_mesh`; coordinates with a mesh, stale or fresh and
    /// not empty, come back as draws. Ends with `free_unused_meshes`, so call
    /// this exactly once per frame.
    pub fn collect_draws(
        &self,
        meshes: &mut ChunkMeshManager,
        grid: &ChunkGrid,
        camera_pos: Point3<f32>,
    ) -> Vec<ChunkDraw> {
        let (center, _) = pos_to_chunk_block(block_containing(camera_pos));
        let r = self.radius;
        let mut draws = Vec::new();

        for x in center.x - r..=center.x + r {
            for y in center.y - r..=center.y + r {
                for z in center.z - r..=center.z + r {
                    let position = Point3::new(x, y, z);
                    let Some(mesh) = meshes.update_mesh(position, grid.get_chunk(position)) else {
                        continue;
                    };
                    if mesh.is_empty() {
                        continue;
                    }
                    let origin = chunk_origin(position);
                    let model = Matrix4::from_translation(Vector3::new(
                        origin.x as f32,
                        origin.y as f32,
                        origin.z as f32,
                    ));
                    draws.push(ChunkDraw {
                        position,
                        model,
                        mesh,
                    });
                }
            }
        }

        meshes.free_unused_meshes();
        draws
    }
}
