//! Task for tesselating one chunk snapshot on a worker thread.
//!
//! The task carries everything it reads: the chunk snapshot, the visual registry
//! and the coordinate the mesh is for. Each worker thread keeps one
//! `MeshBuilder` alive across tasks so its buffers are allocated once.

use std::cell::RefCell;
use std::sync::Arc;

use cgmath::Point3;
use log::{debug, error};

use crate::engine_state::{
    rendering::{
        chunk_mesh_manager::{MeshCache, PendingKey},
        error::MeshError,
        meshing::{tesselate, Mesh, MeshBuilder},
        visuals::BlockVisualRegistry,
    },
    task_management::task::{Task, TaskResult},
    voxels::chunk::Chunk,
};

thread_local! {
    static MESH_BUILDER: RefCell<MeshBuilder> = RefCell::new(MeshBuilder::default());
}

/// Tesselates a chunk snapshot for the mesh cache.
pub struct ChunkMeshGenerationTask {
    position: Point3<i32>,
    chunk: Arc<Chunk>,
    visuals: Arc<BlockVisualRegistry>,
    pending_key: PendingKey,
}

impl ChunkMeshGenerationTask {
    pub fn new(
        position: Point3<i32>,
        chunk: Arc<Chunk>,
        visuals: Arc<BlockVisualRegistry>,
        pending_key: PendingKey,
    ) -> Self {
        ChunkMeshGenerationTask {
            position,
            chunk,
            visuals,
            pending_key,
        }
    }
}

impl Task<MeshCache> for ChunkMeshGenerationTask {
    fn process(&self) -> Box<dyn TaskResult<MeshCache> + Send> {
        let mesh = MESH_BUILDER.with(|builder| {
            tesselate(&mut builder.borrow_mut(), &self.visuals, &self.chunk)
        });

        Box::new(ChunkMeshGenerationTaskResult {
            position: self.position,
            chunk: self.chunk.clone(),
            pending_key: self.pending_key,
            mesh,
        })
    }

    fn abandon(&self, reason: String) -> Box<dyn TaskResult<MeshCache> + Send> {
        Box::new(ChunkMeshGenerationTaskResult {
            position: self.position,
            chunk: self.chunk.clone(),
            pending_key: self.pending_key,
            mesh: Err(MeshError::Aborted(reason)),
        })
    }
}

/// A finished (or failed) tesselation, applied to the cache on the foreground thread.
pub struct ChunkMeshGenerationTaskResult {
    position: Point3<i32>,
    /// Keeps the snapshot alive until the pending key is released
    chunk: Arc<Chunk>,
    pending_key: PendingKey,
    mesh: Result<Mesh, MeshError>,
}

impl TaskResult<MeshCache> for ChunkMeshGenerationTaskResult {
    /// Publishes the mesh, replacing whatever the coordinate held. A failure
    /// leaves the previous entry (or its absence) in place; the next
    /// `update_mesh` for the coordinate schedules a retry.
    fn handle_result(
        self: Box<Self>,
        cache: &mut MeshCache,
    ) -> Vec<Box<dyn Task<MeshCache> + Send>> {
        let ChunkMeshGenerationTaskResult {
            position,
            chunk,
            pending_key,
            mesh,
        } = *self;
        cache.release_pending(&pending_key);

        match mesh {
            Ok(mesh) => {
                debug!(
                    "Mesh for chunk {:?} ready: {} indices",
                    position,
                    mesh.vertex_count()
                );
                cache.publish(position, Arc::new(mesh), &chunk);
            }
            Err(e) => error!("Tesselation of chunk {:?} failed: {}", position, e),
        }

        Vec::new()
    }
}
