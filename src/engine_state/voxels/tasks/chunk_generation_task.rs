//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which runs a `ChunkSupplier`
//! for one chunk coordinate on a worker thread and hands the finished chunk back
//! to the world.

use std::sync::Arc;

use cgmath::Point3;
use log::{debug, error};

use crate::engine_state::{
    task_management::task::{Task, TaskResult},
    voxels::{
        block::registry::BlockTypeRegistry,
        chunk::{chunk_creation::ChunkSupplier, Chunk},
        world::WorldState,
    },
};

/// A task that generates chunk data asynchronously.
///
/// The task owns shared handles to the supplier and the registry; it never sees
/// the grid.
pub struct ChunkGenerationTask {
    supplier: Arc<dyn ChunkSupplier>,
    registry: Arc<BlockTypeRegistry>,
    /// The position of the chunk to generate (in chunk coordinates)
    position: Point3<i32>,
}

impl ChunkGenerationTask {
    pub fn new(
        supplier: Arc<dyn ChunkSupplier>,
        registry: Arc<BlockTypeRegistry>,
        position: Point3<i32>,
    ) -> Self {
        ChunkGenerationTask {
            supplier,
            registry,
            position,
        }
    }
}

impl Task<WorldState> for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult<WorldState> + Send> {
        Box::new(ChunkGenerationTaskResult {
            position: self.position,
            chunk: self
                .supplier
                .generate_chunk(self.position, &self.registry)
                .map_err(|e| e.to_string()),
        })
    }

    fn abandon(&self, reason: String) -> Box<dyn TaskResult<WorldState> + Send> {
        Box::new(ChunkGenerationTaskResult {
            position: self.position,
            chunk: Err(reason),
        })
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    position: Point3<i32>,
    chunk: Result<Chunk, String>,
}

impl TaskResult<WorldState> for ChunkGenerationTaskResult {
    /// Publishes the chunk unless something else filled the coordinate while
    /// the task was running (an edit, or a synchronous generation).
    fn handle_result(
        self: Box<Self>,
        world: &mut WorldState,
    ) -> Vec<Box<dyn Task<WorldState> + Send>> {
        let ChunkGenerationTaskResult { position, chunk } = *self;
        world.finish_generation(position);

        match chunk {
            Ok(chunk) => {
                if world.grid().get_chunk(position).is_none() {
                    debug!("Generated chunk {:?}", position);
                    world.grid_mut().set_chunk(position, Arc::new(chunk));
                }
            }
            Err(reason) => {
                error!("Chunk generation failed at {:?}: {}", position, reason);
            }
        }

        Vec::new()
    }
}
