//! # World Module
//!
//! This module provides the sparse chunk storage of the voxel world (`ChunkGrid`)
//! and the `World` that fills it through a `ChunkSupplier`.
//!
//! ## Architecture
//!
//! The grid maps integer chunk coordinates to shared, immutable `Arc<Chunk>`
//! snapshots. Per coordinate the lifecycle is:
//!
//! absent → published → replaced (the old snapshot leaves the map but stays
//! alive for whoever still holds it: in-flight mesh jobs, old cache entries)
//!
//! Replacing a coordinate is a single map insert, so readers see either the old
//! or the new chunk, never a mix.
//!
//! ## Coordinates
//!
//! World block positions split into a chunk coordinate and a chunk-local
//! position by floor division: `(33, -1, 0)` lies in chunk `(1, -1, 0)` at
//! block `[1, 31, 0]`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};
use log::{debug, info};

use super::block::face::Face;
use super::block::registry::BlockTypeRegistry;
use super::block::{BlockId, AIR_ID};
use super::chunk::chunk_creation::ChunkSupplier;
use super::chunk::chunk_index::ChunkIndex;
use super::chunk::{Chunk, CHUNK_X_SIZE, CHUNK_Y_SIZE, CHUNK_Z_SIZE};
use super::error::VoxelError;
use super::tasks::chunk_generation_task::ChunkGenerationTask;
use crate::engine_state::task_management::TaskManager;

/// Default ray march step for `ChunkGrid::pick`, in blocks.
pub const DEFAULT_PICK_STEP: f32 = 0.01;

/// Splits a world block position into its chunk coordinate and chunk-local
/// position. Uses floor semantics on every axis, so the local part is always
/// inside the chunk.
pub fn pos_to_chunk_block(pos: Point3<i32>) -> (Point3<i32>, ChunkIndex) {
    let chunk = Point3::new(
        pos.x.div_euclid(CHUNK_X_SIZE),
        pos.y.div_euclid(CHUNK_Y_SIZE),
        pos.z.div_euclid(CHUNK_Z_SIZE),
    );
    let block = ChunkIndex::new(
        pos.x.rem_euclid(CHUNK_X_SIZE),
        pos.y.rem_euclid(CHUNK_Y_SIZE),
        pos.z.rem_euclid(CHUNK_Z_SIZE),
    );
    (chunk, block)
}

/// The world position of a chunk's `[0, 0, 0]` block.
pub fn chunk_origin(chunk_pos: Point3<i32>) -> Point3<i32> {
    Point3::new(
        chunk_pos.x * CHUNK_X_SIZE,
        chunk_pos.y * CHUNK_Y_SIZE,
        chunk_pos.z * CHUNK_Z_SIZE,
    )
}

/// The world block containing a floating point position.
pub fn block_containing(pos: Point3<f32>) -> Point3<i32> {
    Point3::new(
        pos.x.floor() as i32,
        pos.y.floor() as i32,
        pos.z.floor() as i32,
    )
}

/// The result of a successful `ChunkGrid::pick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickHit {
    /// World position of the first non-air block along the ray.
    pub block: Point3<i32>,
    /// The face of `block` the ray entered through, if the previous sample was
    /// an axis neighbor. `None` when the ray starts inside the block or skipped
    /// diagonally past an edge.
    pub face: Option<Face>,
}

/// Sparse map from chunk coordinate to shared chunk snapshot.
#[derive(Default, Debug)]
pub struct ChunkGrid {
    chunks: HashMap<Point3<i32>, Arc<Chunk>>,
}

impl ChunkGrid {
    pub fn new() -> Self {
        ChunkGrid::default()
    }

    /// The chunk currently published at `pos`.
    pub fn get_chunk(&self, pos: Point3<i32>) -> Option<&Arc<Chunk>> {
        self.chunks.get(&pos)
    }

    /// Publishes `chunk` at `pos`, returning the snapshot it replaced.
    pub fn set_chunk(&mut self, pos: Point3<i32>, chunk: Arc<Chunk>) -> Option<Arc<Chunk>> {
        self.chunks.insert(pos, chunk)
    }

    /// Unpublishes the chunk at `pos`.
    pub fn remove_chunk(&mut self, pos: Point3<i32>) -> Option<Arc<Chunk>> {
        self.chunks.remove(&pos)
    }

    /// Drops every chunk from the grid.
    pub fn clear_all_chunks(&mut self) {
        info!("Clearing {} chunks", self.chunks.len());
        self.chunks.clear();
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterates over every published chunk and its coordinate, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Point3<i32>, &Arc<Chunk>)> {
        self.chunks.iter().map(|(pos, chunk)| (*pos, chunk))
    }

    /// The block at a world position, or `None` if its chunk is not loaded.
    pub fn get_block(&self, pos: Point3<i32>) -> Option<BlockId> {
        let (chunk_pos, block_pos) = pos_to_chunk_block(pos);
        self.chunks
            .get(&chunk_pos)
            .map(|chunk| chunk.get_block(block_pos))
    }

    /// Marches along a ray in fixed steps and reports the first non-air block.
    ///
    /// Samples are taken at `origin + i * step * dir` for
    /// `i in 0..(max_dist / step)`. Unloaded chunks count as air. Accuracy is
    /// bounded by `step`: a ray can clip the corner of a block without sampling
    /// inside it.
    pub fn pick(
        &self,
        origin: Point3<f32>,
        dir: Vector3<f32>,
        max_dist: f32,
        step: f32,
    ) -> Option<PickHit> {
        if step <= 0.0 || dir.magnitude2() == 0.0 {
            return None;
        }
        let dir = dir.normalize();
        let steps = (max_dist / step) as u32;
        let mut prev: Option<Point3<i32>> = None;

        for i in 0..steps {
            let sample = origin + dir * (i as f32 * step);
            let block = block_containing(sample);
            if prev == Some(block) {
                continue;
            }
            if self.get_block(block).is_some_and(|id| id != AIR_ID) {
                let face = prev.and_then(|p| Face::shared(block.to_vec(), p.to_vec()));
                return Some(PickHit { block, face });
            }
            prev = Some(block);
        }
        None
    }
}

/// The foreground state that chunk generation results are applied to.
#[derive(Default, Debug)]
pub struct WorldState {
    grid: ChunkGrid,
    /// Coordinates with a generation task in flight
    generation_pending: HashSet<Point3<i32>>,
}

impl WorldState {
    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut ChunkGrid {
        &mut self.grid
    }

    pub(super) fn finish_generation(&mut self, pos: Point3<i32>) {
        self.generation_pending.remove(&pos);
    }
}

/// A voxel world: the chunk grid plus the machinery that fills and edits it.
///
/// # Examples
///
/// ```ignore
/// let mut world = World::new(registry, Arc::new(StockGenerator::default()), 4);
/// world.generate_chunk(Point3::new(0, 0, 0));
/// // ...once per tick:
/// world.process_completed();
/// ```
pub struct World {
    registry: Arc<BlockTypeRegistry>,
    supplier: Arc<dyn ChunkSupplier>,
    state: WorldState,
    task_manager: TaskManager<WorldState>,
}

impl World {
    /// Creates an empty world whose chunks come from `supplier`, generated on
    /// `num_workers` background threads.
    pub fn new(
        registry: Arc<BlockTypeRegistry>,
        supplier: Arc<dyn ChunkSupplier>,
        num_workers: usize,
    ) -> Self {
        World {
            registry,
            supplier,
            state: WorldState::default(),
            task_manager: TaskManager::new("chunkgen", num_workers),
        }
    }

    pub fn registry(&self) -> &Arc<BlockTypeRegistry> {
        &self.registry
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.state.grid
    }

    pub fn grid_mut(&mut self) -> &mut ChunkGrid {
        &mut self.state.grid
    }

    /// Number of coordinates with a generation task in flight.
    pub fn pending_count(&self) -> usize {
        self.state.generation_pending.len()
    }

    /// Returns `true` when no generation work is queued or running.
    pub fn is_idle(&self) -> bool {
        self.task_manager.is_idle()
    }

    /// Schedules background generation of the chunk at `pos`.
    ///
    /// Does nothing if the coordinate is already loaded, already being
    /// generated, or outside the supplier's border.
    ///
    /// # Returns
    /// `true` if a task was scheduled.
    pub fn generate_chunk(&mut self, pos: Point3<i32>) -> bool {
        if self.state.grid.get_chunk(pos).is_some()
            || self.state.generation_pending.contains(&pos)
            || !self.supplier.in_bounds(pos)
        {
            return false;
        }

        debug!("Scheduling generation of chunk {:?}", pos);
        self.state.generation_pending.insert(pos);
        self.task_manager.publish_task(Box::new(ChunkGenerationTask::new(
            self.supplier.clone(),
            self.registry.clone(),
            pos,
        )));
        true
    }

    /// Generates the chunk at `pos` on the calling thread.
    ///
    /// # Returns
    /// `Ok(true)` if a chunk was published, `Ok(false)` if the coordinate was
    /// already loaded or out of bounds.
    pub fn generate_chunk_now(&mut self, pos: Point3<i32>) -> Result<bool, VoxelError> {
        if self.state.grid.get_chunk(pos).is_some() || !self.supplier.in_bounds(pos) {
            return Ok(false);
        }
        let chunk = self.supplier.generate_chunk(pos, &self.registry)?;
        self.state.grid.set_chunk(pos, Arc::new(chunk));
        Ok(true)
    }

    /// Applies finished generation tasks to the grid. Never blocks.
    pub fn process_completed(&mut self) -> usize {
        self.task_manager.process_completed_tasks(&mut self.state)
    }

    /// The block at a world position, or `None` if its chunk is not loaded.
    pub fn get_block(&self, pos: Point3<i32>) -> Option<BlockId> {
        self.state.grid.get_block(pos)
    }

    /// Changes one block by publishing an edited copy of its chunk.
    ///
    /// Holders of the previous snapshot keep seeing the old contents.
    ///
    /// # Returns
    /// The newly published chunk.
    ///
    /// # Errors
    /// `ChunkNotLoaded` if the containing chunk is absent, `BadId` if `id` is
    /// unknown to the chunk's registry.
    pub fn set_block(&mut self, pos: Point3<i32>, id: BlockId) -> Result<Arc<Chunk>, VoxelError> {
        let (chunk_pos, block_pos) = pos_to_chunk_block(pos);
        let current = self
            .state
            .grid
            .get_chunk(chunk_pos)
            .ok_or(VoxelError::ChunkNotLoaded(chunk_pos))?;

        let edited = Arc::new(current.with_block(block_pos, id)?);
        self.state.grid.set_chunk(chunk_pos, edited.clone());
        Ok(edited)
    }

    /// See `ChunkGrid::pick`.
    pub fn pick(
        &self,
        origin: Point3<f32>,
        dir: Vector3<f32>,
        max_dist: f32,
        step: f32,
    ) -> Option<PickHit> {
        self.state.grid.pick(origin, dir, max_dist, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockTypeInfo;

    fn registry() -> Arc<BlockTypeRegistry> {
        let mut registry = BlockTypeRegistry::new();
        registry.make_type("stone", BlockTypeInfo::default()).unwrap();
        Arc::new(registry)
    }

    #[test]
    fn split_uses_floor_division() {
        let (chunk, block) = pos_to_chunk_block(Point3::new(33, -1, 0));
        assert_eq!(chunk, Point3::new(1, -1, 0));
        assert_eq!(block, ChunkIndex::new(1, 31, 0));

        let (chunk, block) = pos_to_chunk_block(Point3::new(-32, -33, 31));
        assert_eq!(chunk, Point3::new(-1, -2, 0));
        assert_eq!(block, ChunkIndex::new(0, 31, 31));
        assert_eq!(chunk_origin(Point3::new(1, -1, 0)), Point3::new(32, -32, 0));
    }

    #[test]
    fn set_chunk_replaces_atomically() {
        let registry = registry();
        let mut grid = ChunkGrid::new();
        let pos = Point3::new(0, 0, 0);
        let a = Arc::new(Chunk::new(registry.clone()));
        let b = Arc::new(Chunk::filled(registry, 1).unwrap());

        assert!(grid.set_chunk(pos, a.clone()).is_none());
        let old = grid.set_chunk(pos, b.clone()).unwrap();
        assert!(Arc::ptr_eq(&old, &a));
        assert!(Arc::ptr_eq(grid.get_chunk(pos).unwrap(), &b));
        assert_eq!(grid.get_block(Point3::new(5, 5, 5)), Some(1));
        assert_eq!(grid.get_block(Point3::new(-1, 0, 0)), None);

        grid.clear_all_chunks();
        assert!(grid.is_empty());
    }

    #[test]
    fn pick_finds_first_solid_block_and_entry_face() {
        let registry = registry();
        let mut grid = ChunkGrid::new();
        let mut chunk = Chunk::new(registry);
        chunk.set_block(ChunkIndex::new(5, 2, 2), 1).unwrap();
        grid.set_chunk(Point3::new(0, 0, 0), Arc::new(chunk));

        let hit = grid
            .pick(
                Point3::new(0.5, 2.5, 2.5),
                Vector3::new(1.0, 0.0, 0.0),
                10.0,
                DEFAULT_PICK_STEP,
            )
            .unwrap();
        assert_eq!(hit.block, Point3::new(5, 2, 2));
        assert_eq!(hit.face, Some(Face::LEFT));

        let miss = grid.pick(
            Point3::new(0.5, 2.5, 2.5),
            Vector3::new(1.0, 0.0, 0.0),
            3.0,
            DEFAULT_PICK_STEP,
        );
        assert_eq!(miss, None);
    }
}
