//! # Engine State Module
//!
//! The core engine module that ties the voxel world to its meshes.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container, driven one tick at a time
//! * `rendering` - Block visuals, tesselation, the chunk mesh cache and GPU upload
//! * `task_management` - Manages asynchronous tasks and worker threads
//! * `voxels` - Handles voxel data, chunks, and world generation
//!
//! ## Architecture
//!
//! `EngineState` owns the `World` (chunk data) and the `ChunkMeshManager`
//! (chunk meshes), each with its own worker pool. A tick applies finished
//! background work, requests the chunks around the camera and returns what to
//! draw. Nothing in a tick blocks on a worker.
//!
//! Windowing, input and the render pass itself live in the embedding
//! application, which feeds the camera position in and uploads the returned
//! meshes with `rendering::gpu`.

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use log::debug;
use web_time::{Duration, Instant};

use rendering::{ChunkDraw, ChunkMeshManager, WorldView};
use voxels::block::BlockId;
use voxels::chunk::Chunk;
use voxels::error::VoxelError;
use voxels::world::{block_containing, pos_to_chunk_block, PickHit, World};

use crate::config::{ConfigError, EngineConfig};
use crate::content::load_content;

pub mod rendering;
pub mod task_management;
pub mod voxels;

/// The main state container for the voxel engine
///
/// # Examples
///
/// ```ignore
/// let mut engine = EngineState::new(&EngineConfig::default())?;
///
/// // Main loop
/// loop {
///     engine.set_camera_position(camera.position);
///     for draw in engine.tick() {
///         // upload and draw draw.mesh with draw.model
///     }
/// }
/// ```
pub struct EngineState {
    /// The voxel world containing all chunk data
    pub world: World,
    /// Cache of chunk meshes
    pub mesh_manager: ChunkMeshManager,
    view: WorldView,
    camera_position: Point3<f32>,
    pick_step: f32,
    ticks: u64,
}

impl EngineState {
    /// Builds the block content, world and mesh cache described by `config`.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let (registry, visuals) = load_content(config)?;
        let workers = config.effective_workers();

        let world = World::new(registry, Arc::new(config.generator.clone()), workers);
        let mesh_manager = ChunkMeshManager::new(Arc::new(visuals), workers)
            .with_policy(config.pending_dedup)
            .with_idle_eviction_ticks(config.idle_eviction_ticks);

        Ok(Self::from_parts(
            world,
            mesh_manager,
            WorldView::new(config.view_radius),
            config.pick_step,
        ))
    }

    /// Assembles an engine from already built parts.
    pub fn from_parts(
        world: World,
        mesh_manager: ChunkMeshManager,
        view: WorldView,
        pick_step: f32,
    ) -> Self {
        EngineState {
            world,
            mesh_manager,
            view,
            camera_position: Point3::new(0.0, 0.0, 0.0),
            pick_step,
            ticks: 0,
        }
    }

    pub fn camera_position(&self) -> Point3<f32> {
        self.camera_position
    }

    pub fn set_camera_position(&mut self, position: Point3<f32>) {
        self.camera_position = position;
    }

    pub fn view(&self) -> &WorldView {
        &self.view
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Schedules generation of every missing chunk within the view radius of
    /// the camera.
    ///
    /// # Returns
    /// The number of chunks scheduled.
    pub fn request_chunks_around_camera(&mut self) -> usize {
        let (center, _) = pos_to_chunk_block(block_containing(self.camera_position));
        let r = self.view.radius();
        let mut scheduled = 0;

        for x in center.x - r..=center.x + r {
            for y in center.y - r..=center.y + r {
                for z in center.z - r..=center.z + r {
                    if self.world.generate_chunk(Point3::new(x, y, z)) {
                        scheduled += 1;
                    }
                }
            }
        }
        scheduled
    }

    /// Runs one frame of upkeep and returns what to draw.
    ///
    /// Applies finished chunk generation, requests chunks around the camera,
    /// applies finished meshes, then walks the view. Call once per frame.
    pub fn tick(&mut self) -> Vec<ChunkDraw> {
        self.ticks += 1;

        let generated = self.world.process_completed();
        let requested = self.request_chunks_around_camera();
        let meshed = self.mesh_manager.process_completed();
        if generated + requested + meshed > 0 {
            debug!(
                "Tick {}: {} chunks generated, {} requested, {} meshes applied",
                self.ticks, generated, requested, meshed
            );
        }

        self.view
            .collect_draws(&mut self.mesh_manager, self.world.grid(), self.camera_position)
    }

    /// Returns `true` when neither worker pool has anything outstanding.
    pub fn is_idle(&self) -> bool {
        self.world.is_idle() && self.mesh_manager.is_idle()
    }

    /// Ticks until both pools are idle after a tick, or `timeout` passes.
    ///
    /// # Returns
    /// The draws of the last tick, and whether the engine settled in time.
    pub fn tick_until_idle(&mut self, timeout: Duration) -> (Vec<ChunkDraw>, bool) {
        let deadline = Instant::now() + timeout;
        loop {
            let draws = self.tick();
            if self.is_idle() && self.world.pending_count() == 0 {
                return (draws, true);
            }
            if Instant::now() >= deadline {
                return (draws, false);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Finds the first block along `dir` from the camera.
    pub fn pick(&self, dir: Vector3<f32>, max_dist: f32) -> Option<PickHit> {
        self.world
            .pick(self.camera_position, dir, max_dist, self.pick_step)
    }

    /// See `World::set_block`. The chunk's mesh is rebuilt on a later tick.
    pub fn set_block(&mut self, pos: Point3<i32>, id: BlockId) -> Result<Arc<Chunk>, VoxelError> {
        self.world.set_block(pos, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::AIR_ID;
    use crate::engine_state::voxels::chunk::chunk_creation::{Border, GeneratorKind, StockGenerator};

    fn config() -> EngineConfig {
        EngineConfig {
            worker_threads: 2,
            view_radius: 1,
            generator: StockGenerator::new(
                GeneratorKind::Solid {
                    block: "stone".to_string(),
                },
                Border::NoBorder { height: 1 },
            ),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn ticks_settle_into_draws() {
        let mut engine = EngineState::new(&config()).unwrap();
        let (draws, settled) = engine.tick_until_idle(Duration::from_secs(10));

        assert!(settled);
        // radius 1 around the origin chunk, only z = -1 and z = 0 are in bounds
        assert_eq!(engine.world.grid().len(), 18);
        assert_eq!(engine.mesh_manager.mesh_count(), 18);
        assert_eq!(draws.len(), 18);
        assert!(engine.ticks() > 0);
    }

    #[test]
    fn edits_reach_the_mesh_cache() {
        let mut engine = EngineState::new(&config()).unwrap();
        engine.tick_until_idle(Duration::from_secs(10));
        engine.set_camera_position(Point3::new(0.5, 0.5, 40.0));

        let hit = engine
            .pick(Vector3::new(0.0, 0.0, -1.0), 64.0)
            .expect("solid floor below the camera");
        assert_eq!(hit.block, Point3::new(0, 0, 31));

        let (chunk_pos, _) = pos_to_chunk_block(hit.block);
        let before = engine.mesh_manager.get_mesh(chunk_pos).unwrap();
        let edited = engine.set_block(hit.block, AIR_ID).unwrap();
        engine.tick_until_idle(Duration::from_secs(10));

        let entry = engine.mesh_manager.cache().get(chunk_pos).unwrap();
        assert!(entry.is_built_from(&edited));
        assert!(!Arc::ptr_eq(entry.mesh(), &before));
    }
}
