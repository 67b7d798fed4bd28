//! # Chunk Mesh Manager
//!
//! The asynchronous cache from chunk coordinate to the best mesh currently
//! available for it.
//!
//! ## Contract
//!
//! - The render thread never waits. `update_mesh` returns immediately with the
//!   cached mesh (possibly built from an older chunk) or `None`.
//! - A coordinate whose cached mesh was built from a different chunk snapshot
//!   than the one now in the grid gets a regeneration job, and keeps serving the
//!   old mesh until the job lands.
//! - Each entry remembers its source chunk through a `Weak`, so the cache never
//!   keeps replaced chunks alive and staleness is a pointer comparison.
//! - `free_unused_meshes` runs once per tick. Entries are evicted only when
//!   their source chunk is gone *and* nobody asked for them for
//!   `idle_eviction_ticks` ticks.
//!
//! ## Threads
//!
//! All cache state lives on the foreground thread and is mutated only there,
//! either directly or when `process_completed` applies finished jobs. Workers
//! get chunk snapshots and hand back meshes; they never see the cache.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::thread;

use cgmath::Point3;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use super::meshing::Mesh;
use super::tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask;
use super::visuals::BlockVisualRegistry;
use crate::engine_state::task_management::TaskManager;
use crate::engine_state::voxels::chunk::Chunk;

/// Ticks an orphaned entry survives without being requested.
pub const DEFAULT_IDLE_EVICTION_TICKS: u32 = 100;

/// How in-flight tesselation jobs are deduplicated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// One job per chunk snapshot. A newer snapshot for a busy coordinate gets
    /// its own job right away; whichever finishes last wins.
    #[default]
    ByChunk,
    /// One job per coordinate. Edits made while a job runs are picked up by
    /// the next `update_mesh` after it lands.
    ByCoordinate,
}

/// Identifies an in-flight job for deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingKey {
    /// Address of the chunk snapshot. The job holds an `Arc` to it until the
    /// key is released, so the address cannot be reused in the meantime.
    Chunk(usize),
    Coordinate(Point3<i32>),
}

impl PendingKey {
    fn new(policy: DedupPolicy, pos: Point3<i32>, chunk: &Arc<Chunk>) -> Self {
        match policy {
            DedupPolicy::ByChunk => PendingKey::Chunk(Arc::as_ptr(chunk) as usize),
            DedupPolicy::ByCoordinate => PendingKey::Coordinate(pos),
        }
    }
}

/// One cached mesh.
#[derive(Debug)]
pub struct MeshCacheEntry {
    mesh: Arc<Mesh>,
    /// The chunk the mesh was built from
    chunk: Weak<Chunk>,
    /// Ticks since the entry was last requested
    idle_ticks: Cell<u32>,
}

impl MeshCacheEntry {
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Returns `true` if the mesh was built from exactly `chunk`.
    pub fn is_built_from(&self, chunk: &Arc<Chunk>) -> bool {
        std::ptr::eq(self.chunk.as_ptr(), Arc::as_ptr(chunk))
    }

    /// Returns `true` while the source chunk is still alive somewhere.
    pub fn is_chunk_alive(&self) -> bool {
        self.chunk.strong_count() > 0
    }

    pub fn idle_ticks(&self) -> u32 {
        self.idle_ticks.get()
    }
}

/// The foreground state tesselation results are applied to.
#[derive(Debug, Default)]
pub struct MeshCache {
    entries: HashMap<Point3<i32>, MeshCacheEntry>,
    pending: HashSet<PendingKey>,
}

impl MeshCache {
    pub fn get(&self, pos: Point3<i32>) -> Option<&MeshCacheEntry> {
        self.entries.get(&pos)
    }

    pub(crate) fn publish(&mut self, pos: Point3<i32>, mesh: Arc<Mesh>, chunk: &Arc<Chunk>) {
        self.entries.insert(
            pos,
            MeshCacheEntry {
                mesh,
                chunk: Arc::downgrade(chunk),
                idle_ticks: Cell::new(0),
            },
        );
    }

    pub(crate) fn release_pending(&mut self, key: &PendingKey) {
        self.pending.remove(key);
    }
}

/// Keeps chunk meshes in sync with chunk data without stalling the caller.
pub struct ChunkMeshManager {
    cache: MeshCache,
    task_manager: TaskManager<MeshCache>,
    visuals: Arc<BlockVisualRegistry>,
    policy: DedupPolicy,
    idle_eviction_ticks: u32,
}

impl ChunkMeshManager {
    /// Creates a manager that tesselates on `num_workers` threads.
    pub fn new(visuals: Arc<BlockVisualRegistry>, num_workers: usize) -> Self {
        ChunkMeshManager {
            cache: MeshCache::default(),
            task_manager: TaskManager::new("mesher", num_workers),
            visuals,
            policy: DedupPolicy::default(),
            idle_eviction_ticks: DEFAULT_IDLE_EVICTION_TICKS,
        }
    }

    pub fn with_policy(mut self, policy: DedupPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_idle_eviction_ticks(mut self, ticks: u32) -> Self {
        self.idle_eviction_ticks = ticks;
        self
    }

    pub fn visuals(&self) -> &Arc<BlockVisualRegistry> {
        &self.visuals
    }

    pub fn cache(&self) -> &MeshCache {
        &self.cache
    }

    /// Number of cached meshes.
    pub fn mesh_count(&self) -> usize {
        self.cache.entries.len()
    }

    /// Number of tesselation jobs scheduled and not yet applied.
    pub fn pending_count(&self) -> usize {
        self.cache.pending.len()
    }

    /// The cached mesh for `pos`, stale or not. Counts as a use of the entry.
    pub fn get_mesh(&self, pos: Point3<i32>) -> Option<Arc<Mesh>> {
        self.cache.entries.get(&pos).map(|entry| {
            entry.idle_ticks.set(0);
            entry.mesh.clone()
        })
    }

    /// Returns the best mesh for `pos` and schedules a rebuild if it does not
    /// match `chunk`.
    ///
    /// - No entry, `chunk` given: schedules a job and returns `None`.
    /// - Entry built from another snapshot: schedules a job and returns the old
    ///   mesh.
    /// - Entry built from `chunk`: returns it.
    ///
    /// Pass `None` for `chunk` when the grid has nothing at `pos`; the cached
    /// mesh (if any) is still returned and ages out once its chunk is gone.
    pub fn update_mesh(
        &mut self,
        pos: Point3<i32>,
        chunk: Option<&Arc<Chunk>>,
    ) -> Option<Arc<Mesh>> {
        let (mesh, up_to_date) = match self.cache.entries.get(&pos) {
            Some(entry) => {
                entry.idle_ticks.set(0);
                let up_to_date = chunk.map_or(true, |chunk| entry.is_built_from(chunk));
                (Some(entry.mesh.clone()), up_to_date)
            }
            None => (None, false),
        };

        if !up_to_date {
            if let Some(chunk) = chunk {
                self.schedule(pos, chunk);
            }
        }
        mesh
    }

    fn schedule(&mut self, pos: Point3<i32>, chunk: &Arc<Chunk>) {
        let key = PendingKey::new(self.policy, pos, chunk);
        if !self.cache.pending.insert(key) {
            trace!("Chunk {:?} already pending as {:?}", pos, key);
            return;
        }

        debug!("Scheduling tesselation of chunk {:?}", pos);
        self.task_manager
            .publish_task(Box::new(ChunkMeshGenerationTask::new(
                pos,
                chunk.clone(),
                self.visuals.clone(),
                key,
            )));
    }

    /// Ages every entry by one tick and evicts the ones whose chunk is gone
    /// and that have been idle past the threshold.
    ///
    /// # Returns
    /// The number of evicted entries.
    pub fn free_unused_meshes(&mut self) -> usize {
        let threshold = self.idle_eviction_ticks;
        let before = self.cache.entries.len();

        self.cache.entries.retain(|pos, entry| {
            let idle = entry.idle_ticks.get();
            if !entry.is_chunk_alive() && idle > threshold {
                debug!("Evicting mesh for chunk {:?}", pos);
                false
            } else {
                entry.idle_ticks.set(idle.saturating_add(1));
                true
            }
        });

        before - self.cache.entries.len()
    }

    /// Applies finished tesselation jobs to the cache. Never blocks.
    ///
    /// # Returns
    /// The number of jobs applied.
    pub fn process_completed(&mut self) -> usize {
        self.task_manager.process_completed_tasks(&mut self.cache)
    }

    /// Returns `true` when no job is queued, running or waiting to be applied.
    pub fn is_idle(&self) -> bool {
        self.task_manager.is_idle()
    }

    /// Applies jobs as they finish until none are left or `timeout` passes.
    ///
    /// For tests and tools; the render loop uses `process_completed`.
    ///
    /// # Returns
    /// `true` if everything completed in time.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.process_completed();
            if self.task_manager.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}
