mod common;

use std::sync::Arc;

use cgmath::Point3;
use common::content;
use voxel_renderer::engine_state::rendering::error::MeshError;
use voxel_renderer::engine_state::rendering::meshing::MeshBuilder;
use voxel_renderer::engine_state::rendering::visuals::{
    BlockVisual, BlockVisualRegistry, BlockVisualRegistryBuilder,
};
use voxel_renderer::engine_state::rendering::{ChunkMeshManager, DedupPolicy};
use voxel_renderer::engine_state::voxels::block::block_type::{BlockType, BlockTypeInfo};
use voxel_renderer::engine_state::voxels::block::registry::BlockTypeRegistry;
use voxel_renderer::engine_state::voxels::block::AIR_ID;
use voxel_renderer::engine_state::voxels::chunk::chunk_index::ChunkIndex;
use voxel_renderer::engine_state::voxels::chunk::{Chunk, CHUNK_SIZE};
use voxel_renderer::engine_state::voxels::world::ChunkGrid;
use web_time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);
const ORIGIN: Point3<i32> = Point3::new(0, 0, 0);

fn manager(workers: usize) -> (common::Content, ChunkMeshManager) {
    let content = content();
    let manager = ChunkMeshManager::new(content.visuals.clone(), workers);
    (content, manager)
}

#[test]
fn first_request_schedules_then_serves() {
    let (content, mut manager) = manager(2);
    let mut grid = ChunkGrid::new();
    grid.set_chunk(
        ORIGIN,
        Arc::new(content.chunk_with(content.stone, &[(1, 1, 1)])),
    );

    assert!(manager.update_mesh(ORIGIN, grid.get_chunk(ORIGIN)).is_none());
    assert_eq!(manager.pending_count(), 1);
    assert!(manager.wait_idle(TIMEOUT));
    assert_eq!(manager.pending_count(), 0);

    let mesh = manager
        .update_mesh(ORIGIN, grid.get_chunk(ORIGIN))
        .expect("mesh after the job landed");
    assert_eq!(mesh.unique_vertex_count(), 24);
    assert_eq!(manager.pending_count(), 0);
    assert!(manager.is_idle());
    assert!(Arc::ptr_eq(&manager.get_mesh(ORIGIN).unwrap(), &mesh));
}

#[test]
fn replaced_chunk_keeps_serving_the_old_mesh() {
    let (content, mut manager) = manager(2);
    let mut grid = ChunkGrid::new();
    let chunk_a = Arc::new(content.chunk_with(content.stone, &[(1, 1, 1)]));
    grid.set_chunk(ORIGIN, chunk_a.clone());

    manager.update_mesh(ORIGIN, grid.get_chunk(ORIGIN));
    assert!(manager.wait_idle(TIMEOUT));
    let mesh_a = manager.get_mesh(ORIGIN).unwrap();

    let chunk_b = Arc::new(chunk_a.with_block(ChunkIndex::new(5, 5, 5), content.stone).unwrap());
    grid.set_chunk(ORIGIN, chunk_b.clone());
    drop(chunk_a);

    let stale = manager
        .update_mesh(ORIGIN, grid.get_chunk(ORIGIN))
        .expect("stale mesh is still served");
    assert!(Arc::ptr_eq(&stale, &mesh_a));
    assert_eq!(manager.pending_count(), 1);

    assert!(manager.wait_idle(TIMEOUT));
    let fresh = manager.update_mesh(ORIGIN, grid.get_chunk(ORIGIN)).unwrap();
    assert_eq!(fresh.unique_vertex_count(), 48);
    assert!(manager.cache().get(ORIGIN).unwrap().is_built_from(&chunk_b));
    assert_eq!(manager.pending_count(), 0);
}

#[test]
fn pending_jobs_are_deduplicated_by_chunk() {
    let (content, mut manager) = manager(1);
    let chunk_a = Arc::new(content.chunk_with(content.stone, &[(1, 1, 1)]));
    let chunk_b = Arc::new(content.chunk_with(content.stone, &[(2, 2, 2)]));

    manager.update_mesh(ORIGIN, Some(&chunk_a));
    manager.update_mesh(ORIGIN, Some(&chunk_a));
    assert_eq!(manager.pending_count(), 1);

    // a different snapshot for the same coordinate gets its own job
    manager.update_mesh(ORIGIN, Some(&chunk_b));
    assert_eq!(manager.pending_count(), 2);

    assert!(manager.wait_idle(TIMEOUT));
    assert_eq!(manager.pending_count(), 0);
    assert_eq!(manager.mesh_count(), 1);
}

#[test]
fn pending_jobs_are_deduplicated_by_coordinate() {
    let (content, manager) = manager(1);
    let mut manager = manager.with_policy(DedupPolicy::ByCoordinate);
    let chunk_a = Arc::new(content.chunk_with(content.stone, &[(1, 1, 1)]));
    let chunk_b = Arc::new(content.chunk_with(content.stone, &[(2, 2, 2)]));

    manager.update_mesh(ORIGIN, Some(&chunk_a));
    manager.update_mesh(ORIGIN, Some(&chunk_b));
    assert_eq!(manager.pending_count(), 1);

    assert!(manager.wait_idle(TIMEOUT));
    assert!(manager.cache().get(ORIGIN).unwrap().is_built_from(&chunk_a));

    // the edit made while the job ran is picked up by the next request
    manager.update_mesh(ORIGIN, Some(&chunk_b));
    assert!(manager.wait_idle(TIMEOUT));
    assert!(manager.cache().get(ORIGIN).unwrap().is_built_from(&chunk_b));
}

#[test]
fn freeing_live_entries_is_a_no_op() {
    let (content, manager) = manager(1);
    let mut manager = manager.with_idle_eviction_ticks(2);
    let chunk = Arc::new(content.chunk_with(content.stone, &[(1, 1, 1)]));

    manager.update_mesh(ORIGIN, Some(&chunk));
    assert!(manager.wait_idle(TIMEOUT));
    let mesh = manager.get_mesh(ORIGIN).unwrap();

    for _ in 0..10 {
        assert_eq!(manager.free_unused_meshes(), 0);
    }
    assert_eq!(manager.mesh_count(), 1);
    assert!(Arc::ptr_eq(&manager.get_mesh(ORIGIN).unwrap(), &mesh));
}

#[test]
fn orphaned_entries_are_evicted_after_idling() {
    let (content, manager) = manager(1);
    let mut manager = manager.with_idle_eviction_ticks(3);
    let chunk = Arc::new(content.chunk_with(content.stone, &[(1, 1, 1)]));

    manager.update_mesh(ORIGIN, Some(&chunk));
    assert!(manager.wait_idle(TIMEOUT));
    drop(chunk);

    let entry = manager.cache().get(ORIGIN).unwrap();
    assert!(!entry.is_chunk_alive());

    // Orphaned but recently used: ages, then goes once idle exceeds the threshold
    for _ in 0..4 {
        assert_eq!(manager.free_unused_meshes(), 0);
    }
    // a request resets the idle counter
    assert!(manager.get_mesh(ORIGIN).is_some());
    for _ in 0..4 {
        assert_eq!(manager.free_unused_meshes(), 0);
    }
    assert_eq!(manager.cache().get(ORIGIN).unwrap().idle_ticks(), 4);
    assert_eq!(manager.free_unused_meshes(), 1);
    assert_eq!(manager.mesh_count(), 0);
    assert!(manager.get_mesh(ORIGIN).is_none());
}

#[test]
fn failed_jobs_leave_the_cache_untouched_and_retry() {
    let (content, mut manager) = manager(1);
    let mut blocks = vec![AIR_ID; CHUNK_SIZE];
    blocks[7] = 999;
    let corrupt = Arc::new(Chunk::from_raw(content.registry.clone(), blocks).unwrap());

    assert!(manager.update_mesh(ORIGIN, Some(&corrupt)).is_none());
    assert!(manager.wait_idle(TIMEOUT));
    assert_eq!(manager.mesh_count(), 0);
    assert_eq!(manager.pending_count(), 0);

    assert!(manager.update_mesh(ORIGIN, Some(&corrupt)).is_none());
    assert_eq!(manager.pending_count(), 1);
    assert!(manager.wait_idle(TIMEOUT));
}

#[derive(Debug)]
struct PanickingVisual;

impl BlockVisual for PanickingVisual {
    fn tesselate(
        &self,
        _builder: &mut MeshBuilder,
        _visuals: &BlockVisualRegistry,
        _chunk: &Chunk,
        _pos: ChunkIndex,
        _block: &BlockType,
    ) -> Result<(), MeshError> {
        panic!("visual failed");
    }

    fn is_transparent(&self) -> bool {
        false
    }
}

#[test]
fn worker_panics_are_contained() {
    let mut registry = BlockTypeRegistry::new();
    let id = registry
        .make_type("cursed", BlockTypeInfo::default())
        .unwrap()
        .id();
    let registry = Arc::new(registry);
    let mut visuals = BlockVisualRegistryBuilder::new(1);
    visuals.set_visual(id, Box::new(PanickingVisual));

    let mut manager = ChunkMeshManager::new(Arc::new(visuals.build()), 1);
    let mut chunk = Chunk::new(registry.clone());
    chunk.set_block(ChunkIndex::new(0, 0, 0), id).unwrap();
    let cursed = Arc::new(chunk);
    let air = Arc::new(Chunk::new(registry));

    manager.update_mesh(ORIGIN, Some(&cursed));
    assert!(manager.wait_idle(TIMEOUT));
    assert_eq!(manager.mesh_count(), 0);
    assert_eq!(manager.pending_count(), 0);

    // the same worker keeps serving
    let other = Point3::new(1, 0, 0);
    manager.update_mesh(other, Some(&air));
    assert!(manager.wait_idle(TIMEOUT));
    assert!(manager.get_mesh(other).unwrap().is_empty());
}

#[test]
fn zero_workers_still_builds_meshes() {
    let (content, mut manager) = manager(0);
    let chunk = Arc::new(content.chunk_with(content.stone, &[(1, 1, 1)]));

    manager.update_mesh(ORIGIN, Some(&chunk));
    assert!(manager.wait_idle(TIMEOUT));
    assert_eq!(manager.get_mesh(ORIGIN).unwrap().unique_vertex_count(), 24);
}
