//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: Tesselates a chunk snapshot for the mesh cache

pub mod chunk_mesh_generation_task;
