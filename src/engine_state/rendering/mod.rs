//! Rendering side of the voxel engine.
//!
//! This module turns chunk data into drawable meshes and keeps those meshes in
//! step with the world:
//!
//! - `visuals`: per-block geometry emitters and their registry
//! - `meshing`: the mesh builder and the chunk tesselation pass
//! - `chunk_mesh_manager`: the asynchronous coordinate → mesh cache
//! - `world_view`: per-frame selection of meshes around the camera
//! - `texture_array` / `gpu`: block textures and the `wgpu` upload of finished data
//!
//! Window, surface and pipeline setup belong to the embedding application.

pub mod chunk_mesh_manager;
pub mod error;
pub mod gpu;
pub mod meshing;
pub mod tasks;
pub mod texture_array;
pub mod visuals;
pub mod world_view;

pub use chunk_mesh_manager::{ChunkMeshManager, DedupPolicy};
pub use error::{MeshError, TextureError};
pub use world_view::{ChunkDraw, WorldView};
