//! Mesh generation for voxel rendering.
//!
//! # Architecture
//! - `mesh`: the `MeshBuilder` accumulator and the immutable `Mesh` it produces
//! - `tesselate`: the per-chunk pass that drives block visuals over every cell
//!
//! Both run on worker threads. Nothing here touches the GPU; uploading a
//! finished `Mesh` is the job of `rendering::gpu`.

pub mod mesh;
pub mod tesselate;

pub use mesh::{Index, Mesh, MeshBuilder, MeshFormat};
pub use tesselate::{tesselate, tesselate_chunk};
