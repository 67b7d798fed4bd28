//! Errors raised while building meshes and block textures.

use thiserror::Error;

use crate::engine_state::voxels::error::VoxelError;

/// Failures of mesh construction and chunk tesselation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A vertex was finished with a different number of floats than the
    /// builder's format declares.
    #[error("vertex layout mismatch: expected {expected} floats, found {found}")]
    LayoutMismatch { expected: usize, found: usize },
    /// `repeat_vertex` referred to a vertex that was never emitted.
    #[error("cannot reuse vertex {index}: only {emitted} vertices emitted")]
    InvalidIndexReuse { index: u32, emitted: u32 },
    #[error(transparent)]
    Voxel(#[from] VoxelError),
    /// The tesselation job died before producing a mesh.
    #[error("tesselation aborted: {0}")]
    Aborted(String),
}

/// Failures of block texture loading and packing.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("texture `{key}` is {found:?}, expected {expected:?}")]
    SizeMismatch {
        key: String,
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("failed to load texture: {0}")]
    Image(#[from] image::ImageError),
}
