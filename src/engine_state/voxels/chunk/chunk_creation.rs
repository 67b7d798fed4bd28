//! # Chunk Creation Module
//!
//! This module defines how new chunks come into existence. The world never builds
//! chunks itself; it asks a `ChunkSupplier` for the chunk at a coordinate, on a
//! worker thread, and publishes whatever comes back.
//!
//! ## Borders
//!
//! Every supplier reports a `Border` that bounds the set of chunk coordinates it
//! is willing to fill. The world skips generation outside of it, so a finite
//! island or disc of terrain stays finite no matter where the camera goes.
//!
//! ## Stock Generators
//!
//! `StockGenerator` covers the simple cases used for testing and demos:
//! - `Empty`: all air
//! - `Solid`: every cell one block
//! - `Checkerboard`: alternating block / air in world space
//! - `Random`: independent cells at a given density
//! - `Perlin`: 3D Perlin noise with an air band around zero

use std::sync::Arc;

use cgmath::Point3;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::chunk_index::ChunkIndex;
use super::{Chunk, CHUNK_X_SIZE, CHUNK_Y_SIZE, CHUNK_Z_SIZE};
use crate::engine_state::voxels::block::registry::BlockTypeRegistry;
use crate::engine_state::voxels::block::BlockId;
use crate::engine_state::voxels::error::VoxelError;

/// Default Perlin threshold: samples within `[-t, t]` are air.
pub const PERLIN_THRESHOLD: f64 = 0.2;
/// Default scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;

/// The region of chunk coordinates a supplier fills. `z` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Border {
    /// `min_x <= x < max_x`, `min_y <= y < max_y`, `0 <= z < height`.
    Rectangle {
        min_x: i32,
        max_x: i32,
        min_y: i32,
        max_y: i32,
        height: i32,
    },
    /// `x² + y² < radius²`, `0 <= z < height`.
    Circle { radius: i32, height: i32 },
    /// Unbounded horizontally and downwards; only `z < height`.
    NoBorder { height: i32 },
}

impl Default for Border {
    fn default() -> Self {
        Border::NoBorder { height: 1 }
    }
}

impl Border {
    /// Returns `true` if the chunk at `pos` should be generated.
    pub fn in_bounds(&self, pos: Point3<i32>) -> bool {
        match *self {
            Border::Rectangle {
                min_x,
                max_x,
                min_y,
                max_y,
                height,
            } => {
                (min_x..max_x).contains(&pos.x)
                    && (min_y..max_y).contains(&pos.y)
                    && (0..height).contains(&pos.z)
            }
            Border::Circle { radius, height } => {
                let r2 = i64::from(radius) * i64::from(radius);
                let d2 = i64::from(pos.x).pow(2) + i64::from(pos.y).pow(2);
                d2 < r2 && (0..height).contains(&pos.z)
            }
            Border::NoBorder { height } => pos.z < height,
        }
    }
}

/// Produces the contents of a chunk for a chunk coordinate.
///
/// Suppliers run on worker threads, possibly several at once for different
/// coordinates, and must not touch the chunk grid or the mesh cache.
pub trait ChunkSupplier: Send + Sync {
    /// Builds the chunk at chunk coordinate `pos`.
    fn generate_chunk(
        &self,
        pos: Point3<i32>,
        registry: &Arc<BlockTypeRegistry>,
    ) -> Result<Chunk, VoxelError>;

    /// The region this supplier fills.
    fn border(&self) -> Border {
        Border::default()
    }

    /// Returns `true` if `pos` lies inside `border()`.
    fn in_bounds(&self, pos: Point3<i32>) -> bool {
        self.border().in_bounds(pos)
    }
}

/// Selects one of the stock generation strategies. Blocks are named, not
/// numbered, and resolved against the registry at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorKind {
    Empty,
    Solid {
        block: String,
    },
    Checkerboard {
        block: String,
    },
    Random {
        block: String,
        density: f64,
        #[serde(default)]
        seed: u64,
    },
    Perlin {
        blocks: Vec<String>,
        #[serde(default)]
        seed: u32,
        #[serde(default = "default_perlin_scale")]
        scale: f64,
        #[serde(default = "default_perlin_threshold")]
        threshold: f64,
    },
}

fn default_perlin_scale() -> f64 {
    PERLIN_SCALE_FACTOR
}

fn default_perlin_threshold() -> f64 {
    PERLIN_THRESHOLD
}

/// A configurable supplier built from a `GeneratorKind` and a `Border`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockGenerator {
    #[serde(flatten)]
    pub kind: GeneratorKind,
    #[serde(default)]
    pub border: Border,
}

impl Default for StockGenerator {
    fn default() -> Self {
        StockGenerator {
            kind: GeneratorKind::Empty,
            border: Border::default(),
        }
    }
}

impl StockGenerator {
    pub fn new(kind: GeneratorKind, border: Border) -> Self {
        StockGenerator { kind, border }
    }
}

impl ChunkSupplier for StockGenerator {
    fn generate_chunk(
        &self,
        pos: Point3<i32>,
        registry: &Arc<BlockTypeRegistry>,
    ) -> Result<Chunk, VoxelError> {
        let lookup = |name: &str| registry.get_type_by_name(name).map(|t| t.id());

        match &self.kind {
            GeneratorKind::Empty => Ok(Chunk::new(registry.clone())),
            GeneratorKind::Solid { block } => Chunk::filled(registry.clone(), lookup(block)?),
            GeneratorKind::Checkerboard { block } => {
                let id = lookup(block)?;
                fill_with(registry, pos, |world| {
                    ((world.x + world.y + world.z).rem_euclid(2) == 0).then_some(id)
                })
            }
            GeneratorKind::Random {
                block,
                density,
                seed,
            } => {
                let id = lookup(block)?;
                let mut rng = fastrand::Rng::with_seed(chunk_seed(*seed, pos));
                fill_with(registry, pos, |_| (rng.f64() < *density).then_some(id))
            }
            GeneratorKind::Perlin {
                blocks,
                seed,
                scale,
                threshold,
            } => {
                let ids = blocks
                    .iter()
                    .map(|name| lookup(name))
                    .collect::<Result<Vec<BlockId>, _>>()?;
                if ids.is_empty() {
                    return Ok(Chunk::new(registry.clone()));
                }
                let perlin = Perlin::new(*seed);
                let mut rng = fastrand::Rng::with_seed(chunk_seed(u64::from(*seed), pos));
                fill_with(registry, pos, |world| {
                    let sample = perlin.get(to_perlin_pos(world, *scale));
                    (!(-*threshold..=*threshold).contains(&sample))
                        .then(|| ids[rng.usize(..ids.len())])
                })
            }
        }
    }

    fn border(&self) -> Border {
        self.border
    }
}

/// Builds a chunk by asking `block_at` for every cell, in world coordinates.
/// `None` leaves the cell as air.
fn fill_with(
    registry: &Arc<BlockTypeRegistry>,
    chunk_pos: Point3<i32>,
    mut block_at: impl FnMut(Point3<i32>) -> Option<BlockId>,
) -> Result<Chunk, VoxelError> {
    let mut chunk = Chunk::new(registry.clone());
    for local in ChunkIndex::range() {
        let world = Point3::new(
            local.x() + CHUNK_X_SIZE * chunk_pos.x,
            local.y() + CHUNK_Y_SIZE * chunk_pos.y,
            local.z() + CHUNK_Z_SIZE * chunk_pos.z,
        );
        if let Some(id) = block_at(world) {
            chunk.set_block(local, id)?;
        }
    }
    Ok(chunk)
}

fn to_perlin_pos(pos: Point3<i32>, scale_factor: f64) -> [f64; 3] {
    [
        pos.x as f64 * scale_factor,
        pos.y as f64 * scale_factor,
        pos.z as f64 * scale_factor,
    ]
}

/// Mixes the generator seed with the chunk coordinate so that every chunk gets
/// its own reproducible stream.
fn chunk_seed(seed: u64, pos: Point3<i32>) -> u64 {
    let mut h = seed ^ 0x9E37_79B9_7F4A_7C15;
    for c in [pos.x, pos.y, pos.z] {
        h = (h ^ (c as u32 as u64)).wrapping_mul(0x1000_0000_01B3);
    }
    h
}
