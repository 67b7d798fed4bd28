//! # Engine Configuration
//!
//! Runtime settings, read from JSON. Every field has a default, so an empty
//! object (or no file at all) gives a working setup:
//!
//! ```json
//! {
//!     "worker_threads": 4,
//!     "pending_dedup": "by_coordinate",
//!     "generator": { "kind": "solid", "block": "stone", "border": { "shape": "no_border", "height": 1 } },
//!     "blocks": [
//!         { "name": "stone", "textures": { "all": [128, 128, 128, 255] } },
//!         { "name": "grass", "textures": { "all": "textures/dirt.png", "top": "textures/grass.png" } },
//!         { "name": "flower", "solid": false, "visual": "plant", "textures": { "all": [230, 60, 60, 255] } }
//!     ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine_state::rendering::chunk_mesh_manager::{DedupPolicy, DEFAULT_IDLE_EVICTION_TICKS};
use crate::engine_state::rendering::error::TextureError;
use crate::engine_state::rendering::world_view::DEFAULT_VIEW_RADIUS;
use crate::engine_state::voxels::block::face::Face;
use crate::engine_state::voxels::chunk::chunk_creation::{
    Border, GeneratorKind, StockGenerator, PERLIN_SCALE_FACTOR, PERLIN_THRESHOLD,
};
use crate::engine_state::voxels::error::VoxelError;
use crate::engine_state::voxels::world::DEFAULT_PICK_STEP;

/// Failures while loading configuration or the content it describes.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Voxel(#[from] VoxelError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Where a block face's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextureSource {
    /// An image file, relative to the config file's directory.
    Path(String),
    /// A flat RGBA colour.
    Color([u8; 4]),
}

/// Per-face texture selection. `all` applies to every face without its own entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTextures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<TextureSource>,
    #[serde(flatten)]
    pub faces: HashMap<Face, TextureSource>,
}

impl FaceTextures {
    pub fn uniform(source: TextureSource) -> Self {
        FaceTextures {
            all: Some(source),
            faces: HashMap::new(),
        }
    }

    /// The source for `face`, falling back to `all`.
    pub fn get(&self, face: Face) -> Option<&TextureSource> {
        self.faces.get(&face).or(self.all.as_ref())
    }
}

/// How a block type is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualKind {
    #[default]
    Cube,
    Plant,
    None,
}

/// One block type to register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub name: String,
    #[serde(default = "default_true")]
    pub solid: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub visual: VisualKind,
    #[serde(default)]
    pub textures: FaceTextures,
}

fn default_true() -> bool {
    true
}

impl BlockDefinition {
    fn colored(name: &str, rgba: [u8; 4]) -> Self {
        BlockDefinition {
            name: name.to_string(),
            solid: true,
            visible: true,
            visual: VisualKind::Cube,
            textures: FaceTextures::uniform(TextureSource::Color(rgba)),
        }
    }
}

/// All runtime settings of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads per pool (chunk generation and tesselation each get a pool)
    pub worker_threads: usize,
    /// Ticks an orphaned mesh survives without being requested
    pub idle_eviction_ticks: u32,
    /// Ray march step for block picking, in blocks
    pub pick_step: f32,
    pub pending_dedup: DedupPolicy,
    /// View radius in chunks
    pub view_radius: i32,
    /// Side length of block texture layers, in pixels
    pub texture_size: u32,
    pub generator: StockGenerator,
    pub blocks: Vec<BlockDefinition>,
    /// Base directory for texture paths; set by `load`
    #[serde(skip)]
    pub asset_root: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            worker_threads: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            idle_eviction_ticks: DEFAULT_IDLE_EVICTION_TICKS,
            pick_step: DEFAULT_PICK_STEP,
            pending_dedup: DedupPolicy::default(),
            view_radius: DEFAULT_VIEW_RADIUS,
            texture_size: 16,
            generator: StockGenerator::new(
                GeneratorKind::Perlin {
                    blocks: vec!["stone".to_string(), "dirt".to_string()],
                    seed: 0,
                    scale: PERLIN_SCALE_FACTOR,
                    threshold: PERLIN_THRESHOLD,
                },
                Border::default(),
            ),
            blocks: vec![
                BlockDefinition::colored("stone", [128, 128, 128, 255]),
                BlockDefinition::colored("dirt", [121, 85, 58, 255]),
                BlockDefinition {
                    name: "flower".to_string(),
                    solid: false,
                    visible: true,
                    visual: VisualKind::Plant,
                    textures: FaceTextures::uniform(TextureSource::Color([230, 60, 60, 255])),
                },
            ],
            asset_root: None,
        }
    }
}

impl EngineConfig {
    /// Parses a config from JSON text. Texture paths resolve against the
    /// working directory.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a config file. Texture paths resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading config from {}", path.display());
        let mut config = Self::from_json(&fs::read_to_string(path)?)?;
        config.asset_root = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// `worker_threads`, but never zero.
    pub fn effective_workers(&self) -> usize {
        self.worker_threads.max(1)
    }

    /// Resolves a texture path against `asset_root`.
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        match &self.asset_root {
            Some(root) => root.join(relative),
            None => PathBuf::from(relative),
        }
    }
}
