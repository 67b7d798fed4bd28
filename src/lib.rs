#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Renderer
//!
//! The data and meshing core of a voxel engine: block types, chunk storage,
//! visibility-culled chunk tesselation and an asynchronous chunk mesh cache,
//! with `wgpu` upload helpers for the results.
//!
//! ## Key Modules
//!
//! * `engine_state` - Voxel data, rendering, task management and the tick loop
//! * `config` - JSON engine configuration
//! * `content` - Block types and visuals built from configuration
//!
//! ## Architecture
//!
//! * Chunks are immutable shared snapshots; edits publish a modified copy
//! * Tesselation runs on worker threads and never blocks the caller
//! * The mesh cache serves the last good mesh until a fresh one lands
//!
//! ## Usage
//!
//! ```ignore
//! fn main() {
//!     voxel_renderer::run();
//! }
//! ```

use std::env;

use engine_state::EngineState;
use log::{error, info};
use web_time::{Duration, Instant};

pub mod config;
pub mod content;
pub mod engine_state;

use config::{ConfigError, EngineConfig};

/// How long the headless run waits for the world around the origin to mesh.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Headless entry point: loads the config named by the first command line
/// argument (or the defaults), generates and meshes the view around the
/// origin, and logs what would be drawn.
pub fn run() -> Result<(), ConfigError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let start = Instant::now();
    let mut engine = EngineState::new(&config)?;
    let (draws, settled) = engine.tick_until_idle(SETTLE_TIMEOUT);
    if !settled {
        error!("World did not settle within {:?}", SETTLE_TIMEOUT);
    }

    let indices: usize = draws.iter().map(|draw| draw.mesh.vertex_count()).sum();
    info!(
        "{} chunks loaded, {} meshes to draw ({} indices) after {} ticks in {:?}",
        engine.world.grid().len(),
        draws.len(),
        indices,
        engine.ticks(),
        start.elapsed()
    );
    Ok(())
}
