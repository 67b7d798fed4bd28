//! # Voxel Renderer Entry Point
//!
//! Runs the engine headless once and reports what it built.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- engine.json
//! ```

use std::process::ExitCode;

fn main() -> ExitCode {
    match voxel_renderer::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
