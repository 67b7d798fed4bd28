//! # Voxel Data Model
//!
//! This module contains the data side of the engine: what a block is, how blocks
//! are stored, and how chunks are arranged and edited in the world.
//!
//! ## Architecture
//!
//! * **Block**: block type catalog (`BlockTypeRegistry`), per-face properties and
//!   the `Face` directions
//! * **Chunk**: dense 32³ arrays of block IDs, the chunk-local `ChunkIndex`, and
//!   the suppliers that fill new chunks
//! * **World**: the sparse `ChunkGrid` of shared chunk snapshots, ray picking and
//!   copy-on-write block edits
//! * **Tasks**: background chunk generation
//!
//! ## Thread Safety
//!
//! * Published chunks are immutable `Arc<Chunk>` snapshots and are read
//!   concurrently without locks
//! * The grid itself is only mutated by its owning (foreground) thread
//! * Workers receive snapshots and send back results over channels

pub mod block;
pub mod chunk;
pub mod error;
pub mod tasks;
pub mod world;
