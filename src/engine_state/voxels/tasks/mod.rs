//! # Voxel Task System
//!
//! Tasks related to voxel world generation. They run on the world's worker pool
//! so that supplying a chunk never stalls the foreground loop.

pub mod chunk_generation_task;
