//! # Block Type Registry
//!
//! The process-wide catalog of block types. IDs are dense and handed out in
//! registration order; the registry registers `"air"` itself as ID 0, so every
//! ID stored in a chunk resolves here, including the empty sentinel.

use std::collections::HashMap;
use std::io;

use log::debug;

use super::block_type::{BlockType, BlockTypeInfo};
use super::face::{Face, FaceMap};
use super::{BlockId, AIR_ID};
use crate::engine_state::voxels::error::VoxelError;

/// Name under which the empty block is registered.
pub const AIR_NAME: &str = "air";

/// Catalog of every block type known to the process.
///
/// Lookup by ID is plain array indexing because it runs once per block during
/// tesselation; lookup by name goes through a hash map.
#[derive(Debug)]
pub struct BlockTypeRegistry {
    types_by_id: Vec<BlockType>,
    ids_by_name: HashMap<String, BlockId>,
}

impl Default for BlockTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTypeRegistry {
    /// Creates a registry holding only the air type.
    pub fn new() -> Self {
        let air = BlockType::new(
            AIR_ID,
            AIR_NAME.to_string(),
            BlockTypeInfo {
                solid: false,
                visible: false,
                face_textures: FaceMap::splat(0),
            },
        );
        let mut ids_by_name = HashMap::new();
        ids_by_name.insert(AIR_NAME.to_string(), AIR_ID);

        BlockTypeRegistry {
            types_by_id: vec![air],
            ids_by_name,
        }
    }

    /// Registers a new block type under `name` and assigns it the next free ID.
    ///
    /// # Errors
    /// `DuplicateName` if `name` is taken, `RegistryFull` once every `BlockId`
    /// has been issued.
    pub fn make_type(&mut self, name: &str, info: BlockTypeInfo) -> Result<&BlockType, VoxelError> {
        if self.ids_by_name.contains_key(name) {
            return Err(VoxelError::DuplicateName(name.to_string()));
        }
        let id = BlockId::try_from(self.types_by_id.len()).map_err(|_| VoxelError::RegistryFull)?;

        debug!("Registering block type {:?} as id {}", name, id);
        self.ids_by_name.insert(name.to_string(), id);
        self.types_by_id.push(BlockType::new(id, name.to_string(), info));
        Ok(&self.types_by_id[id as usize])
    }

    /// Looks a block type up by its registration name.
    pub fn get_type_by_name(&self, name: &str) -> Result<&BlockType, VoxelError> {
        self.ids_by_name
            .get(name)
            .map(|id| &self.types_by_id[*id as usize])
            .ok_or_else(|| VoxelError::NotFound(name.to_string()))
    }

    /// Looks a block type up by ID.
    pub fn get_type(&self, id: BlockId) -> Result<&BlockType, VoxelError> {
        self.types_by_id.get(id as usize).ok_or(VoxelError::BadId {
            id,
            count: self.types_by_id.len(),
        })
    }

    /// Returns `true` if `id` was issued by this registry.
    pub fn contains(&self, id: BlockId) -> bool {
        (id as usize) < self.types_by_id.len()
    }

    /// Number of registered types, air included.
    pub fn len(&self) -> usize {
        self.types_by_id.len()
    }

    /// Always `false`: air is registered on construction.
    pub fn is_empty(&self) -> bool {
        self.types_by_id.is_empty()
    }

    /// Iterates over every registered type in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.types_by_id.iter()
    }

    /// Writes a human-readable listing of the catalog to `sink`.
    pub fn dump(&self, sink: &mut impl io::Write) -> io::Result<()> {
        for block_type in &self.types_by_id {
            let info = block_type.info();
            write!(
                sink,
                "{:>5} {:<16} solid={:<5} visible={:<5} textures=",
                block_type.id(),
                block_type.name(),
                info.solid,
                info.visible
            )?;
            let textures: Vec<String> = Face::ALL
                .iter()
                .map(|face| format!("{:?}:{}", face, info.face_textures[*face]))
                .collect();
            writeln!(sink, "[{}]", textures.join(" "))?;
        }
        Ok(())
    }
}
