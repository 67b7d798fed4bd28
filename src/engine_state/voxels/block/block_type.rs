//! # Block Type Module
//!
//! This module defines the immutable catalog entry describing one kind of block.
//! Block types are created once through the `BlockTypeRegistry` and live for the
//! rest of the process; chunks store only their compact `BlockId`.

use serde::{Deserialize, Serialize};

use super::face::{Face, FaceMap};
use super::BlockId;

/// Per-type properties supplied at registration time.
///
/// This is the mutable "recipe" for a block type. The registry copies it into
/// a `BlockType` and never changes it afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockTypeInfo {
    /// Whether the block occludes the faces of its neighbors.
    pub solid: bool,
    /// Whether the block is drawn at all.
    pub visible: bool,
    /// Texture array layer used by each face.
    pub face_textures: FaceMap<u32>,
}

impl Default for BlockTypeInfo {
    fn default() -> Self {
        BlockTypeInfo {
            solid: true,
            visible: true,
            face_textures: FaceMap::splat(0),
        }
    }
}

impl BlockTypeInfo {
    /// Sets the texture layer of a single face.
    pub fn set_face_texture(&mut self, face: Face, layer: u32) -> &mut Self {
        self.face_textures[face] = layer;
        self
    }

    /// Sets every face to the same texture layer.
    pub fn set_all_face_textures(&mut self, layer: u32) -> &mut Self {
        self.face_textures.fill(layer);
        self
    }
}

/// An immutable, registry-owned description of one kind of block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockType {
    id: BlockId,
    name: String,
    info: BlockTypeInfo,
}

impl BlockType {
    pub(super) fn new(id: BlockId, name: String, info: BlockTypeInfo) -> Self {
        BlockType { id, name, info }
    }

    /// The dense identifier assigned at registration.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// The unique registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registration properties.
    pub fn info(&self) -> &BlockTypeInfo {
        &self.info
    }

    /// Whether the block occludes neighboring faces.
    pub fn is_solid(&self) -> bool {
        self.info.solid
    }

    /// Whether the block is drawn.
    pub fn is_visible(&self) -> bool {
        self.info.visible
    }

    /// The texture layer drawn on `face`.
    pub fn face_texture(&self, face: Face) -> u32 {
        self.info.face_textures[face]
    }
}
