//! Builds the block type and block visual registries from configuration.

use std::sync::Arc;

use log::{info, warn};

use crate::config::{BlockDefinition, ConfigError, EngineConfig, TextureSource, VisualKind};
use crate::engine_state::rendering::error::TextureError;
use crate::engine_state::rendering::texture_array::TextureArrayBuilder;
use crate::engine_state::rendering::visuals::cube::CubeVisual;
use crate::engine_state::rendering::visuals::plant::PlantVisual;
use crate::engine_state::rendering::visuals::{BlockVisualRegistry, BlockVisualRegistryBuilder};
use crate::engine_state::voxels::block::block_type::BlockTypeInfo;
use crate::engine_state::voxels::block::face::{Face, FaceMap};
use crate::engine_state::voxels::block::registry::BlockTypeRegistry;

/// Colour used for faces with no texture configured.
pub const MISSING_TEXTURE_COLOR: [u8; 4] = [255, 0, 255, 255];

fn resolve_texture(
    config: &EngineConfig,
    textures: &mut TextureArrayBuilder,
    source: Option<&TextureSource>,
) -> Result<u32, TextureError> {
    match source {
        Some(TextureSource::Path(path)) => textures.add_file(&config.asset_path(path)),
        Some(TextureSource::Color(rgba)) => textures.add_color(*rgba),
        None => textures.add_color(MISSING_TEXTURE_COLOR),
    }
}

fn face_layers(
    config: &EngineConfig,
    textures: &mut TextureArrayBuilder,
    def: &BlockDefinition,
) -> Result<FaceMap<u32>, TextureError> {
    let mut layers = FaceMap::splat(0);
    for face in Face::ALL {
        layers[face] = resolve_texture(config, textures, def.textures.get(face))?;
    }
    Ok(layers)
}

/// Registers every block in `config.blocks` and attaches its visual.
///
/// Textures are loaded (or generated) into one array; identical sources share
/// a layer. Invisible blocks get no visual regardless of `visual`.
///
/// # Errors
/// Duplicate block names, unreadable images and images of the wrong size.
pub fn load_content(
    config: &EngineConfig,
) -> Result<(Arc<BlockTypeRegistry>, BlockVisualRegistry), ConfigError> {
    let mut registry = BlockTypeRegistry::new();
    let mut visuals = BlockVisualRegistryBuilder::new(config.texture_size);

    for def in &config.blocks {
        let face_textures = if def.visible && def.visual != VisualKind::None {
            face_layers(config, visuals.textures(), def)?
        } else {
            FaceMap::splat(0)
        };

        let block = registry.make_type(
            &def.name,
            BlockTypeInfo {
                solid: def.solid,
                visible: def.visible,
                face_textures,
            },
        )?;

        if !block.is_visible() {
            continue;
        }
        match def.visual {
            VisualKind::Cube => {
                visuals.set_visual(block.id(), Box::new(CubeVisual::from_block_type(block)));
            }
            VisualKind::Plant => {
                if def.solid {
                    warn!("Plant block {:?} is solid and will hide cube faces", def.name);
                }
                visuals.set_visual(
                    block.id(),
                    Box::new(PlantVisual::new(block.face_texture(Face::FRONT))),
                );
            }
            VisualKind::None => {}
        }
    }

    let visuals = visuals.build();
    info!(
        "Loaded {} block types, {} visuals, {} texture layers",
        registry.len(),
        visuals.visual_count(),
        visuals.block_texture().layers()
    );
    Ok((Arc::new(registry), visuals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::AIR_ID;
    use crate::engine_state::voxels::error::VoxelError;

    #[test]
    fn default_content_loads() {
        let (registry, visuals) = load_content(&EngineConfig::default()).unwrap();

        assert_eq!(registry.len(), 4);
        let stone = registry.get_type_by_name("stone").unwrap();
        let flower = registry.get_type_by_name("flower").unwrap();
        assert!(stone.is_solid());
        assert!(!flower.is_solid());
        assert!(visuals.has_visual(stone.id()));
        assert!(visuals.get_visual(flower.id()).unwrap().is_transparent());
        assert!(!visuals.has_visual(AIR_ID));
        // stone, dirt and flower colours
        assert_eq!(visuals.block_texture().layers(), 3);
    }

    #[test]
    fn shared_sources_share_layers() {
        let config = EngineConfig::from_json(
            r#"{ "blocks": [
                { "name": "grass", "textures": { "all": [90, 60, 40, 255], "top": [0, 200, 0, 255] } },
                { "name": "dirt", "textures": { "all": [90, 60, 40, 255] } },
                { "name": "bare" }
            ] }"#,
        )
        .unwrap();
        let (registry, visuals) = load_content(&config).unwrap();

        let grass = registry.get_type_by_name("grass").unwrap();
        let dirt = registry.get_type_by_name("dirt").unwrap();
        let bare = registry.get_type_by_name("bare").unwrap();
        assert_ne!(grass.face_texture(Face::TOP), grass.face_texture(Face::LEFT));
        assert_eq!(grass.face_texture(Face::LEFT), dirt.face_texture(Face::TOP));
        // brown, green, missing-texture magenta
        assert_eq!(visuals.block_texture().layers(), 3);
        assert_ne!(bare.face_texture(Face::TOP), dirt.face_texture(Face::TOP));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let config = EngineConfig::from_json(
            r#"{ "blocks": [ { "name": "stone" }, { "name": "stone" } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            load_content(&config),
            Err(ConfigError::Voxel(VoxelError::DuplicateName(name))) if name == "stone"
        ));
    }

    #[test]
    fn missing_image_is_reported() {
        let config = EngineConfig::from_json(
            r#"{ "blocks": [ { "name": "brick", "textures": { "all": "/nonexistent/brick.png" } } ] }"#,
        )
        .unwrap();
        assert!(matches!(load_content(&config), Err(ConfigError::Texture(_))));
    }
}
