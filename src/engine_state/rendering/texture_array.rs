//! Block texture packing.
//!
//! Block textures are equally sized RGBA images stacked into a single array
//! texture. Each distinct source image gets one layer; the layer index is what
//! ends up in the third texture coordinate of every block vertex.
//!
//! The CPU-side `ArrayTexture` keeps the layers stacked vertically in one
//! buffer, which is also the row order `wgpu` expects for a 2D array upload.

use std::collections::HashMap;
use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};
use log::debug;

use super::error::TextureError;

/// Incrementally collects block textures and assigns them layer indices.
///
/// Images are deduplicated by key (normally the source path), so two block
/// faces naming the same file share a layer.
#[derive(Debug)]
pub struct TextureArrayBuilder {
    width: u32,
    height: u32,
    layers: Vec<RgbaImage>,
    layers_by_key: HashMap<String, u32>,
}

impl TextureArrayBuilder {
    /// Creates a builder for `width` x `height` layers.
    pub fn new(width: u32, height: u32) -> Self {
        TextureArrayBuilder {
            width,
            height,
            layers: Vec::new(),
            layers_by_key: HashMap::new(),
        }
    }

    /// Adds `image` under `key` and returns its layer.
    ///
    /// A key seen before returns the existing layer without looking at `image`.
    ///
    /// # Errors
    /// `SizeMismatch` if `image` is not the configured layer size.
    pub fn add_image(&mut self, key: &str, image: &RgbaImage) -> Result<u32, TextureError> {
        if let Some(layer) = self.layers_by_key.get(key) {
            return Ok(*layer);
        }
        if image.dimensions() != (self.width, self.height) {
            return Err(TextureError::SizeMismatch {
                key: key.to_string(),
                expected: (self.width, self.height),
                found: image.dimensions(),
            });
        }

        let layer = self.layers.len() as u32;
        debug!("Texture {:?} assigned layer {}", key, layer);
        self.layers.push(image.clone());
        self.layers_by_key.insert(key.to_string(), layer);
        Ok(layer)
    }

    /// Loads an image file and adds it, keyed by its path.
    pub fn add_file(&mut self, path: &Path) -> Result<u32, TextureError> {
        let key = path.to_string_lossy().into_owned();
        if let Some(layer) = self.layers_by_key.get(&key) {
            return Ok(*layer);
        }
        let image = image::open(path)?.to_rgba8();
        self.add_image(&key, &image)
    }

    /// Adds a layer filled with one colour, keyed by the colour value.
    pub fn add_color(&mut self, rgba: [u8; 4]) -> Result<u32, TextureError> {
        let key = format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            rgba[0], rgba[1], rgba[2], rgba[3]
        );
        let image = ImageBuffer::from_pixel(self.width, self.height, Rgba(rgba));
        self.add_image(&key, &image)
    }

    pub fn layer_count(&self) -> u32 {
        self.layers.len() as u32
    }

    /// Finalizes the array. No layers can be added afterwards.
    pub fn build(self) -> ArrayTexture {
        let mut data = Vec::with_capacity(self.layers.len() * (self.width * self.height * 4) as usize);
        for layer in &self.layers {
            data.extend_from_slice(layer.as_raw());
        }
        ArrayTexture {
            width: self.width,
            height: self.height,
            layers: self.layers.len() as u32,
            data,
        }
    }
}

/// A finalized stack of equally sized RGBA8 layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayTexture {
    width: u32,
    height: u32,
    layers: u32,
    data: Vec<u8>,
}

impl ArrayTexture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// All layers back to back, row-major RGBA8.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The pixels of one layer.
    pub fn layer(&self, layer: u32) -> Option<&[u8]> {
        let size = (self.width * self.height * 4) as usize;
        let start = layer as usize * size;
        self.data.get(start..start + size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_are_deduplicated_by_key() {
        let mut builder = TextureArrayBuilder::new(2, 2);
        let red = builder.add_color([255, 0, 0, 255]).unwrap();
        let green = builder.add_color([0, 255, 0, 255]).unwrap();
        let red_again = builder.add_color([255, 0, 0, 255]).unwrap();
        assert_eq!((red, green, red_again), (0, 1, 0));

        let array = builder.build();
        assert_eq!(array.layers(), 2);
        assert_eq!(array.data().len(), 2 * 2 * 2 * 4);
        assert_eq!(&array.layer(1).unwrap()[..4], &[0, 255, 0, 255]);
        assert_eq!(array.layer(2), None);
    }

    #[test]
    fn wrong_size_is_rejected() {
        let mut builder = TextureArrayBuilder::new(16, 16);
        let image = RgbaImage::new(8, 16);
        assert!(matches!(
            builder.add_image("small.png", &image),
            Err(TextureError::SizeMismatch {
                found: (8, 16),
                ..
            })
        ));
        assert_eq!(builder.layer_count(), 0);
    }
}
