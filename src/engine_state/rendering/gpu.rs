//! GPU upload of finished meshes and the block texture array.
//!
//! Everything upstream of this module is plain CPU data. A renderer calls
//! `GpuMesh::upload` on the meshes it receives from the mesh manager and binds
//! `GpuArrayTexture` once; the vertex layout is derived from the mesh's
//! `MeshFormat`, one `f32` vector attribute per declared attribute.

use wgpu::util::DeviceExt;

use super::meshing::{Mesh, MeshFormat};
use super::texture_array::ArrayTexture;

impl MeshFormat {
    /// Vertex attributes for this layout, at shader locations `0..n`.
    ///
    /// # Returns
    /// `None` if an attribute is not 1 to 4 floats long.
    pub fn vertex_attributes(&self) -> Option<Vec<wgpu::VertexAttribute>> {
        let mut offset = 0;
        self.attribute_lengths()
            .iter()
            .enumerate()
            .map(|(location, len)| {
                let format = match *len {
                    1 => wgpu::VertexFormat::Float32,
                    2 => wgpu::VertexFormat::Float32x2,
                    3 => wgpu::VertexFormat::Float32x3,
                    4 => wgpu::VertexFormat::Float32x4,
                    _ => return None,
                };
                let attribute = wgpu::VertexAttribute {
                    format,
                    offset,
                    shader_location: location as u32,
                };
                offset += format.size();
                Some(attribute)
            })
            .collect()
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> wgpu::BufferAddress {
        (self.vertex_size() * std::mem::size_of::<f32>()) as wgpu::BufferAddress
    }

    /// The buffer layout for `attributes` as returned by `vertex_attributes`.
    pub fn buffer_layout<'a>(
        &self,
        attributes: &'a [wgpu::VertexAttribute],
    ) -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// A mesh resident on the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    /// Uploads `mesh`. Empty meshes have nothing to draw and yield `None`.
    pub fn upload(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Option<Self> {
        if mesh.is_empty() {
            return None;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertices", label)),
            contents: mesh.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} indices", label)),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });

        Some(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.vertex_count() as u32,
        })
    }

    /// Records the draw call for this mesh.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// The block texture array resident on the GPU.
pub struct GpuArrayTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuArrayTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, array: &ArrayTexture) -> Self {
        let size = wgpu::Extent3d {
            width: array.width(),
            height: array.height(),
            depth_or_array_layers: array.layers().max(1),
        };
        let desc = wgpu::TextureDescriptor {
            label: Some("block texture array"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        };

        // A texture array needs at least one layer
        let blank;
        let data = if array.layers() == 0 {
            blank = vec![0u8; (array.width() * array.height() * 4) as usize];
            &blank[..]
        } else {
            array.data()
        };

        let texture = device.create_texture_with_data(
            queue,
            &desc,
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        GpuArrayTexture {
            texture,
            view,
            sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_format_maps_to_three_vec3_attributes() {
        let format = MeshFormat::block();
        let attributes = format.vertex_attributes().unwrap();
        assert_eq!(attributes.len(), 3);
        assert_eq!(
            attributes.iter().map(|a| a.offset).collect::<Vec<_>>(),
            vec![0, 12, 24]
        );
        assert!(attributes
            .iter()
            .all(|a| a.format == wgpu::VertexFormat::Float32x3));
        assert_eq!(format.stride(), 36);
        assert_eq!(format.buffer_layout(&attributes).array_stride, 36);
    }

    #[test]
    fn oversized_attributes_are_rejected() {
        assert!(MeshFormat::new(&[3, 5]).vertex_attributes().is_none());
        assert_eq!(
            MeshFormat::new(&[2, 1]).vertex_attributes().unwrap()[1].offset,
            8
        );
    }
}
