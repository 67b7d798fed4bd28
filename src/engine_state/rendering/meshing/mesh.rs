//! Mesh data structures for voxel rendering.
//!
//! This module provides the accumulator that tesselation writes into
//! (`MeshBuilder`) and the immutable result it finalizes into (`Mesh`).
//!
//! ## Layout
//!
//! A `MeshFormat` declares per-vertex attribute lengths in floats, for example
//! `[3, 3, 3]` for position, normal and texture coordinate. Vertex data is one
//! flat interleaved `f32` stream; triangles are a `u32` index stream. A vertex
//! can be referenced more than once through `repeat_vertex`, which is how a
//! quad costs 4 unique vertices and 6 indices.

use cgmath::{Point3, Vector3};

use crate::engine_state::rendering::error::MeshError;

/// Index into a mesh's unique vertex list.
pub type Index = u32;

/// The per-vertex attribute layout of a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshFormat {
    attribute_lengths: Vec<u32>,
    vertex_size: usize,
}

impl MeshFormat {
    /// Creates a format from attribute lengths, in floats.
    pub fn new(attribute_lengths: &[u32]) -> Self {
        MeshFormat {
            attribute_lengths: attribute_lengths.to_vec(),
            vertex_size: attribute_lengths.iter().map(|len| *len as usize).sum(),
        }
    }

    /// Position, normal and `(u, v, layer)` texture coordinate, 3 floats each.
    pub fn block() -> Self {
        MeshFormat::new(&[3, 3, 3])
    }

    /// Floats per vertex.
    pub fn vertex_size(&self) -> usize {
        self.vertex_size
    }

    pub fn attribute_count(&self) -> usize {
        self.attribute_lengths.len()
    }

    /// Length of one attribute, in floats.
    pub fn attribute_size(&self, attribute: usize) -> Option<u32> {
        self.attribute_lengths.get(attribute).copied()
    }

    pub fn attribute_lengths(&self) -> &[u32] {
        &self.attribute_lengths
    }
}

impl Default for MeshFormat {
    fn default() -> Self {
        MeshFormat::block()
    }
}

/// An accumulator for vertex and index data.
///
/// Append floats for one vertex, then `finish_vertex` to validate it against the
/// format and emit its index. `reset` clears everything while keeping the
/// allocations, so one builder can serve many chunks.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    format: MeshFormat,
    /// Floats appended to the vertex in progress
    pending_floats: usize,
    next_index: Index,
    vertices: Vec<f32>,
    indices: Vec<Index>,
}

impl MeshBuilder {
    pub fn new(format: MeshFormat) -> Self {
        MeshBuilder {
            format,
            ..Default::default()
        }
    }

    /// Clears all data and switches to `format`. Capacity is retained.
    pub fn reset(&mut self, format: MeshFormat) {
        self.format = format;
        self.pending_floats = 0;
        self.next_index = 0;
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn format(&self) -> &MeshFormat {
        &self.format
    }

    /// Number of entries in the index stream.
    pub fn vertex_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of distinct vertices emitted.
    pub fn unique_vertex_count(&self) -> usize {
        self.next_index as usize
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[Index] {
        &self.indices
    }

    /// Appends raw floats to the vertex in progress.
    pub fn append(&mut self, values: &[f32]) {
        self.vertices.extend_from_slice(values);
        self.pending_floats += values.len();
    }

    pub fn append_vec3(&mut self, v: Vector3<f32>) {
        self.append(&[v.x, v.y, v.z]);
    }

    pub fn append_point3(&mut self, p: Point3<f32>) {
        self.append(&[p.x, p.y, p.z]);
    }

    /// Completes the vertex in progress and pushes its index.
    ///
    /// # Errors
    /// `LayoutMismatch` if the appended floats do not add up to the format's
    /// vertex size. The partial vertex is discarded.
    pub fn finish_vertex(&mut self) -> Result<Index, MeshError> {
        if self.pending_floats != self.format.vertex_size() {
            let found = self.pending_floats;
            self.vertices.truncate(self.vertices.len() - found);
            self.pending_floats = 0;
            return Err(MeshError::LayoutMismatch {
                expected: self.format.vertex_size(),
                found,
            });
        }
        self.pending_floats = 0;
        self.indices.push(self.next_index);
        self.next_index += 1;
        Ok(self.next_index - 1)
    }

    /// Appends a position / normal / texcoord vertex and finishes it.
    pub fn make_vertex(
        &mut self,
        pos: Point3<f32>,
        normal: Vector3<f32>,
        tex: Vector3<f32>,
    ) -> Result<Index, MeshError> {
        self.append_point3(pos);
        self.append_vec3(normal);
        self.append_vec3(tex);
        self.finish_vertex()
    }

    /// Pushes an already emitted vertex onto the index stream again.
    ///
    /// # Errors
    /// `InvalidIndexReuse` if `index` was never returned by `finish_vertex`.
    pub fn repeat_vertex(&mut self, index: Index) -> Result<(), MeshError> {
        if index >= self.next_index {
            return Err(MeshError::InvalidIndexReuse {
                index,
                emitted: self.next_index,
            });
        }
        self.indices.push(index);
        Ok(())
    }

    /// Packages the accumulated data into an immutable `Mesh`.
    ///
    /// The builder keeps its data; call `reset` before reusing it.
    ///
    /// # Errors
    /// `LayoutMismatch` if a vertex is still in progress.
    pub fn build(&self) -> Result<Mesh, MeshError> {
        if self.pending_floats != 0 {
            return Err(MeshError::LayoutMismatch {
                expected: self.format.vertex_size(),
                found: self.pending_floats,
            });
        }
        Ok(Mesh {
            format: self.format.clone(),
            unique_vertex_count: self.next_index as usize,
            vertices: self.vertices.as_slice().into(),
            indices: self.indices.as_slice().into(),
        })
    }
}

/// An immutable, upload-ready vertex and index buffer pair.
///
/// Replacing a chunk's geometry means building a new `Mesh`; the old one is
/// released when its last holder drops it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    format: MeshFormat,
    unique_vertex_count: usize,
    vertices: Box<[f32]>,
    indices: Box<[Index]>,
}

impl Mesh {
    pub fn format(&self) -> &MeshFormat {
        &self.format
    }

    /// Number of entries in the index stream, which is what a draw call covers.
    pub fn vertex_count(&self) -> usize {
        self.indices.len()
    }

    pub fn unique_vertex_count(&self) -> usize {
        self.unique_vertex_count
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[Index] {
        &self.indices
    }

    /// The vertex stream as bytes for a GPU upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index stream as bytes for a GPU upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Iterates over the unique vertices, one float slice each.
    pub fn vertex_iter(&self) -> impl Iterator<Item = &[f32]> {
        self.vertices.chunks_exact(self.format.vertex_size().max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_shares_two_vertices() {
        let mut builder = MeshBuilder::new(MeshFormat::new(&[2]));
        let v0 = builder.finish_vertex_with(&[0.0, 0.0]);
        let a = builder.finish_vertex_with(&[1.0, 0.0]);
        let b = builder.finish_vertex_with(&[0.0, 1.0]);
        builder.repeat_vertex(a).unwrap();
        builder.finish_vertex_with(&[1.0, 1.0]);
        builder.repeat_vertex(b).unwrap();

        let mesh = builder.build().unwrap();
        assert_eq!(v0, 0);
        assert_eq!(mesh.indices(), &[0, 1, 2, 1, 3, 2]);
        assert_eq!(mesh.unique_vertex_count(), 4);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.vertex_bytes().len(), 8 * 4);
        assert_eq!(mesh.vertex_iter().nth(3), Some(&[1.0, 1.0][..]));
    }

    #[test]
    fn wrong_vertex_size_is_rejected() {
        let mut builder = MeshBuilder::new(MeshFormat::block());
        builder.append(&[1.0, 2.0]);
        assert_eq!(
            builder.finish_vertex(),
            Err(MeshError::LayoutMismatch {
                expected: 9,
                found: 2
            })
        );
        // The partial vertex is gone and the builder is usable again
        assert!(builder.vertices().is_empty());
        builder
            .make_vertex(Point3::new(0.0, 0.0, 0.0), Vector3::unit_z(), Vector3::unit_x())
            .unwrap();

        builder.append(&[1.0]);
        assert!(matches!(
            builder.build(),
            Err(MeshError::LayoutMismatch { found: 1, .. })
        ));
    }

    #[test]
    fn repeating_unknown_vertex_fails() {
        let mut builder = MeshBuilder::new(MeshFormat::new(&[1]));
        assert_eq!(
            builder.repeat_vertex(0),
            Err(MeshError::InvalidIndexReuse {
                index: 0,
                emitted: 0
            })
        );
    }

    #[test]
    fn reset_clears_but_keeps_builder_usable() {
        let mut builder = MeshBuilder::new(MeshFormat::new(&[1]));
        builder.finish_vertex_with(&[4.0]);
        builder.reset(MeshFormat::new(&[2, 1]));
        assert_eq!(builder.vertex_count(), 0);
        assert_eq!(builder.format().vertex_size(), 3);
        assert!(builder.build().unwrap().is_empty());
    }

    impl MeshBuilder {
        fn finish_vertex_with(&mut self, values: &[f32]) -> Index {
            self.append(values);
            self.finish_vertex().unwrap()
        }
    }
}
