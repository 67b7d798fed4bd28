//! # Face Module
//!
//! This module defines the six axis-aligned faces of a voxel block, their
//! outward normals, and the small neighbor queries built on top of them.
//! The world is Z-up: `TOP`/`BOTTOM` face along Z, `BACK`/`FRONT` along Y.

use std::ops::{Index, IndexMut};

use cgmath::Vector3;
use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

/// Represents the six possible faces of a voxel block.
///
/// Each variant is assigned a stable integer value so the face can index
/// per-face tables directly. The order is: [RIGHT, LEFT, BACK, FRONT, TOP, BOTTOM]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    /// The right face (facing positive X)
    RIGHT = 0,

    /// The left face (facing negative X)
    LEFT = 1,

    /// The back face (facing positive Y)
    BACK = 2,

    /// The front face (facing negative Y)
    FRONT = 3,

    /// The top face (facing positive Z)
    TOP = 4,

    /// The bottom face (facing negative Z)
    BOTTOM = 5,
}

/// Outward unit normals, indexed by `Face as usize`.
const FACE_NORMALS: [[i32; 3]; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

impl Face {
    /// All six faces in a consistent order.
    pub const ALL: [Face; 6] = [
        Face::RIGHT,
        Face::LEFT,
        Face::BACK,
        Face::FRONT,
        Face::TOP,
        Face::BOTTOM,
    ];

    /// Converts a table index back into a face.
    ///
    /// # Returns
    /// `None` if `index` is not in `0..6`.
    pub fn from_index(index: usize) -> Option<Face> {
        num_traits::FromPrimitive::from_usize(index)
    }

    /// Returns the outward unit normal of this face as an integer vector.
    pub fn normal(self) -> Vector3<i32> {
        let [x, y, z] = FACE_NORMALS[self as usize];
        Vector3::new(x, y, z)
    }

    /// Returns the outward unit normal of this face as a float vector.
    pub fn normal_f32(self) -> Vector3<f32> {
        let [x, y, z] = FACE_NORMALS[self as usize];
        Vector3::new(x as f32, y as f32, z as f32)
    }

    /// Returns the face pointing the opposite way.
    pub fn opposite(self) -> Face {
        match self {
            Face::RIGHT => Face::LEFT,
            Face::LEFT => Face::RIGHT,
            Face::BACK => Face::FRONT,
            Face::FRONT => Face::BACK,
            Face::TOP => Face::BOTTOM,
            Face::BOTTOM => Face::TOP,
        }
    }

    /// Finds the face of the unit cell `a` that touches the unit cell `b`.
    ///
    /// # Returns
    /// `Some(face)` when `b` is exactly one step from `a` along a single axis,
    /// `None` otherwise (same cell, diagonal, or further away).
    pub fn shared(a: Vector3<i32>, b: Vector3<i32>) -> Option<Face> {
        let d = b - a;
        Face::ALL.into_iter().find(|face| face.normal() == d)
    }
}

/// Returns the position one step from `pos` through `face`.
pub fn adjacent_pos(pos: Vector3<i32>, face: Face) -> Vector3<i32> {
    pos + face.normal()
}

/// A fixed table holding one value per face.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceMap<T> {
    data: [T; 6],
}

impl<T: Clone> FaceMap<T> {
    /// Creates a map with every face set to `value`.
    pub fn splat(value: T) -> Self {
        FaceMap {
            data: std::array::from_fn(|_| value.clone()),
        }
    }

    /// Overwrites every entry with `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> FaceMap<T> {
    /// Builds a map by evaluating `f` once per face.
    pub fn from_fn(mut f: impl FnMut(Face) -> T) -> Self {
        FaceMap {
            data: std::array::from_fn(|i| f(Face::ALL[i])),
        }
    }

    /// Iterates over `(face, value)` pairs in `Face::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Face, &T)> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, value)| Face::from_index(i).map(|face| (face, value)))
    }
}

impl<T> Index<Face> for FaceMap<T> {
    type Output = T;

    fn index(&self, face: Face) -> &T {
        &self.data[face as usize]
    }
}

impl<T> IndexMut<Face> for FaceMap<T> {
    fn index_mut(&mut self, face: Face) -> &mut T {
        &mut self.data[face as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFSETS: [[i32; 3]; 3] = [[0, 0, 0], [1, 2, 3], [-8, 4, 7]];

    #[test]
    fn shared_face_rejects_non_neighbors() {
        let origin = Vector3::new(0, 0, 0);
        assert_eq!(Face::shared(origin, Vector3::new(2, 0, 0)), None);
        assert_eq!(Face::shared(origin, Vector3::new(1, 1, 0)), None);
        assert_eq!(Face::shared(Vector3::new(1, 0, 0), Vector3::new(1, 1, 1)), None);
        assert_eq!(Face::shared(origin, origin), None);
    }

    #[test]
    fn shared_face_matches_normals() {
        for face in Face::ALL {
            for [x, y, z] in OFFSETS {
                let offset = Vector3::new(x, y, z);
                assert_eq!(Face::shared(offset, offset + face.normal()), Some(face));
                assert_eq!(adjacent_pos(offset, face), offset + face.normal());
            }
        }
    }

    #[test]
    fn opposite_negates_normal() {
        for face in Face::ALL {
            assert_eq!(face.opposite().normal(), -face.normal());
            assert_eq!(face.opposite().opposite(), face);
        }
    }

    #[test]
    fn face_map_indexing() {
        let mut map = FaceMap::splat(0);
        map[Face::LEFT] = 1;
        map[Face::RIGHT] = 2;
        assert_eq!(map[Face::LEFT], 1);
        assert_eq!(map[Face::RIGHT], 2);
        assert_eq!(map[Face::BOTTOM], 0);
        assert_eq!(map[Face::BACK], 0);

        map.fill(7);
        assert!(map.iter().all(|(_, v)| *v == 7));
        assert_eq!(map.iter().count(), 6);
    }
}
