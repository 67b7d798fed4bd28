//! # Chunk Index Module
//!
//! This module provides `ChunkIndex`, a block position inside one chunk, and
//! `ChunkRange`, the iterator that walks every valid position in scan order.
//!
//! ## Scan Order
//!
//! Positions are flattened row-major with Z varying fastest:
//! `offset = z + Z_SIZE * (y + Y_SIZE * x)`. Advancing a position in scan order
//! therefore advances its offset by exactly one, and the position after the last
//! cell is `(X_SIZE, 0, 0)`, whose offset is the chunk volume.

use std::fmt;

use cgmath::{Point3, Vector3};

use super::{CHUNK_SIZE, CHUNK_X_SIZE, CHUNK_Y_SIZE, CHUNK_Z_SIZE};
use crate::engine_state::voxels::block::face::Face;

/// A block position relative to the origin of its chunk.
///
/// A `ChunkIndex` may name a cell outside the chunk, for example the result of
/// `adjacent` at a boundary. Use `is_valid` (or `checked_offset`) before indexing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkIndex {
    x: i32,
    y: i32,
    z: i32,
}

impl ChunkIndex {
    /// The first position in scan order.
    pub const FIRST: ChunkIndex = ChunkIndex { x: 0, y: 0, z: 0 };

    /// The "one past last" sentinel reached after advancing past the final cell.
    pub const END: ChunkIndex = ChunkIndex {
        x: CHUNK_X_SIZE,
        y: 0,
        z: 0,
    };

    /// Creates a position from its components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        ChunkIndex { x, y, z }
    }

    /// Converts a flat offset back into a position.
    ///
    /// # Returns
    /// `None` if `offset` is not below the chunk volume.
    pub fn from_offset(offset: usize) -> Option<Self> {
        if offset >= CHUNK_SIZE {
            return None;
        }
        let offset = offset as i32;
        let z = offset % CHUNK_Z_SIZE;
        let y = (offset / CHUNK_Z_SIZE) % CHUNK_Y_SIZE;
        let x = offset / (CHUNK_Z_SIZE * CHUNK_Y_SIZE);
        Some(ChunkIndex { x, y, z })
    }

    /// The X component.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// The Y component.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// The Z component.
    pub fn z(&self) -> i32 {
        self.z
    }

    /// The position as an integer vector.
    pub fn to_vec(&self) -> Vector3<i32> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// The lower corner of the cell in chunk-local float coordinates.
    pub fn to_point(&self) -> Point3<f32> {
        Point3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// Returns `true` if the position lies inside the chunk.
    pub fn is_valid(&self) -> bool {
        (0..CHUNK_X_SIZE).contains(&self.x)
            && (0..CHUNK_Y_SIZE).contains(&self.y)
            && (0..CHUNK_Z_SIZE).contains(&self.z)
    }

    /// The flat offset of this position.
    ///
    /// Only meaningful for valid positions (and for `END`, which maps to the
    /// chunk volume). Use `checked_offset` when validity is not known.
    pub fn offset(&self) -> usize {
        debug_assert!(self.is_valid() || *self == Self::END);
        (self.z + CHUNK_Z_SIZE * (self.y + CHUNK_Y_SIZE * self.x)) as usize
    }

    /// The flat offset, or `None` if the position is outside the chunk.
    pub fn checked_offset(&self) -> Option<usize> {
        self.is_valid().then(|| self.offset())
    }

    /// The next position in scan order; the last cell advances to `END`.
    pub fn advance(&self) -> ChunkIndex {
        if self.z + 1 < CHUNK_Z_SIZE {
            ChunkIndex::new(self.x, self.y, self.z + 1)
        } else if self.y + 1 < CHUNK_Y_SIZE {
            ChunkIndex::new(self.x, self.y + 1, 0)
        } else {
            ChunkIndex::new(self.x + 1, 0, 0)
        }
    }

    /// The neighboring position through `face`. May be outside the chunk.
    pub fn adjacent(&self, face: Face) -> ChunkIndex {
        let n = face.normal();
        ChunkIndex::new(self.x + n.x, self.y + n.y, self.z + n.z)
    }

    /// The neighboring position through `face`, if it lies inside the chunk.
    pub fn valid_adjacent(&self, face: Face) -> Option<ChunkIndex> {
        Some(self.adjacent(face)).filter(ChunkIndex::is_valid)
    }

    /// The face of this cell that touches `other`, if the two are axis neighbors.
    pub fn shared_face(&self, other: &ChunkIndex) -> Option<Face> {
        Face::shared(self.to_vec(), other.to_vec())
    }

    /// An iterator over every valid position in scan order.
    pub fn range() -> ChunkRange {
        ChunkRange::new()
    }
}

impl From<Vector3<i32>> for ChunkIndex {
    fn from(v: Vector3<i32>) -> Self {
        ChunkIndex::new(v.x, v.y, v.z)
    }
}

impl fmt::Display for ChunkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Iterator over all valid chunk positions in scan order.
///
/// Each call to `ChunkIndex::range()` starts a fresh, finite walk that yields
/// every position exactly once.
#[derive(Clone, Debug)]
pub struct ChunkRange {
    current: ChunkIndex,
}

impl ChunkRange {
    fn new() -> Self {
        ChunkRange {
            current: ChunkIndex::FIRST,
        }
    }
}

impl Iterator for ChunkRange {
    type Item = ChunkIndex;

    fn next(&mut self) -> Option<ChunkIndex> {
        if self.current == ChunkIndex::END {
            return None;
        }
        let pos = self.current;
        self.current = pos.advance();
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = CHUNK_SIZE - self.current.offset();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkRange {}

impl std::iter::FusedIterator for ChunkRange {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_visits_every_offset_once() {
        let mut pos = ChunkIndex::FIRST;
        for expected in 0..CHUNK_SIZE {
            assert!(pos.is_valid());
            assert_eq!(pos.offset(), expected);
            assert_eq!(ChunkIndex::from_offset(expected), Some(pos));
            pos = pos.advance();
        }
        assert_eq!(pos, ChunkIndex::END);
        assert!(!pos.is_valid());
        assert_eq!(pos.offset(), CHUNK_SIZE);
    }

    #[test]
    fn range_is_finite_and_restartable() {
        let range = ChunkIndex::range();
        assert_eq!(range.len(), CHUNK_SIZE);
        assert_eq!(ChunkIndex::range().count(), CHUNK_SIZE);
        assert_eq!(ChunkIndex::range().count(), CHUNK_SIZE);

        let offsets: Vec<usize> = ChunkIndex::range().map(|p| p.offset()).collect();
        assert!(offsets.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn adjacent_round_trips_through_shared_face() {
        for pos in ChunkIndex::range() {
            for face in Face::ALL {
                let adj = pos.adjacent(face);
                assert_eq!(pos.shared_face(&adj), Some(face));
                assert_eq!(adj.shared_face(&pos), Some(face.opposite()));
            }
        }
    }

    #[test]
    fn adjacent_can_leave_the_chunk() {
        let corner = ChunkIndex::new(0, 0, 0);
        assert!(!corner.adjacent(Face::LEFT).is_valid());
        assert_eq!(corner.valid_adjacent(Face::BOTTOM), None);
        assert_eq!(corner.valid_adjacent(Face::TOP), Some(ChunkIndex::new(0, 0, 1)));
        assert_eq!(corner.adjacent(Face::LEFT).checked_offset(), None);
    }

    #[test]
    fn display_matches_bracket_format() {
        assert_eq!(ChunkIndex::new(1, -2, 3).to_string(), "[1, -2, 3]");
    }
}
