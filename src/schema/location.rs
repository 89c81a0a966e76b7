use serde::{Deserialize, Serialize};

/// Newtype wrapper for map indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId(pub u32);

/// An integer grid cell on a map. `y` is height and is not part of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// A continuous world-space position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPos {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The grid cell containing this position.
    pub fn cell(&self) -> Cell {
        Cell::new(self.x.floor() as i32, self.z.floor() as i32)
    }
}

const MAP_STRIDE: i64 = 1_000_000;
const X_STRIDE: i64 = 1_000;

/// Spatial hash of (map, cell) that selects a stagger queue.
///
/// Distinct cells only collide on maps wider than 1000 cells, and a
/// collision merely makes two cells share one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey(pub i64);

impl BucketKey {
    pub fn new(map: MapId, cell: Cell) -> Self {
        let key = (map.0 as i64)
            .wrapping_mul(MAP_STRIDE)
            .wrapping_add((cell.x as i64).wrapping_mul(X_STRIDE))
            .wrapping_add(cell.z as i64);
        Self(key)
    }
}
