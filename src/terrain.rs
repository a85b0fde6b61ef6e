//! Raw terrain ingested from the game snapshot: per-tile flags and height.

use crate::grid::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TileFlags: u8 {
        const NONE = 0;
        /// Ground units can traverse the tile.
        const PATHABLE = 1;
        /// Structures can be placed on the tile.
        const PLACEABLE = 2;
        /// Cliff-capable units can traverse the tile even when it is not
        /// ground-pathable.
        const CLIMBABLE = 4;
    }
}

/// Per-tile terrain state for a whole map, aligned to one coordinate system.
#[derive(Clone, Serialize, Deserialize)]
pub struct TerrainData {
    flags: Grid<u8>,
    height: Grid<u8>,
}

impl TerrainData {
    /// `flags` and `height` must share dimensions; the constructor is the one
    /// place that is enforced so everything downstream can assume it.
    pub fn new(flags: Grid<u8>, height: Grid<u8>) -> Option<TerrainData> {
        if !flags.same_dimensions(&height) {
            return None;
        }
        Some(TerrainData { flags, height })
    }

    /// Convenience constructor for a uniform map, mostly used by tests:
    /// every tile pathable, placeable, and at height 0.
    pub fn open(width: usize, height: usize) -> TerrainData {
        let flags = Grid::new(
            width,
            height,
            (TileFlags::PATHABLE | TileFlags::PLACEABLE).bits(),
        );
        TerrainData {
            flags,
            height: Grid::new(width, height, 0),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.flags.width()
    }

    #[inline]
    pub fn height_tiles(&self) -> usize {
        self.flags.height()
    }

    pub fn get(&self, x: usize, y: usize) -> TileFlags {
        TileFlags::from_bits_truncate(*self.flags.get(x, y))
    }

    pub fn set(&mut self, x: usize, y: usize, flags: TileFlags) {
        self.flags.set(x, y, flags.bits());
    }

    pub fn is_pathable(&self, x: usize, y: usize) -> bool {
        self.get(x, y).contains(TileFlags::PATHABLE)
    }

    pub fn is_placeable(&self, x: usize, y: usize) -> bool {
        self.get(x, y).contains(TileFlags::PLACEABLE)
    }

    pub fn terrain_height(&self, x: usize, y: usize) -> u8 {
        *self.height.get(x, y)
    }

    pub fn height_grid(&self) -> &Grid<u8> {
        &self.height
    }

    fn mask_of(&self, flag: TileFlags) -> Grid<u8> {
        let mut mask = Grid::new(self.width(), self.height_tiles(), 0u8);
        for ((x, y), bits) in self.flags.iter() {
            if TileFlags::from_bits_truncate(*bits).contains(flag) {
                mask.set(x, y, 1);
            }
        }
        mask
    }

    /// 0/1 mask of ground-pathable tiles.
    pub fn pathing_mask(&self) -> Grid<u8> {
        self.mask_of(TileFlags::PATHABLE)
    }

    /// 0/1 mask of placeable tiles. Region segmentation runs on this mask;
    /// it excludes ramps, which is exactly what splits regions apart.
    pub fn placement_mask(&self) -> Grid<u8> {
        self.mask_of(TileFlags::PLACEABLE)
    }

    /// Elementwise max of the pathing and placement masks: the walkability
    /// grid the cost-grid factory inverts.
    pub fn walkability_mask(&self) -> Grid<u8> {
        self.pathing_mask().max_with(&self.placement_mask())
    }

    /// Walkability for cliff-capable units: everything ground-walkable plus
    /// CLIMBABLE tiles.
    pub fn climber_mask(&self) -> Grid<u8> {
        self.walkability_mask().max_with(&self.mask_of(TileFlags::CLIMBABLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_reflect_flags() {
        let mut terrain = TerrainData::open(4, 4);
        terrain.set(1, 1, TileFlags::NONE);
        terrain.set(2, 2, TileFlags::CLIMBABLE);

        let walk = terrain.walkability_mask();
        assert_eq!(*walk.get(0, 0), 1);
        assert_eq!(*walk.get(1, 1), 0);
        assert_eq!(*walk.get(2, 2), 0);

        let climber = terrain.climber_mask();
        assert_eq!(*climber.get(2, 2), 1);
        assert_eq!(*climber.get(1, 1), 0);
    }

    #[test]
    fn serde_round_trip() {
        let mut terrain = TerrainData::open(3, 3);
        terrain.set(1, 1, TileFlags::CLIMBABLE);
        let encoded = serde_json::to_string(&terrain).unwrap();
        let decoded: TerrainData = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.get(1, 1), TileFlags::CLIMBABLE);
        assert_eq!(decoded.get(0, 0), TileFlags::PATHABLE | TileFlags::PLACEABLE);
    }

    #[test]
    fn mismatched_dimensions_rejected() {
        let flags = Grid::new(4, 4, 0u8);
        let height = Grid::new(4, 5, 0u8);
        assert!(TerrainData::new(flags, height).is_none());
    }
}
