//! Flat row-major grids, one cell per map tile.
//!
//! Two logical grids recur through the crate: a 0/1 walkability mask
//! (`Grid<u8>`) and a weighted cost grid (`Grid<f32>` where
//! `f32::INFINITY` marks an impassable cell).

use crate::location::*;
use serde::{Deserialize, Serialize};

/// A dynamically sized 2D array addressed as `(x, y)`.
#[derive(Clone, PartialEq, Debug)]
pub struct Grid<T: Copy> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy> Grid<T> {
    pub fn new(width: usize, height: usize, initial: T) -> Self {
        Grid {
            width,
            height,
            data: vec![initial; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn same_dimensions<U: Copy>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[y * self.width + x]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        &mut self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) = value;
    }

    #[inline]
    pub fn get_location(&self, loc: Location) -> &T {
        self.get(loc.x() as usize, loc.y() as usize)
    }

    #[inline]
    pub fn set_location(&mut self, loc: Location, value: T) {
        self.set(loc.x() as usize, loc.y() as usize, value);
    }

    /// Signed-coordinate bounds check, used at every query boundary so that
    /// out-of-bounds points surface as misses rather than panics.
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn contains_location(&self, loc: Location) -> bool {
        (loc.x() as usize) < self.width && (loc.y() as usize) < self.height
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        self.data.iter().enumerate().map(|(i, v)| {
            let x = i % self.width;
            let y = i / self.width;
            ((x, y), v)
        })
    }

    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// Copies `other` over `self`. Both grids must share dimensions; this is
    /// the reset path for per-tick grid reuse (clean base grid -> live grid).
    pub fn copy_from(&mut self, other: &Grid<T>) {
        debug_assert!(self.same_dimensions(other));
        self.data.copy_from_slice(&other.data);
    }

    /// Builds a grid from `points`, setting each in-bounds point to `value`
    /// over a `background` fill. Out-of-bounds points are ignored without
    /// warning, matching the tolerant point-ingestion the rest of the crate
    /// relies on.
    pub fn from_points(
        width: usize,
        height: usize,
        points: &[Location],
        value: T,
        background: T,
    ) -> Self {
        let mut grid = Grid::new(width, height, background);
        for p in points {
            if grid.contains_location(*p) {
                grid.set_location(*p, value);
            }
        }
        grid
    }
}

impl Grid<u8> {
    /// All locations with a non-zero cell, in row-major order.
    pub fn nonzero_points(&self) -> Vec<Location> {
        self.iter()
            .filter(|(_, v)| **v != 0)
            .map(|((x, y), _)| Location::from_coords(x as u32, y as u32))
            .collect()
    }

    /// Count of non-zero cells.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|v| **v != 0).count()
    }

    /// Elementwise max of two masks. Used to combine the pathing and
    /// placement masks into the walkability grid the pathfinder sees.
    pub fn max_with(&self, other: &Grid<u8>) -> Grid<u8> {
        debug_assert!(self.same_dimensions(other));
        let mut out = self.clone();
        for (v, o) in out.data.iter_mut().zip(other.data.iter()) {
            *v = (*v).max(*o);
        }
        out
    }
}

impl<T: Copy + Serialize> Serialize for Grid<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        (self.width, self.height, &self.data).serialize(serializer)
    }
}

impl<'de, T: Copy + Deserialize<'de>> Deserialize<'de> for Grid<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (width, height, data): (usize, usize, Vec<T>) = Deserialize::deserialize(deserializer)?;
        if data.len() != width * height {
            return Err(serde::de::Error::custom("grid data does not match dimensions"));
        }
        Ok(Grid {
            width,
            height,
            data,
        })
    }
}
