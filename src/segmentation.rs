//! Connected-component segmentation of the walkability mask.
//!
//! The segmenter fills enclosed holes, knocks out resource-blocker tiles so
//! that resource lines split otherwise-contiguous space, then labels the
//! mask with 8-connectivity flood fill. Label 0 is the unwalkable
//! background and never becomes an area.

use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use log::*;
use std::collections::VecDeque;

/// Neighbor connectivity for component labeling.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Connectivity {
    /// Cardinal neighbors only.
    Four,
    /// Cardinal plus diagonal neighbors.
    Eight,
}

impl Connectivity {
    fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            Connectivity::Four => &NEIGHBORS_4,
            Connectivity::Eight => &NEIGHBORS_8,
        }
    }
}

/// Output of a labeling pass: per-cell labels and the distinct non-zero
/// labels found.
pub struct LabeledGrid {
    pub labels: Grid<u16>,
    pub distinct: Vec<u16>,
}

impl LabeledGrid {
    /// All points carrying `label`.
    pub fn points_of(&self, label: u16) -> Vec<Location> {
        self.labels
            .iter()
            .filter(|(_, v)| **v == label)
            .map(|((x, y), _)| Location::from_coords(x as u32, y as u32))
            .collect()
    }

    /// 0/1 mask of the cells carrying `label`.
    pub fn mask_of(&self, label: u16) -> Grid<u8> {
        let mut mask = Grid::new(self.labels.width(), self.labels.height(), 0u8);
        for ((x, y), v) in self.labels.iter() {
            if *v == label {
                mask.set(x, y, 1);
            }
        }
        mask
    }
}

/// Fills enclosed zero-holes in a 0/1 mask: any zero cell not reachable from
/// the grid border through zero cells becomes 1.
pub fn fill_holes(mask: &Grid<u8>) -> Grid<u8> {
    let width = mask.width();
    let height = mask.height();
    if width == 0 || height == 0 {
        return mask.clone();
    }
    let mut outside = Grid::new(width, height, 0u8);
    let mut queue = VecDeque::new();

    // Seed the background fill from every zero border cell.
    for x in 0..width {
        for &y in &[0, height - 1] {
            if *mask.get(x, y) == 0 && *outside.get(x, y) == 0 {
                outside.set(x, y, 1);
                queue.push_back((x, y));
            }
        }
    }
    for y in 0..height {
        for &x in &[0, width - 1] {
            if *mask.get(x, y) == 0 && *outside.get(x, y) == 0 {
                outside.set(x, y, 1);
                queue.push_back((x, y));
            }
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        for &(dx, dy) in &NEIGHBORS_4 {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if mask.in_bounds(nx, ny) {
                let (ux, uy) = (nx as usize, ny as usize);
                if *mask.get(ux, uy) == 0 && *outside.get(ux, uy) == 0 {
                    outside.set(ux, uy, 1);
                    queue.push_back((ux, uy));
                }
            }
        }
    }

    let mut filled = mask.clone();
    for y in 0..height {
        for x in 0..width {
            if *mask.get(x, y) == 0 && *outside.get(x, y) == 0 {
                filled.set(x, y, 1);
            }
        }
    }
    filled
}

/// Labels connected components of non-zero cells via BFS flood fill.
/// Labels start at 1; 0 is background.
pub fn label_components(mask: &Grid<u8>, connectivity: Connectivity) -> LabeledGrid {
    let width = mask.width();
    let height = mask.height();
    let mut labels = Grid::new(width, height, 0u16);
    let mut next_label = 1u16;
    let mut queue = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            if *mask.get(x, y) == 0 || *labels.get(x, y) != 0 {
                continue;
            }
            labels.set(x, y, next_label);
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                for &(dx, dy) in connectivity.offsets() {
                    let nx = cx as i32 + dx;
                    let ny = cy as i32 + dy;
                    if mask.in_bounds(nx, ny) {
                        let (ux, uy) = (nx as usize, ny as usize);
                        if *mask.get(ux, uy) != 0 && *labels.get(ux, uy) == 0 {
                            labels.set(ux, uy, next_label);
                            queue.push_back((ux, uy));
                        }
                    }
                }
            }
            next_label += 1;
        }
    }

    let distinct = (1..next_label).collect();
    LabeledGrid { labels, distinct }
}

/// Segments the region mask: fill holes, zero out resource blockers (each
/// blocker cell and its cardinal neighbors), then 8-connectivity label.
pub fn segment(mask: &Grid<u8>, resource_blockers: &[Location]) -> LabeledGrid {
    let mut grid = fill_holes(mask);

    for blocker in resource_blockers {
        if !grid.contains_location(*blocker) {
            warn!("resource blocker {:?} is out of bounds, ignoring", blocker);
            continue;
        }
        grid.set_location(*blocker, 0);
        for &(dx, dy) in &NEIGHBORS_4 {
            let nx = blocker.x() as i32 + dx;
            let ny = blocker.y() as i32 + dy;
            if grid.in_bounds(nx, ny) {
                grid.set(nx as usize, ny as usize, 0);
            }
        }
    }

    let labeled = label_components(&grid, Connectivity::Eight);
    debug!(
        "segmented {} walkable cells into {} components",
        grid.count_nonzero(),
        labeled.distinct.len()
    );
    labeled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(width: usize, height: usize, cells: &[(usize, usize)]) -> Grid<u8> {
        let mut mask = Grid::new(width, height, 0u8);
        for &(x, y) in cells {
            mask.set(x, y, 1);
        }
        mask
    }

    #[test]
    fn fill_holes_closes_enclosed_zero() {
        let mut mask = Grid::new(5, 5, 1u8);
        mask.set(2, 2, 0);
        let filled = fill_holes(&mask);
        assert_eq!(*filled.get(2, 2), 1);
    }

    #[test]
    fn fill_holes_leaves_border_connected_zeros() {
        let mut mask = Grid::new(5, 5, 1u8);
        mask.set(0, 2, 0);
        mask.set(1, 2, 0);
        let filled = fill_holes(&mask);
        assert_eq!(*filled.get(0, 2), 0);
        assert_eq!(*filled.get(1, 2), 0);
    }

    #[test]
    fn fill_holes_tolerates_zero_dimensions() {
        let empty = Grid::new(0, 5, 0u8);
        assert_eq!(fill_holes(&empty).count_nonzero(), 0);
        let flat = Grid::new(5, 0, 0u8);
        assert_eq!(fill_holes(&flat).count_nonzero(), 0);
    }

    #[test]
    fn diagonal_cells_join_under_eight_connectivity() {
        let mask = block(4, 4, &[(0, 0), (1, 1)]);
        assert_eq!(label_components(&mask, Connectivity::Eight).distinct.len(), 1);
        assert_eq!(label_components(&mask, Connectivity::Four).distinct.len(), 2);
    }

    #[test]
    fn resource_blockers_split_components() {
        // A 7x3 walkable band; a blocker in the middle column severs it.
        let mut mask = Grid::new(7, 3, 1u8);
        for y in 0..3 {
            for x in 0..7 {
                mask.set(x, y, 1);
            }
        }
        let blockers: Vec<Location> = (0..3).map(|y| Location::from_coords(3, y)).collect();
        let labeled = segment(&mask, &blockers);
        assert_eq!(labeled.distinct.len(), 2);
    }

    #[test]
    fn background_is_label_zero() {
        let mask = block(4, 4, &[(1, 1)]);
        let labeled = label_components(&mask, Connectivity::Eight);
        assert_eq!(*labeled.labels.get(0, 0), 0);
        assert!(!labeled.distinct.contains(&0));
    }
}
