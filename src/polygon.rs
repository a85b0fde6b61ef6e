//! Shared geometry payload for every classified area.
//!
//! An `AreaGeometry` is built once from a full-size 0/1 footprint mask and
//! caches everything that is queried frequently afterwards: the inner and
//! outer perimeters, the extended mask used for inclusive membership tests,
//! corner points, and the integer center. Area topology never changes after
//! compilation, so nothing here is ever invalidated.

use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use itertools::Itertools;
use log::*;
use serde::{Deserialize, Serialize};

/// Cells inside an axis-aligned bounding box whose centers lie within
/// `radius` of `center` (a Euclidean disk). Shared by cost stamping and
/// buildable-point subtraction.
pub fn disk_cells(
    center: (f32, f32),
    radius: f32,
    width: usize,
    height: usize,
) -> Vec<(usize, usize)> {
    let mut cells = Vec::new();
    let min_x = ((center.0 - radius).floor().max(0.0)) as usize;
    let min_y = ((center.1 - radius).floor().max(0.0)) as usize;
    let max_x = ((center.0 + radius).ceil() as usize).min(width.saturating_sub(1));
    let max_y = ((center.1 + radius).ceil() as usize).min(height.saturating_sub(1));
    let r2 = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 - center.0;
            let dy = y as f32 - center.1;
            if dx * dx + dy * dy <= r2 {
                cells.push((x, y));
            }
        }
    }
    cells
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Boundary {
    Inner,
    Outer,
}

/// First-difference boundary extraction. A cell is on the boundary wherever
/// the mask value changes along either axis; the inner variant keeps the
/// last cell inside the area, the outer variant the first cell outside it.
fn first_difference_boundary(mask: &Grid<u8>, boundary: Boundary) -> Vec<Location> {
    let width = mask.width();
    let height = mask.height();
    let mut boundary_grid = Grid::new(width, height, 0u8);

    let mut mark = |x: i32, y: i32| {
        if mask.in_bounds(x, y) {
            boundary_grid.set(x as usize, y as usize, 1);
        }
    };

    for y in 0..height {
        for x in 0..width {
            let value = *mask.get(x, y);
            let prev_x = if x > 0 { *mask.get(x - 1, y) } else { 0 };
            let prev_y = if y > 0 { *mask.get(x, y - 1) } else { 0 };

            // Rising edge: (x-1, y) outside, (x, y) inside.
            if value > prev_x {
                match boundary {
                    Boundary::Inner => mark(x as i32, y as i32),
                    Boundary::Outer => mark(x as i32 - 1, y as i32),
                }
            }
            // Falling edge: (x-1, y) inside, (x, y) outside.
            if value < prev_x {
                match boundary {
                    Boundary::Inner => mark(x as i32 - 1, y as i32),
                    Boundary::Outer => mark(x as i32, y as i32),
                }
            }
            if value > prev_y {
                match boundary {
                    Boundary::Inner => mark(x as i32, y as i32),
                    Boundary::Outer => mark(x as i32, y as i32 - 1),
                }
            }
            if value < prev_y {
                match boundary {
                    Boundary::Inner => mark(x as i32, y as i32 - 1),
                    Boundary::Outer => mark(x as i32, y as i32),
                }
            }
        }
    }

    // The inner boundary belongs to the area; the outer must not intersect it.
    boundary_grid
        .iter()
        .filter(|(_, v)| **v != 0)
        .map(|((x, y), _)| Location::from_coords(x as u32, y as u32))
        .filter(|p| match boundary {
            Boundary::Inner => *mask.get_location(*p) != 0,
            Boundary::Outer => *mask.get_location(*p) == 0,
        })
        .collect()
}

/// Harris-style corner response over a 0/1 mask: Sobel gradients, 3x3
/// smoothed structure tensor, `det - k * trace^2`.
fn corner_response(mask: &Grid<u8>) -> Grid<f32> {
    const K: f32 = 0.05;
    let width = mask.width();
    let height = mask.height();

    let at = |x: i32, y: i32| -> f32 {
        if mask.in_bounds(x, y) {
            *mask.get(x as usize, y as usize) as f32
        } else {
            0.0
        }
    };

    let mut ixx = Grid::new(width, height, 0f32);
    let mut iyy = Grid::new(width, height, 0f32);
    let mut ixy = Grid::new(width, height, 0f32);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
            ixx.set(x as usize, y as usize, gx * gx);
            iyy.set(x as usize, y as usize, gy * gy);
            ixy.set(x as usize, y as usize, gx * gy);
        }
    }

    let window_sum = |g: &Grid<f32>, x: i32, y: i32| -> f32 {
        let mut sum = 0.0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if g.in_bounds(x + dx, y + dy) {
                    sum += *g.get((x + dx) as usize, (y + dy) as usize);
                }
            }
        }
        sum
    };

    let mut response = Grid::new(width, height, 0f32);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let a = window_sum(&ixx, x, y);
            let b = window_sum(&iyy, x, y);
            let c = window_sum(&ixy, x, y);
            let det = a * b - c * c;
            let trace = a + b;
            response.set(x as usize, y as usize, det - K * trace * trace);
        }
    }
    response
}

/// Picks corner peaks from a response grid: cells above `threshold_rel` of
/// the maximum response, strongest first, suppressing anything closer than
/// `min_distance` (Chebyshev) to an already-kept peak.
fn corner_peaks(response: &Grid<f32>, min_distance: usize, threshold_rel: f32) -> Vec<Location> {
    let max_response = response
        .iter()
        .map(|(_, v)| *v)
        .fold(f32::NEG_INFINITY, f32::max);
    if max_response <= 0.0 {
        return Vec::new();
    }
    let threshold = max_response * threshold_rel;

    let candidates: Vec<(Location, f32)> = response
        .iter()
        .filter(|(_, v)| **v > threshold)
        .map(|((x, y), v)| (Location::from_coords(x as u32, y as u32), *v))
        .sorted_by(|(_, a), (_, b)| b.total_cmp(a))
        .collect();

    let mut kept: Vec<Location> = Vec::new();
    for (candidate, _) in candidates {
        if kept
            .iter()
            .all(|k| k.distance_to(candidate) as usize >= min_distance)
        {
            kept.push(candidate);
        }
    }
    kept
}

/// The cached geometry of one classified area.
#[derive(Clone, Serialize, Deserialize)]
pub struct AreaGeometry {
    mask: Grid<u8>,
    extended: Grid<u8>,
    perimeter: Vec<Location>,
    outer_perimeter: Vec<Location>,
    corners: Vec<Location>,
    center: Location,
    area: usize,
}

impl AreaGeometry {
    /// Builds the geometry from a full-size footprint mask. Returns `None`
    /// for an empty mask (an invariant violation on the producer's side;
    /// the caller logs and discards).
    pub fn from_mask(mask: Grid<u8>, corner_distance: usize) -> Option<AreaGeometry> {
        if mask.count_nonzero() == 0 {
            return None;
        }

        let perimeter = first_difference_boundary(&mask, Boundary::Inner);
        let outer_perimeter = first_difference_boundary(&mask, Boundary::Outer);

        let mut extended = mask.clone();
        for p in &outer_perimeter {
            extended.set_location(*p, 1);
        }
        let area = extended.count_nonzero();

        // Centroid of the raw mask, snapped to the closest member point.
        let points: Vec<Location> = extended.nonzero_points();
        let (mut cx, mut cy, mut n) = (0f32, 0f32, 0f32);
        for ((x, y), v) in mask.iter() {
            if *v != 0 {
                cx += x as f32;
                cy += y as f32;
                n += 1.0;
            }
        }
        let centroid = (cx / n, cy / n);
        let center = closest_towards_point(&points, centroid)?;

        let corners = corner_peaks(&corner_response(&mask), corner_distance, CORNER_THRESHOLD_REL)
            .into_iter()
            .filter(|p| *extended.get_location(*p) == 1)
            .collect();

        Some(AreaGeometry {
            mask,
            extended,
            perimeter,
            outer_perimeter,
            corners,
            center,
            area,
        })
    }

    /// Inclusive membership test against the extended mask. O(1); false for
    /// out-of-bounds points rather than panicking.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.extended.in_bounds(x, y) && *self.extended.get(x as usize, y as usize) == 1
    }

    #[inline]
    pub fn contains_location(&self, loc: Location) -> bool {
        self.contains(loc.x() as i32, loc.y() as i32)
    }

    /// Cell count of the extended mask.
    #[inline]
    pub fn area(&self) -> usize {
        self.area
    }

    #[inline]
    pub fn center(&self) -> Location {
        self.center
    }

    pub fn mask(&self) -> &Grid<u8> {
        &self.mask
    }

    pub fn extended_mask(&self) -> &Grid<u8> {
        &self.extended
    }

    /// Inner boundary: the outermost cells still belonging to the area.
    pub fn perimeter_points(&self) -> &[Location] {
        &self.perimeter
    }

    /// The inner boundary shifted one tile outward.
    pub fn outer_perimeter_points(&self) -> &[Location] {
        &self.outer_perimeter
    }

    /// High-curvature boundary points, min-distance filtered.
    pub fn corner_points(&self) -> &[Location] {
        &self.corners
    }

    /// All member points of the extended mask.
    pub fn points(&self) -> Vec<Location> {
        self.extended.nonzero_points()
    }

    /// Extreme member points; `top` is the highest y, matching the map
    /// coordinate convention.
    pub fn top(&self) -> Location {
        self.extreme(|p| (p.y(), p.x()), true)
    }

    pub fn bottom(&self) -> Location {
        self.extreme(|p| (p.y(), p.x()), false)
    }

    pub fn right(&self) -> Location {
        self.extreme(|p| (p.x(), p.y()), true)
    }

    pub fn left(&self) -> Location {
        self.extreme(|p| (p.x(), p.y()), false)
    }

    fn extreme<K: Ord>(&self, key: impl Fn(&Location) -> K, max: bool) -> Location {
        let points = self.points();
        let found = if max {
            points.iter().max_by_key(|p| key(p))
        } else {
            points.iter().min_by_key(|p| key(p))
        };
        // Geometry is never empty past construction.
        *found.unwrap_or(&self.center)
    }

    /// Approximate width: span between the lexicographic extremes of the
    /// outer perimeter. Within 0.5x-1.5x of the true width; good enough for
    /// choke sizing.
    pub fn approx_width(&self) -> f32 {
        match self.outer_perimeter.iter().minmax() {
            itertools::MinMaxResult::MinMax(a, b) => a.euclidean_distance_to(*b),
            itertools::MinMaxResult::OneElement(_) => 1.0,
            itertools::MinMaxResult::NoElements => 0.0,
        }
    }

    /// The two member points farthest from the center, useful as wall-off
    /// anchors at a choke.
    pub fn corner_walloff(&self) -> Vec<Location> {
        self.points()
            .into_iter()
            .sorted_by(|a, b| {
                b.euclidean_distance_squared(self.center)
                    .total_cmp(&a.euclidean_distance_squared(self.center))
            })
            .take(2)
            .collect()
    }

    /// Buildable points, evaluated on demand rather than at construction:
    /// start from the area's own points, subtract the circular footprint of
    /// every grounded occupier, then keep only cells the placement mask
    /// allows.
    pub fn buildable_points(
        &self,
        placement_mask: &Grid<u8>,
        occupiers: &[((f32, f32), f32)],
    ) -> Vec<Location> {
        let width = self.mask.width();
        let height = self.mask.height();
        let mut scratch = Grid::from_points(width, height, &self.points(), 1u8, 0u8);

        for ((x, y), radius) in occupiers {
            // Slightly shrunken footprint so touching-but-not-overlapping
            // occupiers do not erase a whole tile.
            for (cx, cy) in disk_cells((*x, *y), radius * 0.9, width, height) {
                scratch.set(cx, cy, 0);
            }
        }

        scratch
            .iter()
            .filter(|((x, y), v)| **v == 1 && *placement_mask.get(*x, *y) == 1)
            .map(|((x, y), _)| Location::from_coords(x as u32, y as u32))
            .collect()
    }

    /// Re-derives the geometry after a point-set union (choke merging).
    pub fn with_extra_points(&self, extra: &[Location], corner_distance: usize) -> AreaGeometry {
        let mut mask = self.mask.clone();
        for p in extra {
            if mask.contains_location(*p) {
                mask.set_location(*p, 1);
            } else {
                trace!("merge point {:?} out of bounds, skipping", p);
            }
        }
        // The source geometry was valid, so the union cannot be empty.
        AreaGeometry::from_mask(mask, corner_distance)
            .expect("union of a valid geometry cannot be empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask(size: usize, origin: usize, side: usize) -> Grid<u8> {
        let mut mask = Grid::new(size, size, 0u8);
        for y in origin..origin + side {
            for x in origin..origin + side {
                mask.set(x, y, 1);
            }
        }
        mask
    }

    #[test]
    fn extended_mask_is_superset_of_mask() {
        let geometry = AreaGeometry::from_mask(square_mask(12, 3, 5), 3).unwrap();
        for ((x, y), v) in geometry.mask().iter() {
            if *v == 1 {
                assert_eq!(*geometry.extended_mask().get(x, y), 1);
            }
        }
    }

    #[test]
    fn perimeter_of_square() {
        let geometry = AreaGeometry::from_mask(square_mask(12, 3, 5), 3).unwrap();
        // 5x5 square: 16 inner boundary cells, 20 outer cells (no corners
        // in the outer ring under 4-axis first differences).
        assert_eq!(geometry.perimeter_points().len(), 16);
        assert_eq!(geometry.outer_perimeter_points().len(), 20);
        for p in geometry.outer_perimeter_points() {
            assert_eq!(*geometry.mask().get_location(*p), 0);
            assert!(geometry.contains_location(*p));
        }
    }

    #[test]
    fn membership_rejects_out_of_bounds() {
        let geometry = AreaGeometry::from_mask(square_mask(10, 2, 4), 3).unwrap();
        assert!(!geometry.contains(-1, 2));
        assert!(!geometry.contains(2, 100));
        assert!(geometry.contains(3, 3));
    }

    #[test]
    fn center_is_member_point() {
        let geometry = AreaGeometry::from_mask(square_mask(12, 3, 5), 3).unwrap();
        assert!(geometry.contains_location(geometry.center()));
        assert_eq!(geometry.center(), Location::from_coords(5, 5));
    }

    #[test]
    fn area_counts_extended_cells() {
        let geometry = AreaGeometry::from_mask(square_mask(12, 3, 5), 3).unwrap();
        assert_eq!(geometry.area(), 25 + 20);
    }

    #[test]
    fn empty_mask_is_rejected() {
        assert!(AreaGeometry::from_mask(Grid::new(8, 8, 0u8), 3).is_none());
    }

    #[test]
    fn corners_found_on_square() {
        let geometry = AreaGeometry::from_mask(square_mask(24, 4, 10), 3).unwrap();
        // A 10x10 square has four sharp corners; min-distance 3 keeps them
        // all distinct.
        assert!(geometry.corner_points().len() >= 4);
        for c in geometry.corner_points() {
            assert!(geometry.contains_location(*c));
        }
    }

    #[test]
    fn buildable_points_subtract_occupier_footprints() {
        let geometry = AreaGeometry::from_mask(square_mask(12, 3, 5), 3).unwrap();
        let placement = square_mask(12, 3, 5);
        let unobstructed = geometry.buildable_points(&placement, &[]);
        assert_eq!(unobstructed.len(), 25);

        let occupied = geometry.buildable_points(&placement, &[((5.0, 5.0), 1.5)]);
        assert!(occupied.len() < unobstructed.len());
        assert!(!occupied.contains(&Location::from_coords(5, 5)));
    }

    #[test]
    fn disk_cells_stay_within_radius() {
        for (x, y) in disk_cells((6.0, 6.0), 2.5, 16, 16) {
            let dx = x as f32 - 6.0;
            let dy = y as f32 - 6.0;
            assert!(dx * dx + dy * dy <= 2.5 * 2.5 + 1e-3);
        }
    }
}
