//! Weighted cost grids for the pathfinder.
//!
//! Grids are `Grid<f32>` where `f32::INFINITY` marks an impassable cell and
//! every finite cell is expected to stay >= 1 (the pathfinder's heuristic
//! relies on it). Base grids are cheap to derive from the walkability
//! masks; per-tick influence is stamped on top with [`add_cost`].

use crate::grid::*;
use crate::location::*;
use crate::polygon::disk_cells;
use log::*;

/// Weight given to ground-unwalkable cells in the air-vs-ground grid. Kept
/// deliberately low so airborne pathing is drawn over terrain obstacles
/// instead of exposed open ground.
pub const AIR_VS_GROUND_LOW: f32 = 1.0;

/// Ground grid: unwalkable cells are infinite, walkable cells carry the
/// default weight.
pub fn ground_grid(walkability: &Grid<u8>, blockers: &[Location], default_weight: f32) -> Grid<f32> {
    let mut grid = Grid::new(walkability.width(), walkability.height(), 0f32);
    for ((x, y), v) in walkability.iter() {
        grid.set(x, y, if *v == 0 { f32::INFINITY } else { default_weight });
    }
    apply_blockers(&mut grid, blockers);
    grid
}

/// Climber grid: like the ground grid but built from the wider climber
/// walkability mask, then corrected so unit-blocking obstacles are
/// re-applied uniformly (a climber cannot cross a blocking resource line
/// any more than a ground unit can).
pub fn climber_grid(
    climber_mask: &Grid<u8>,
    blockers: &[Location],
    default_weight: f32,
) -> Grid<f32> {
    // Same inversion, different mask.
    ground_grid(climber_mask, blockers, default_weight)
}

/// Clean air grid: flight ignores terrain, every cell is traversable at the
/// default weight.
pub fn clean_air_grid(width: usize, height: usize, default_weight: f32) -> Grid<f32> {
    Grid::new(width, height, default_weight)
}

/// Air-vs-ground grid: the clean air grid, except ground-unwalkable cells
/// get a reduced (finite) weight. This is a deliberate inversion of the
/// ground semantics, not a bug: it biases air paths over cliffs and water.
pub fn air_vs_ground_grid(walkability: &Grid<u8>, default_weight: f32) -> Grid<f32> {
    let mut grid = Grid::new(walkability.width(), walkability.height(), 0f32);
    for ((x, y), v) in walkability.iter() {
        grid.set(x, y, if *v == 0 { AIR_VS_GROUND_LOW } else { default_weight });
    }
    grid
}

fn apply_blockers(grid: &mut Grid<f32>, blockers: &[Location]) {
    for b in blockers {
        if grid.contains_location(*b) {
            grid.set_location(*b, f32::INFINITY);
        }
    }
}

/// Stamps a Euclidean-disk weight delta onto `grid`.
///
/// Cells outside the disk are untouched. Inside the disk, cells currently at
/// the baseline weight 1 are first raised to `initial_default_weight` (when
/// non-zero) so that overlaying a structure footprint does not double-count,
/// then `weight` is added. With `safe` the result is clamped to a minimum of
/// 1; without it the caller guarantees no finite cell drops below 1.
///
/// A radius too small to cover any cell center degrades to stamping the
/// single cell containing `position`.
pub fn add_cost(
    grid: &mut Grid<f32>,
    position: (f32, f32),
    radius: f32,
    weight: f32,
    safe: bool,
    initial_default_weight: f32,
) {
    let disk = disk_for(grid, position, radius);
    stamp_disk(grid, &disk, weight, safe, initial_default_weight);
}

/// Batched [`add_cost`]: the disk is computed once and applied to every
/// grid. Purely a performance variant; the grids must share dimensions.
pub fn add_cost_to_multiple_grids(
    grids: &mut [&mut Grid<f32>],
    position: (f32, f32),
    radius: f32,
    weight: f32,
    safe: bool,
    initial_default_weight: f32,
) {
    let disk = match grids.first() {
        Some(first) => disk_for(first, position, radius),
        None => return,
    };
    for grid in grids.iter_mut() {
        stamp_disk(grid, &disk, weight, safe, initial_default_weight);
    }
}

fn disk_for(grid: &Grid<f32>, position: (f32, f32), radius: f32) -> Vec<(usize, usize)> {
    let disk = disk_cells(position, radius, grid.width(), grid.height());
    if !disk.is_empty() {
        return disk;
    }
    let x = position.0 as i32;
    let y = position.1 as i32;
    if grid.in_bounds(x, y) {
        vec![(x as usize, y as usize)]
    } else {
        Vec::new()
    }
}

fn stamp_disk(
    grid: &mut Grid<f32>,
    disk: &[(usize, usize)],
    weight: f32,
    safe: bool,
    initial_default_weight: f32,
) {
    let mut clamped = false;
    for &(x, y) in disk {
        let cell = grid.get_mut(x, y);
        if initial_default_weight != 0.0 && *cell == 1.0 {
            *cell = initial_default_weight;
        }
        *cell += weight;
        if safe && cell.is_finite() && *cell < 1.0 {
            *cell = 1.0;
            clamped = true;
        }
    }
    if clamped {
        warn!("add_cost clamped weights below 1 back to 1");
    }
}

/// Per-tick grid reuse with an explicit generation counter.
///
/// The cache owns one pristine copy of every base grid, built once at
/// compile time, plus a live copy handed out to callers. When the tick
/// generation advances, the live copy is reset from the pristine one before
/// new influence is stamped; nothing is invalidated implicitly.
pub struct GridCache {
    generation: u64,
    pristine: Grid<f32>,
    live: Grid<f32>,
}

impl GridCache {
    pub fn new(pristine: Grid<f32>) -> GridCache {
        let live = pristine.clone();
        GridCache {
            generation: 0,
            pristine,
            live,
        }
    }

    /// The live grid for `tick`. Resets from the pristine base when the
    /// tick has advanced since the last call.
    pub fn grid_for_tick(&mut self, tick: u64) -> &mut Grid<f32> {
        if tick != self.generation {
            self.live.copy_from(&self.pristine);
            self.generation = tick;
        }
        &mut self.live
    }

    /// A fresh owned copy of the clean base grid.
    pub fn fresh(&self) -> Grid<f32> {
        self.pristine.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
