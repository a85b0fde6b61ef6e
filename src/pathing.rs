//! A* pathfinding over weighted cost grids.
//!
//! Paths run over `Grid<f32>` cost grids: `f32::INFINITY` cells are
//! impassable, finite cells are entered at their weight (diagonals scaled by
//! sqrt 2). The start cell's own weight is never charged, so a unit standing
//! on a blocked tile can still path off it.

use crate::constants::*;
use crate::grid::*;
use crate::input::*;
use crate::location::*;
use crate::polygon::disk_cells;
use log::*;
use ordered_float::OrderedFloat;
use pathfinding::directed::astar::astar;

const SQRT_2: f32 = std::f32::consts::SQRT_2;

/// Knobs for a single path query.
#[derive(Copy, Clone, Debug)]
pub struct PathOptions {
    /// Require 2x2 clearance (the path is valid for a two-tile-wide unit).
    pub large: bool,
    /// Drop the full path to every n-th point; the goal is always kept.
    pub sensitivity: usize,
    /// Straighten the path with line-of-sight shortcuts after the search.
    pub smoothing: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        PathOptions {
            large: false,
            sensitivity: 1,
            smoothing: false,
        }
    }
}

fn cell_passable(grid: &Grid<f32>, x: i32, y: i32) -> bool {
    grid.in_bounds(x, y) && grid.get(x as usize, y as usize).is_finite()
}

/// Passability for a unit anchored at `(x, y)`. Large units occupy the 2x2
/// block extending right and down from the anchor.
fn passable(grid: &Grid<f32>, x: i32, y: i32, large: bool) -> bool {
    if !cell_passable(grid, x, y) {
        return false;
    }
    if large {
        cell_passable(grid, x + 1, y)
            && cell_passable(grid, x, y + 1)
            && cell_passable(grid, x + 1, y + 1)
    } else {
        true
    }
}

fn successors(grid: &Grid<f32>, loc: Location, large: bool) -> Vec<(Location, OrderedFloat<f32>)> {
    let mut result = Vec::with_capacity(8);
    for (dx, dy) in NEIGHBORS_8 {
        let x = loc.x() as i32 + dx;
        let y = loc.y() as i32 + dy;
        if !passable(grid, x, y, large) {
            continue;
        }
        let weight = *grid.get(x as usize, y as usize);
        let step = if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 };
        result.push((
            Location::from_coords(x as u32, y as u32),
            OrderedFloat(weight * step),
        ));
    }
    result
}

/// Octile distance. Admissible because every finite cell weighs at least 1.
fn heuristic(from: Location, to: Location) -> OrderedFloat<f32> {
    let dx = (from.x() as f32 - to.x() as f32).abs();
    let dy = (from.y() as f32 - to.y() as f32).abs();
    OrderedFloat(dx.max(dy) + (SQRT_2 - 1.0) * dx.min(dy))
}

/// Shortest weighted path from `start` to `goal`, including both endpoints.
/// `None` when the goal is unreachable or out of bounds.
pub fn pathfind(
    grid: &Grid<f32>,
    start: Location,
    goal: Location,
    options: &PathOptions,
) -> Option<Vec<Location>> {
    Some(raw_pathfind(grid, start, goal, options)?.0)
}

/// [`pathfind`] plus the summed weight of the returned path, before any
/// decimation. Used when two candidate routes need comparing.
fn raw_pathfind(
    grid: &Grid<f32>,
    start: Location,
    goal: Location,
    options: &PathOptions,
) -> Option<(Vec<Location>, f32)> {
    if !grid.contains_location(start) || !grid.contains_location(goal) {
        return None;
    }
    if start == goal {
        return Some((vec![start], 0.0));
    }
    if !passable(grid, goal.x() as i32, goal.y() as i32, options.large) {
        return None;
    }

    let (mut path, cost) = astar(
        &start,
        |loc| successors(grid, *loc, options.large),
        |loc| heuristic(*loc, goal),
        |loc| *loc == goal,
    )?;

    if options.smoothing {
        path = smooth_path(grid, &path, options.large);
    }
    if options.sensitivity > 1 {
        path = decimate(path, goal, options.sensitivity);
    }
    Some((path, cost.into_inner()))
}

/// Every n-th point of the path, always ending on the goal.
fn decimate(path: Vec<Location>, goal: Location, sensitivity: usize) -> Vec<Location> {
    let mut result: Vec<Location> = path.into_iter().step_by(sensitivity).collect();
    if result.last() != Some(&goal) {
        result.push(goal);
    }
    result
}

/// Greedy line-of-sight shortcutting: from each anchor, jump to the farthest
/// later point whose connecting line is passable and no more expensive than
/// the path section it replaces.
fn smooth_path(grid: &Grid<f32>, path: &[Location], large: bool) -> Vec<Location> {
    if path.len() <= 2 {
        return path.to_vec();
    }
    let mut result = vec![path[0]];
    let mut i = 0;
    while i + 1 < path.len() {
        let mut next = i + 1;
        for j in (i + 2..path.len()).rev() {
            if let Some(line_weight) = line_cost(grid, path[i], path[j], large) {
                let section: f32 = path[i + 1..=j]
                    .iter()
                    .map(|p| *grid.get_location(*p))
                    .sum();
                if line_weight <= section {
                    next = j;
                    break;
                }
            }
        }
        result.push(path[next]);
        i = next;
    }
    result
}

/// Summed weight of the cells a straight line crosses, excluding the first.
/// `None` if the line leaves passable terrain.
fn line_cost(grid: &Grid<f32>, from: Location, to: Location, large: bool) -> Option<f32> {
    let mut total = 0.0;
    for cell in line_between(from, to).into_iter().skip(1) {
        if !passable(grid, cell.x() as i32, cell.y() as i32, large) {
            return None;
        }
        total += *grid.get_location(cell);
    }
    Some(total)
}

/// Bresenham line, inclusive of both endpoints.
fn line_between(from: Location, to: Location) -> Vec<Location> {
    let mut cells = Vec::new();
    let mut x = from.x() as i32;
    let mut y = from.y() as i32;
    let x1 = to.x() as i32;
    let y1 = to.y() as i32;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        cells.push(Location::from_coords(x as u32, y as u32));
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

/// Every cell tied for the lowest weight within `radius` of `position`.
/// Ties are returned in row-major order; an empty disk yields nothing.
pub fn find_lowest_cost_points(
    grid: &Grid<f32>,
    position: (f32, f32),
    radius: f32,
) -> Vec<Location> {
    let disk = disk_cells(position, radius, grid.width(), grid.height());
    let lowest = disk
        .iter()
        .map(|&(x, y)| OrderedFloat(*grid.get(x, y)))
        .min();
    match lowest {
        Some(min) => disk
            .into_iter()
            .filter(|&(x, y)| OrderedFloat(*grid.get(x, y)) == min)
            .map(|(x, y)| Location::from_coords(x as u32, y as u32))
            .collect(),
        None => Vec::new(),
    }
}

/// A ground route that may ride a nydus network.
#[derive(Clone, Debug, PartialEq)]
pub enum NydusRoute {
    /// Walking the whole way is cheapest (or no network is usable).
    Direct(Vec<Location>),
    /// Walk to an entrance, travel the network, walk from the exit.
    Through {
        entry_tag: u64,
        exit_tag: u64,
        to_entrance: Vec<Location>,
        from_exit: Vec<Location>,
    },
}

/// Picks the cheaper of walking directly and routing through a nydus
/// network (entrance leg + fixed travel cost + exit leg). Entrance and exit
/// must be distinct nodes. `None` when neither route reaches the goal.
pub fn pathfind_with_nyduses(
    grid: &Grid<f32>,
    start: Location,
    goal: Location,
    nyduses: &[NydusNode],
    options: &PathOptions,
) -> Option<NydusRoute> {
    let direct = raw_pathfind(grid, start, goal, options);

    let entry = nyduses
        .iter()
        .filter_map(|n| {
            raw_pathfind(grid, start, n.position, options).map(|(path, cost)| (n, path, cost))
        })
        .min_by(|a, b| a.2.total_cmp(&b.2));
    let exit = nyduses
        .iter()
        .filter_map(|n| {
            raw_pathfind(grid, n.position, goal, options).map(|(path, cost)| (n, path, cost))
        })
        .min_by(|a, b| a.2.total_cmp(&b.2));

    let through = match (entry, exit) {
        (Some((entry_node, to_entrance, entry_cost)), Some((exit_node, from_exit, exit_cost)))
            if entry_node.tag != exit_node.tag =>
        {
            Some((
                entry_node.tag,
                exit_node.tag,
                to_entrance,
                from_exit,
                entry_cost + NYDUS_TRAVEL_COST + exit_cost,
            ))
        }
        _ => None,
    };

    match (direct, through) {
        (Some((path, direct_cost)), Some((entry_tag, exit_tag, to_entrance, from_exit, cost))) => {
            if cost < direct_cost {
                debug!(
                    "nydus route {} -> {} beats direct path ({:.1} < {:.1})",
                    entry_tag, exit_tag, cost, direct_cost
                );
                Some(NydusRoute::Through {
                    entry_tag,
                    exit_tag,
                    to_entrance,
                    from_exit,
                })
            } else {
                Some(NydusRoute::Direct(path))
            }
        }
        (Some((path, _)), None) => Some(NydusRoute::Direct(path)),
        (None, Some((entry_tag, exit_tag, to_entrance, from_exit, _))) => {
            Some(NydusRoute::Through {
                entry_tag,
                exit_tag,
                to_entrance,
                from_exit,
            })
        }
        (None, None) => None,
    }
}
