//! The compiled map model: the crate's public entry point.
//!
//! [`MapModel::compile`] runs the full pipeline in two explicit phases:
//! segmentation/classification first (every area comes into existence), then
//! linking (adjacency, region<->choke association, ramp completion), then
//! the region connectivity graph is derived. The compiled model is
//! immutable; point queries are memoized through a generation-checked cache.

use crate::area::*;
use crate::classify::*;
use crate::connectivity::*;
use crate::constants::*;
use crate::cost;
use crate::grid::*;
use crate::input::*;
use crate::link::*;
use crate::location::*;
use crate::pathing::{self, NydusRoute, PathOptions};
use crate::query::*;
use log::*;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic compile counter. Distinguishes models so that caches keyed by
/// generation never serve entries from a previously compiled map.
static COMPILE_GENERATION: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The terrain grid has a zero dimension.
    EmptyTerrain,
    /// No tile on the map is walkable; nothing can be segmented or pathed.
    NoWalkableTiles,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::EmptyTerrain => write!(f, "terrain grid has a zero dimension"),
            CompileError::NoWalkableTiles => write!(f, "map contains no walkable tiles"),
        }
    }
}

impl Error for CompileError {}

/// A fully compiled map: classified areas, adjacency, connectivity, and the
/// masks the cost-grid factory works from. Serializable, so a compiled
/// model can be cached to disk keyed by map name and reloaded instead of
/// recompiled; the query cache starts empty on load.
#[derive(Serialize, Deserialize)]
pub struct MapModel {
    map_name: String,
    generation: u64,
    walkability: Grid<u8>,
    climber: Grid<u8>,
    resource_blockers: Vec<Location>,
    arena: AreaArena,
    connectivity: ConnectivityGraph,
    #[serde(skip, default)]
    query_cache: QueryCache,
}

impl MapModel {
    /// Compiles `input` into an immutable model.
    pub fn compile(input: &MapInput, settings: &CompileSettings) -> Result<MapModel, CompileError> {
        if input.terrain.width() == 0 || input.terrain.height_tiles() == 0 {
            return Err(CompileError::EmptyTerrain);
        }
        let walkability = input.terrain.walkability_mask();
        if walkability.count_nonzero() == 0 {
            return Err(CompileError::NoWalkableTiles);
        }

        let mut arena = segment_and_classify(input, settings);
        link_adjacency(&mut arena);
        let connectivity = ConnectivityGraph::build(&arena);

        let generation = COMPILE_GENERATION.fetch_add(1, Ordering::Relaxed) + 1;
        let mut query_cache = QueryCache::new();
        query_cache.sync_generation(generation);

        info!(
            "compiled {}: {} regions, {} chokes, generation {}",
            input.map_name,
            arena.region_ids().len(),
            arena.choke_ids().len(),
            generation
        );

        Ok(MapModel {
            map_name: input.map_name.clone(),
            generation,
            walkability,
            climber: input.terrain.climber_mask(),
            resource_blockers: input.resource_blockers.clone(),
            arena,
            connectivity,
            query_cache,
        })
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn arena(&self) -> &AreaArena {
        &self.arena
    }

    pub fn area(&self, id: AreaId) -> &Area {
        self.arena.get(id)
    }

    pub fn regions(&self) -> Vec<AreaId> {
        self.arena.region_ids()
    }

    pub fn chokes(&self) -> Vec<AreaId> {
        self.arena.choke_ids()
    }

    pub fn connectivity(&self) -> &ConnectivityGraph {
        &self.connectivity
    }

    /// Every area claiming `point`, regions listed before choke types.
    /// Memoized; repeated lookups of hot points are map reads.
    pub fn where_all(&mut self, point: Location) -> Vec<AreaId> {
        self.query_cache.sync_generation(self.generation);
        self.query_cache.where_all(&self.arena, point)
    }

    /// First hit of [`MapModel::where_all`].
    pub fn where_point(&mut self, point: Location) -> Option<AreaId> {
        self.where_all(point).into_iter().next()
    }

    /// The region containing `point`, ignoring chokes. Not memoized; region
    /// lookups are rare outside of linking.
    pub fn region_at(&self, point: Location) -> Option<AreaId> {
        resolve_region(&self.arena, point)
    }

    /// Ground cost grid: unwalkable cells (and resource blockers) infinite.
    pub fn ground_grid(&self, default_weight: f32) -> Grid<f32> {
        cost::ground_grid(&self.walkability, &self.resource_blockers, default_weight)
    }

    /// Cost grid for cliff-capable units.
    pub fn climber_grid(&self, default_weight: f32) -> Grid<f32> {
        cost::climber_grid(&self.climber, &self.resource_blockers, default_weight)
    }

    /// Uniform air grid; terrain is irrelevant to flight.
    pub fn clean_air_grid(&self, default_weight: f32) -> Grid<f32> {
        cost::clean_air_grid(self.walkability.width(), self.walkability.height(), default_weight)
    }

    /// Air grid biased over ground-unwalkable terrain.
    pub fn air_vs_ground_grid(&self, default_weight: f32) -> Grid<f32> {
        cost::air_vs_ground_grid(&self.walkability, default_weight)
    }

    pub fn pathfind(
        &self,
        grid: &Grid<f32>,
        start: Location,
        goal: Location,
        options: &PathOptions,
    ) -> Option<Vec<Location>> {
        pathing::pathfind(grid, start, goal, options)
    }

    pub fn pathfind_with_nyduses(
        &self,
        grid: &Grid<f32>,
        start: Location,
        goal: Location,
        nyduses: &[NydusNode],
        options: &PathOptions,
    ) -> Option<NydusRoute> {
        pathing::pathfind_with_nyduses(grid, start, goal, nyduses, options)
    }

    pub fn find_lowest_cost_points(
        &self,
        grid: &Grid<f32>,
        position: (f32, f32),
        radius: f32,
    ) -> Vec<Location> {
        pathing::find_lowest_cost_points(grid, position, radius)
    }

    /// Every simple region-level route from `start` to `goal`, optionally
    /// excluding regions.
    pub fn region_connectivity_all_paths(
        &self,
        start: AreaId,
        goal: AreaId,
        exclude: &[AreaId],
    ) -> Vec<Vec<AreaId>> {
        self.connectivity.all_paths(start, goal, exclude)
    }
}
