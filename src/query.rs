//! Point -> area membership resolution.
//!
//! Area topology is immutable once a map is compiled, so memoized results
//! keyed only by the queried point stay valid for the map's lifetime. The
//! cache is still an explicit object with a generation counter rather than
//! something hidden inside the model: callers that recompile (new map) get
//! a fresh generation and stale entries are dropped on first use.

use crate::area::*;
use crate::location::*;
use fnv::FnvHashMap;

/// Resolves every area claiming `point`, regions first, then choke types.
/// Out-of-bounds points resolve to nothing.
pub fn resolve_point(arena: &AreaArena, point: Location) -> Vec<AreaId> {
    let mut results = Vec::new();
    for (id, area) in arena.iter() {
        if area.is_region() && area.geometry.contains_location(point) {
            results.push(id);
        }
    }
    for (id, area) in arena.iter() {
        if area.is_choke() && area.geometry.contains_location(point) {
            results.push(id);
        }
    }
    results
}

/// First area claiming `point` in region-before-choke order.
pub fn resolve_point_first(arena: &AreaArena, point: Location) -> Option<AreaId> {
    resolve_point(arena, point).into_iter().next()
}

/// The region claiming `point`, ignoring chokes entirely.
pub fn resolve_region(arena: &AreaArena, point: Location) -> Option<AreaId> {
    arena
        .iter()
        .find(|(_, a)| a.is_region() && a.geometry.contains_location(point))
        .map(|(id, _)| id)
}

/// Memoized membership lookups, owned by the caller.
#[derive(Default)]
pub struct QueryCache {
    generation: u64,
    entries: FnvHashMap<Location, Vec<AreaId>>,
}

impl QueryCache {
    pub fn new() -> QueryCache {
        QueryCache::default()
    }

    /// Drops all memoized entries when `generation` has advanced (i.e. a
    /// different compiled model is now in use).
    pub fn sync_generation(&mut self, generation: u64) {
        if self.generation != generation {
            self.entries.clear();
            self.generation = generation;
        }
    }

    pub fn where_all(&mut self, arena: &AreaArena, point: Location) -> Vec<AreaId> {
        self.entries
            .entry(point)
            .or_insert_with(|| resolve_point(arena, point))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
