//! Tuning constants for map compilation and pathing.

/// An area smaller than this (extended-mask cell count) is noise, not a region.
pub const MIN_REGION_AREA: usize = 25;
/// An area larger than this indicates a mis-segmentation (two regions that
/// failed to separate, e.g. through a broken ramp) and is discarded.
pub const MAX_REGION_AREA: usize = 8500;

/// Minimum pairwise distance between retained corner points. Lower values
/// keep sharper (and more numerous) corners.
pub const CORNER_MIN_DISTANCE: usize = 9;

/// Relative threshold on the corner response when picking corner peaks.
pub const CORNER_THRESHOLD_REL: f32 = 0.01;

/// Vision-blocker clusters above this cell count are detector noise.
pub const VISION_BLOCKER_MAX_AREA: usize = 200;

/// Ramps whose top and bottom anchors are closer than this are broken data;
/// the narrow-passage detector will re-find them as plain chokes.
pub const DEGENERATE_RAMP_DISTANCE: f32 = 1.0;

/// Fixed cost of transiting a nydus network (entry to exit), added when
/// comparing a through-network path against the direct path.
pub const NYDUS_TRAVEL_COST: f32 = 50.0;

/// Cap on enumerated simple paths in the region connectivity graph, guarding
/// against combinatorial blowup on pathological maps.
pub const MAX_CONNECTIVITY_PATHS: usize = 512;

/// Neighbor offsets for 8-directional movement.
pub const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// Neighbor offsets for 4-directional (cardinal) movement.
pub const NEIGHBORS_4: [(i32, i32); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

/// Compile-time settings. Everything has a sensible default; the knob
/// callers most commonly touch is `corner_distance`.
#[derive(Clone, Debug)]
pub struct CompileSettings {
    pub min_region_area: usize,
    pub max_region_area: usize,
    /// See [`CORNER_MIN_DISTANCE`].
    pub corner_distance: usize,
    pub vision_blocker_max_area: usize,
    pub degenerate_ramp_distance: f32,
}

impl Default for CompileSettings {
    fn default() -> Self {
        CompileSettings {
            min_region_area: MIN_REGION_AREA,
            max_region_area: MAX_REGION_AREA,
            corner_distance: CORNER_MIN_DISTANCE,
            vision_blocker_max_area: VISION_BLOCKER_MAX_AREA,
            degenerate_ramp_distance: DEGENERATE_RAMP_DISTANCE,
        }
    }
}
