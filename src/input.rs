//! Input payload handed over by the orchestration layer at map load.
//!
//! Everything here is raw snapshot data: the engine's known ramps, the
//! vision-blocker point set, point-obstacles that split regions, and the
//! output of the native narrow-passage detector. The detector itself is an
//! opaque collaborator; only its result shape is modeled.

use crate::location::*;
use crate::terrain::*;
use serde::{Deserialize, Serialize};

/// A ramp as reported by the engine: its tiles plus top/bottom anchors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RampData {
    pub points: Vec<Location>,
    /// Anchor at the high-ground end. Fractional because the engine reports
    /// the midpoint between tiles.
    pub top_center: (f32, f32),
    /// Anchor at the low-ground end.
    pub bottom_center: (f32, f32),
}

impl RampData {
    /// Distance between the two anchors. Degenerate (broken) ramps have
    /// near-coincident anchors and are excluded from classification.
    pub fn anchor_span(&self) -> f32 {
        let dx = self.top_center.0 - self.bottom_center.0;
        let dy = self.top_center.1 - self.bottom_center.1;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One candidate from the native narrow-passage detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectedChoke {
    pub id: u32,
    /// The tiles of the passage. An empty list is an invariant violation on
    /// the detector side and the candidate is discarded with a diagnostic.
    pub pixels: Vec<Location>,
    /// The two endpoints of the narrowest crossing line.
    pub main_line: (Location, Location),
}

/// Everything the compiler consumes, aligned to one coordinate system.
#[derive(Clone, Serialize, Deserialize)]
pub struct MapInput {
    pub map_name: String,
    pub terrain: TerrainData,
    pub ramps: Vec<RampData>,
    pub vision_blockers: Vec<Location>,
    /// Nominally-walkable point obstacles (e.g. blocking resource clusters)
    /// that must act as hard separators between regions.
    pub resource_blockers: Vec<Location>,
    /// Known base/expansion locations, attached to their containing region.
    pub base_locations: Vec<Location>,
    /// Narrow-passage detector output.
    pub chokes: Vec<DetectedChoke>,
}

impl MapInput {
    /// A bare input with open terrain and no features, used as a starting
    /// point by tests and synthetic-map tooling.
    pub fn open(map_name: &str, width: usize, height: usize) -> MapInput {
        MapInput {
            map_name: map_name.to_string(),
            terrain: TerrainData::open(width, height),
            ramps: Vec::new(),
            vision_blockers: Vec::new(),
            resource_blockers: Vec::new(),
            base_locations: Vec::new(),
            chokes: Vec::new(),
        }
    }
}

/// One end of a nydus-style teleport network, supplied per pathing query.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NydusNode {
    /// Caller-side identifier (unit tag) returned with the chosen pair.
    pub tag: u64,
    pub position: Location,
}
