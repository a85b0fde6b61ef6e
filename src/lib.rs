//! Map decomposition and weighted pathfinding for 2D tile maps.
//!
//! The crate compiles a raw terrain snapshot into an immutable [`model::MapModel`]:
//! walkable space segmented into regions, connected by ramps, vision-blocker
//! zones, and detected chokes, with a region-level connectivity graph on
//! top. Cost grids derived from the model feed a weighted A* pathfinder that
//! supports influence stamping, path smoothing, and teleport networks.

pub mod area;
pub mod classify;
pub mod connectivity;
pub mod constants;
pub mod cost;
pub mod grid;
pub mod input;
pub mod link;
pub mod location;
pub mod model;
pub mod pathing;
pub mod polygon;
pub mod query;
pub mod segmentation;
pub mod terrain;

pub use area::{Area, AreaArena, AreaId, AreaKind};
pub use constants::CompileSettings;
pub use grid::Grid;
pub use input::{DetectedChoke, MapInput, NydusNode, RampData};
pub use location::Location;
pub use model::{CompileError, MapModel};
pub use pathing::{NydusRoute, PathOptions};
pub use polygon::AreaGeometry;
pub use terrain::{TerrainData, TileFlags};
