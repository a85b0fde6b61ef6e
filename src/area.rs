//! Classified areas and the arena that owns them.
//!
//! Every area shares the same geometry payload; what distinguishes a region
//! from a ramp, vision-blocker zone, or raw choke is the variant of
//! [`AreaKind`]. Cross-references (bordering areas, region chokes) are
//! [`AreaId`] handles into the arena rather than owned references, which
//! keeps the region<->choke graph cycle-free.

use crate::location::*;
use crate::polygon::*;
use serde::{Deserialize, Serialize};

/// Handle to an [`Area`] in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct AreaId(pub u16);

/// Variant payload of a classified area.
#[derive(Clone, Serialize, Deserialize)]
pub enum AreaKind {
    /// An open walkable expanse large enough to be a first-class decision
    /// space.
    Region {
        /// Stable, dense label assigned after bounds filtering.
        label: u16,
        /// Base/expansion locations whose position falls inside the region.
        bases: Vec<Location>,
        /// Choke-type areas on the region's boundary (populated during
        /// linking and raw-choke association).
        region_chokes: Vec<AreaId>,
    },
    /// A ramp from the engine's ramp list.
    Ramp {
        top_center: (f32, f32),
        bottom_center: (f32, f32),
        /// Lateral extremes of the ramp, found by walking perpendicular to
        /// the top->bottom axis.
        side_a: Location,
        side_b: Location,
    },
    /// A cluster of vision-blocking tiles.
    VisionBlocker { side_a: Location, side_b: Location },
    /// A narrow passage found by the native detector.
    RawChoke {
        /// Detector-assigned identifier.
        id: u32,
        side_a: Location,
        side_b: Location,
    },
}

/// One classified area: shared geometry plus its variant.
#[derive(Clone, Serialize, Deserialize)]
pub struct Area {
    pub geometry: AreaGeometry,
    pub kind: AreaKind,
    /// Areas whose extended mask overlaps this area's outer perimeter.
    /// Populated by the linking phase, symmetric by construction.
    pub bordering: Vec<AreaId>,
}

impl Area {
    pub fn new(geometry: AreaGeometry, kind: AreaKind) -> Area {
        Area {
            geometry,
            kind,
            bordering: Vec::new(),
        }
    }

    pub fn is_region(&self) -> bool {
        matches!(self.kind, AreaKind::Region { .. })
    }

    /// True for every non-region variant: ramps, vision blockers, and raw
    /// chokes all act as connectors.
    pub fn is_choke(&self) -> bool {
        !self.is_region()
    }

    pub fn is_ramp(&self) -> bool {
        matches!(self.kind, AreaKind::Ramp { .. })
    }

    pub fn is_vision_blocker(&self) -> bool {
        matches!(self.kind, AreaKind::VisionBlocker { .. })
    }

    pub fn is_raw_choke(&self) -> bool {
        matches!(self.kind, AreaKind::RawChoke { .. })
    }

    /// Region label, if this is a region.
    pub fn region_label(&self) -> Option<u16> {
        match &self.kind {
            AreaKind::Region { label, .. } => Some(*label),
            _ => None,
        }
    }

    pub fn region_chokes(&self) -> &[AreaId] {
        match &self.kind {
            AreaKind::Region { region_chokes, .. } => region_chokes,
            _ => &[],
        }
    }

    /// The narrowest-crossing endpoints for choke variants; regions have
    /// none.
    pub fn sides(&self) -> Option<(Location, Location)> {
        match &self.kind {
            AreaKind::Region { .. } => None,
            AreaKind::Ramp { side_a, side_b, .. }
            | AreaKind::VisionBlocker { side_a, side_b }
            | AreaKind::RawChoke { side_a, side_b, .. } => Some((*side_a, *side_b)),
        }
    }
}

/// Owning store for all areas of a compiled map.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AreaArena {
    areas: Vec<Area>,
}

impl AreaArena {
    pub fn push(&mut self, area: Area) -> AreaId {
        let id = AreaId(self.areas.len() as u16);
        self.areas.push(area);
        id
    }

    #[inline]
    pub fn get(&self, id: AreaId) -> &Area {
        &self.areas[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: AreaId) -> &mut Area {
        &mut self.areas[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AreaId, &Area)> {
        self.areas
            .iter()
            .enumerate()
            .map(|(i, a)| (AreaId(i as u16), a))
    }

    pub fn region_ids(&self) -> Vec<AreaId> {
        self.iter()
            .filter(|(_, a)| a.is_region())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn choke_ids(&self) -> Vec<AreaId> {
        self.iter()
            .filter(|(_, a)| a.is_choke())
            .map(|(id, _)| id)
            .collect()
    }

    /// Records a choke on a region's boundary list, deduplicated.
    pub fn attach_region_choke(&mut self, region: AreaId, choke: AreaId) {
        if let AreaKind::Region { region_chokes, .. } = &mut self.get_mut(region).kind {
            if !region_chokes.contains(&choke) {
                region_chokes.push(choke);
            }
        }
    }
}
