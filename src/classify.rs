//! First compilation phase: turn the labeled mask and the raw feature lists
//! into classified areas.
//!
//! Build order matters and mirrors the area precedence rules: regions first,
//! then ramps, then vision blockers, and finally the native detector's raw
//! chokes, which are deduplicated against everything built before them.

use crate::area::*;
use crate::constants::*;
use crate::grid::*;
use crate::input::*;
use crate::location::*;
use crate::polygon::*;
use crate::segmentation;
use fnv::FnvHashSet;
use log::*;

/// Builds every area from the input snapshot. This is phase one of the
/// two-phase compile; adjacency is not known yet when it returns.
pub fn segment_and_classify(input: &MapInput, settings: &CompileSettings) -> AreaArena {
    let mut arena = AreaArena::default();

    build_regions(input, settings, &mut arena);
    build_ramps(input, settings, &mut arena);
    build_vision_blockers(input, settings, &mut arena);
    build_raw_chokes(input, settings, &mut arena);

    debug!(
        "classified {} areas ({} regions)",
        arena.len(),
        arena.region_ids().len()
    );
    arena
}

fn build_regions(input: &MapInput, settings: &CompileSettings, arena: &mut AreaArena) {
    let placement = input.terrain.placement_mask();
    let labeled = segmentation::segment(&placement, &input.resource_blockers);

    let mut label_count = 0u16;
    for label in &labeled.distinct {
        let mask = labeled.mask_of(*label);
        let geometry = match AreaGeometry::from_mask(mask, settings.corner_distance) {
            Some(g) => g,
            None => continue,
        };

        // Bounds filter: too small is noise, too large is a mis-segmentation.
        if geometry.area() <= settings.min_region_area
            || geometry.area() >= settings.max_region_area
        {
            trace!(
                "dropping component {} with area {} outside ({}, {})",
                label,
                geometry.area(),
                settings.min_region_area,
                settings.max_region_area
            );
            continue;
        }

        let bases = input
            .base_locations
            .iter()
            .copied()
            .filter(|b| geometry.contains_location(*b))
            .collect();

        arena.push(Area::new(
            geometry,
            AreaKind::Region {
                label: label_count,
                bases,
                region_chokes: Vec::new(),
            },
        ));
        label_count += 1;
    }
}

fn build_vision_blockers(input: &MapInput, settings: &CompileSettings, arena: &mut AreaArena) {
    if input.vision_blockers.is_empty() {
        return;
    }

    let width = input.terrain.width();
    let height = input.terrain.height_tiles();
    let vb_mask = Grid::from_points(width, height, &input.vision_blockers, 1u8, 0u8);
    let labeled = segmentation::label_components(&vb_mask, segmentation::Connectivity::Four);

    for label in &labeled.distinct {
        let geometry =
            match AreaGeometry::from_mask(labeled.mask_of(*label), settings.corner_distance) {
                Some(g) => g,
                None => continue,
            };
        // Oversized clusters are detector noise, not actual bushes.
        if geometry.area() > settings.vision_blocker_max_area {
            debug!(
                "rejecting vision blocker cluster of area {} (cap {})",
                geometry.area(),
                settings.vision_blocker_max_area
            );
            continue;
        }
        let (side_a, side_b) = vision_blocker_sides(&geometry);
        arena.push(Area::new(geometry, AreaKind::VisionBlocker { side_a, side_b }));
    }
}

/// Side anchors of a vision blocker: midpoints between opposing extremes.
fn vision_blocker_sides(geometry: &AreaGeometry) -> (Location, Location) {
    let top = geometry.top();
    let bottom = geometry.bottom();
    let right = geometry.right();
    let left = geometry.left();

    let midpoint = |a: Location, b: Location| {
        Location::from_coords(
            ((a.x() as u32 + b.x() as u32) + 1) / 2,
            ((a.y() as u32 + b.y() as u32) + 1) / 2,
        )
    };

    let towards_top = closest_towards_point(
        &[bottom, right, left],
        (top.x() as f32, top.y() as f32),
    )
    .unwrap_or(bottom);
    let side_a = midpoint(top, towards_top);

    let side_b = if towards_top != bottom {
        let towards_bottom = closest_towards_point(
            &[top, right, left],
            (bottom.x() as f32, bottom.y() as f32),
        )
        .unwrap_or(top);
        midpoint(bottom, towards_bottom)
    } else {
        midpoint(right, left)
    };

    (side_a, side_b)
}

fn build_ramps(input: &MapInput, settings: &CompileSettings, arena: &mut AreaArena) {
    let width = input.terrain.width();
    let height = input.terrain.height_tiles();

    for ramp in &input.ramps {
        // Broken engine data: near-coincident anchors. The narrow-passage
        // detector re-finds such passages as plain chokes if they are real.
        if ramp.anchor_span() < settings.degenerate_ramp_distance {
            debug!(
                "skipping degenerate ramp at {:?} (anchor span {:.2})",
                ramp.top_center,
                ramp.anchor_span()
            );
            continue;
        }
        if ramp.points.is_empty() {
            warn!("ramp at {:?} has no points, discarding", ramp.top_center);
            continue;
        }

        let mask = Grid::from_points(width, height, &ramp.points, 1u8, 0u8);
        let geometry = match AreaGeometry::from_mask(mask, settings.corner_distance) {
            Some(g) => g,
            None => continue,
        };
        let (side_a, side_b) = ramp_sides(&geometry, ramp);
        arena.push(Area::new(
            geometry,
            AreaKind::Ramp {
                top_center: ramp.top_center,
                bottom_center: ramp.bottom_center,
                side_a,
                side_b,
            },
        ));
    }
}

/// Walks perpendicular to the ramp's top->bottom axis from its midpoint,
/// in both directions, until leaving the ramp; the last points still inside
/// are the lateral side anchors.
fn ramp_sides(geometry: &AreaGeometry, ramp: &RampData) -> (Location, Location) {
    let dir = (
        ramp.bottom_center.0 - ramp.top_center.0,
        ramp.bottom_center.1 - ramp.top_center.1,
    );
    let len = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
    if len == 0.0 {
        return (geometry.center(), geometry.center());
    }
    let perpendicular = (-dir.1 / len, dir.0 / len);
    let midpoint = (
        ramp.top_center.0 + dir.0 / 2.0,
        ramp.top_center.1 + dir.1 / 2.0,
    );

    let walk = |step: (f32, f32)| -> Location {
        let mut side = Location::from_fractional(midpoint.0, midpoint.1);
        let mut current = midpoint;
        loop {
            let next = Location::from_fractional(current.0, current.1);
            if !geometry.contains_location(next) {
                break;
            }
            side = next;
            current = (current.0 + step.0, current.1 + step.1);
        }
        side
    };

    let side_a = walk(perpendicular);
    let side_b = walk((-perpendicular.0, -perpendicular.1));
    (side_a, side_b)
}

fn build_raw_chokes(input: &MapInput, settings: &CompileSettings, arena: &mut AreaArena) {
    let width = input.terrain.width();
    let height = input.terrain.height_tiles();

    // A detected choke that shares any tile with an already-built ramp or
    // vision blocker is redundant: that passage is represented already.
    let covered: FnvHashSet<Location> = arena
        .iter()
        .filter(|(_, a)| a.is_ramp() || a.is_vision_blocker())
        .flat_map(|(_, a)| a.geometry.points())
        .collect();

    'candidates: for choke in &input.chokes {
        if choke.pixels.is_empty() {
            debug!("cannot add choke {} with 0 points", choke.id);
            continue;
        }
        if choke.pixels.iter().any(|p| covered.contains(p)) {
            trace!("choke {} overlaps a ramp or vision blocker, dropping", choke.id);
            continue;
        }

        let mask = Grid::from_points(width, height, &choke.pixels, 1u8, 0u8);
        let geometry = match AreaGeometry::from_mask(mask, settings.corner_distance) {
            Some(g) => g,
            None => {
                debug!("choke {} produced an empty footprint, discarding", choke.id);
                continue;
            }
        };

        // Resolve the centroid against everything built so far. Regions
        // record the association both ways; an earlier raw choke claiming
        // the centroid absorbs this candidate instead.
        let centroid = choke_centroid(geometry.mask());
        let claiming: Vec<AreaId> = arena
            .iter()
            .filter(|(_, a)| a.geometry.contains_location(centroid))
            .map(|(id, _)| id)
            .collect();

        let mut adjacent_regions = Vec::new();
        for id in &claiming {
            let area = arena.get(*id);
            if area.is_region() {
                adjacent_regions.push(*id);
            } else if area.is_raw_choke() {
                // Merge: union this candidate's points into the existing
                // choke. First claimant in arena order wins; detector output
                // order can shift which choke absorbs shared points, which
                // callers must not rely on.
                let merged = area
                    .geometry
                    .with_extra_points(&choke.pixels, settings.corner_distance);
                arena.get_mut(*id).geometry = merged;
                trace!("choke {} merged into an existing choke", choke.id);
                continue 'candidates;
            }
        }

        let new_id = arena.push(Area::new(
            geometry,
            AreaKind::RawChoke {
                id: choke.id,
                side_a: choke.main_line.0,
                side_b: choke.main_line.1,
            },
        ));
        for region in adjacent_regions {
            arena.attach_region_choke(region, new_id);
            let bordering = &mut arena.get_mut(new_id).bordering;
            if !bordering.contains(&region) {
                bordering.push(region);
            }
            let region_bordering = &mut arena.get_mut(region).bordering;
            if !region_bordering.contains(&new_id) {
                region_bordering.push(new_id);
            }
        }
    }
}

/// Integer centroid (truncated center of mass) of a choke footprint.
fn choke_centroid(mask: &Grid<u8>) -> Location {
    let (mut cx, mut cy, mut n) = (0f32, 0f32, 0f32);
    for ((x, y), v) in mask.iter() {
        if *v != 0 {
            cx += x as f32;
            cy += y as f32;
            n += 1.0;
        }
    }
    Location::from_coords((cx / n) as u32, (cy / n) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::*;

    fn corridor_input() -> MapInput {
        // Two rooms joined by a 1-wide, 3-long corridor. The corridor is
        // pathable but not placeable, which is what separates the rooms
        // under placement-mask segmentation.
        let mut input = MapInput::open("corridor", 15, 9);
        for y in 0..9 {
            for x in 0..15 {
                let room = (x <= 4 && (2..=6).contains(&y)) || (x >= 8 && (2..=6).contains(&y));
                let corridor = (5..=7).contains(&x) && y == 4;
                let flags = if room {
                    TileFlags::PATHABLE | TileFlags::PLACEABLE
                } else if corridor {
                    TileFlags::PATHABLE
                } else {
                    TileFlags::NONE
                };
                input.terrain.set(x, y, flags);
            }
        }
        input
    }

    #[test]
    fn open_map_yields_single_region() {
        let input = MapInput::open("open", 10, 10);
        let settings = CompileSettings::default();
        let arena = segment_and_classify(&input, &settings);
        assert_eq!(arena.len(), 1);
        assert!(arena.get(AreaId(0)).is_region());
    }

    #[test]
    fn undersized_components_are_dropped() {
        // 2x2 walkable patch: extended area stays below MIN_REGION_AREA.
        let mut input = MapInput::open("tiny", 20, 20);
        for y in 0..20 {
            for x in 0..20 {
                let keep = (3..5).contains(&x) && (3..5).contains(&y);
                input.terrain.set(
                    x,
                    y,
                    if keep {
                        TileFlags::PATHABLE | TileFlags::PLACEABLE
                    } else {
                        TileFlags::NONE
                    },
                );
            }
        }
        let arena = segment_and_classify(&input, &CompileSettings::default());
        assert!(arena.is_empty());
    }

    #[test]
    fn corridor_map_yields_two_regions() {
        let mut settings = CompileSettings::default();
        settings.min_region_area = 10;
        let arena = segment_and_classify(&corridor_input(), &settings);
        assert_eq!(arena.region_ids().len(), 2);
    }

    #[test]
    fn detected_choke_becomes_raw_choke_with_region_links() {
        let mut input = corridor_input();
        let pixels: Vec<Location> = (5..=7).map(|x| Location::from_coords(x, 4)).collect();
        input.chokes.push(DetectedChoke {
            id: 7,
            pixels: pixels.clone(),
            main_line: (pixels[0], pixels[2]),
        });
        let mut settings = CompileSettings::default();
        settings.min_region_area = 10;
        let arena = segment_and_classify(&input, &settings);

        let chokes = arena.choke_ids();
        assert_eq!(chokes.len(), 1);
        let choke = arena.get(chokes[0]);
        assert!(choke.is_raw_choke());
        assert_eq!(choke.sides(), Some((pixels[0], pixels[2])));
    }

    #[test]
    fn choke_overlapping_ramp_is_dropped() {
        let mut input = corridor_input();
        let ramp_points: Vec<Location> = (5..=7).map(|x| Location::from_coords(x, 4)).collect();
        input.ramps.push(RampData {
            points: ramp_points.clone(),
            top_center: (5.0, 4.0),
            bottom_center: (7.0, 4.0),
        });
        input.chokes.push(DetectedChoke {
            id: 9,
            pixels: ramp_points.clone(),
            main_line: (ramp_points[0], ramp_points[2]),
        });
        let mut settings = CompileSettings::default();
        settings.min_region_area = 10;
        let arena = segment_and_classify(&input, &settings);

        let chokes: Vec<_> = arena.iter().filter(|(_, a)| a.is_choke()).collect();
        assert_eq!(chokes.len(), 1);
        assert!(chokes[0].1.is_ramp());
    }

    #[test]
    fn degenerate_ramp_is_skipped() {
        let mut input = corridor_input();
        input.ramps.push(RampData {
            points: vec![Location::from_coords(6, 4)],
            top_center: (6.0, 4.0),
            bottom_center: (6.2, 4.0),
        });
        let mut settings = CompileSettings::default();
        settings.min_region_area = 10;
        let arena = segment_and_classify(&input, &settings);
        assert!(arena.iter().all(|(_, a)| !a.is_ramp()));
    }

    #[test]
    fn empty_choke_candidate_is_discarded() {
        let mut input = corridor_input();
        input.chokes.push(DetectedChoke {
            id: 3,
            pixels: Vec::new(),
            main_line: (Location::from_coords(0, 0), Location::from_coords(0, 0)),
        });
        let mut settings = CompileSettings::default();
        settings.min_region_area = 10;
        let arena = segment_and_classify(&input, &settings);
        assert!(arena.iter().all(|(_, a)| !a.is_raw_choke()));
    }

    #[test]
    fn overlapping_choke_candidates_merge() {
        let mut input = corridor_input();
        let first: Vec<Location> = (5..=6).map(|x| Location::from_coords(x, 4)).collect();
        // Second candidate's centroid lands inside the first choke.
        let second: Vec<Location> = (5..=7).map(|x| Location::from_coords(x, 4)).collect();
        input.chokes.push(DetectedChoke {
            id: 1,
            pixels: first.clone(),
            main_line: (first[0], first[1]),
        });
        input.chokes.push(DetectedChoke {
            id: 2,
            pixels: second.clone(),
            main_line: (second[0], second[2]),
        });
        let mut settings = CompileSettings::default();
        settings.min_region_area = 10;
        let arena = segment_and_classify(&input, &settings);

        let chokes: Vec<_> = arena.iter().filter(|(_, a)| a.is_raw_choke()).collect();
        assert_eq!(chokes.len(), 1);
        // The surviving choke absorbed the second candidate's points.
        assert!(chokes[0]
            .1
            .geometry
            .contains_location(Location::from_coords(7, 4)));
    }
}
