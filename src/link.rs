//! Second compilation phase: adjacency.
//!
//! Precondition: every area already exists in the arena. Adjacency cannot
//! be computed while areas are still being enumerated, which is why this is
//! a separate, explicitly-ordered phase rather than part of construction.

use crate::area::*;
use crate::location::*;
use crate::query::*;
use fnv::FnvHashSet;
use itertools::Itertools;
use log::*;

/// Populates `bordering` for every area (deduplicated, self excluded,
/// symmetric), records region<->choke boundary associations, and completes
/// ramps that ended up with fewer than two regions.
pub fn link_adjacency(arena: &mut AreaArena) {
    let ids: Vec<AreaId> = arena.iter().map(|(id, _)| id).collect();

    for id in &ids {
        let mut neighbors: FnvHashSet<AreaId> = arena.get(*id).bordering.iter().copied().collect();
        for point in arena.get(*id).geometry.outer_perimeter_points().to_vec() {
            for hit in resolve_point(arena, point) {
                if hit != *id {
                    neighbors.insert(hit);
                }
            }
        }
        arena.get_mut(*id).bordering = neighbors.into_iter().sorted().collect();
    }

    symmetrize(arena, &ids);
    propagate_through_vision_blockers(arena, &ids);
    complete_lonely_ramps(arena, &ids);

    // Region boundary chokes follow directly from adjacency.
    for id in &ids {
        if !arena.get(*id).is_region() {
            continue;
        }
        let chokes: Vec<AreaId> = arena
            .get(*id)
            .bordering
            .iter()
            .copied()
            .filter(|n| arena.get(*n).is_choke())
            .collect();
        for choke in chokes {
            arena.attach_region_choke(*id, choke);
        }
    }
}

/// Adjacency is observed from each side independently (A's outer perimeter
/// against B's extended mask), which is not inherently symmetric at mask
/// edges; one reverse pass makes it so.
fn symmetrize(arena: &mut AreaArena, ids: &[AreaId]) {
    for id in ids {
        for neighbor in arena.get(*id).bordering.clone() {
            let reverse = &mut arena.get_mut(neighbor).bordering;
            if !reverse.contains(id) {
                reverse.push(*id);
                reverse.sort();
            }
        }
    }
}

/// A ramp that touches a region only through an intervening vision blocker
/// still connects to it; adopt the blocker's regions on both sides.
fn propagate_through_vision_blockers(arena: &mut AreaArena, ids: &[AreaId]) {
    for id in ids {
        if !arena.get(*id).is_ramp() {
            continue;
        }
        let via_blockers: Vec<AreaId> = arena
            .get(*id)
            .bordering
            .iter()
            .copied()
            .filter(|n| arena.get(*n).is_vision_blocker())
            .flat_map(|vb| arena.get(vb).bordering.clone())
            .filter(|candidate| arena.get(*candidate).is_region())
            .collect();

        for region in via_blockers {
            let bordering = &mut arena.get_mut(*id).bordering;
            if !bordering.contains(&region) {
                bordering.push(region);
                bordering.sort();
            }
            let reverse = &mut arena.get_mut(region).bordering;
            if !reverse.contains(id) {
                reverse.push(*id);
                reverse.sort();
            }
        }
    }
}

/// A ramp bordering fewer than two regions adopts the closest remaining
/// region (by perimeter distance), so every surviving ramp actually joins
/// two decision spaces.
fn complete_lonely_ramps(arena: &mut AreaArena, ids: &[AreaId]) {
    for id in ids {
        if !arena.get(*id).is_ramp() {
            continue;
        }
        let connected: Vec<AreaId> = arena
            .get(*id)
            .bordering
            .iter()
            .copied()
            .filter(|n| arena.get(*n).is_region())
            .collect();
        if connected.len() >= 2 {
            continue;
        }

        let perimeter = arena.get(*id).geometry.outer_perimeter_points().to_vec();
        let closest = arena
            .region_ids()
            .into_iter()
            .filter(|r| !connected.contains(r))
            .min_by(|a, b| {
                region_ramp_distance(arena, *a, &perimeter)
                    .total_cmp(&region_ramp_distance(arena, *b, &perimeter))
            });

        match closest {
            Some(region) => {
                debug!(
                    "ramp {:?} bordered {} regions, adopting closest region {:?}",
                    id,
                    connected.len(),
                    region
                );
                let bordering = &mut arena.get_mut(*id).bordering;
                if !bordering.contains(&region) {
                    bordering.push(region);
                    bordering.sort();
                }
                let reverse = &mut arena.get_mut(region).bordering;
                if !reverse.contains(id) {
                    reverse.push(*id);
                    reverse.sort();
                }
            }
            None => {
                warn!("ramp {:?} has no candidate region to adopt", id);
            }
        }
    }
}

fn region_ramp_distance(arena: &AreaArena, region: AreaId, ramp_perimeter: &[Location]) -> f32 {
    let center = arena.get(region).geometry.center();
    ramp_perimeter
        .iter()
        .map(|p| p.euclidean_distance_squared(center))
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::*;
    use crate::constants::*;
    use crate::input::*;
    use crate::terrain::*;

    fn linked_corridor_arena() -> AreaArena {
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
        let pixels: Vec<Location> = (5..=7).map(|x| Location::from_coords(x, 4)).collect();
        input.chokes.push(DetectedChoke {
            id: 1,
            pixels: pixels.clone(),
            main_line: (pixels[0], pixels[2]),
        });

        let mut settings = CompileSettings::default();
        settings.min_region_area = 10;
        let mut arena = segment_and_classify(&input, &settings);
        link_adjacency(&mut arena);
        arena
    }

    #[test]
    fn adjacency_is_symmetric() {
        let arena = linked_corridor_arena();
        for (id, area) in arena.iter() {
            for neighbor in &area.bordering {
                assert!(
                    arena.get(*neighbor).bordering.contains(&id),
                    "asymmetric edge {:?} -> {:?}",
                    id,
                    neighbor
                );
            }
        }
    }

    #[test]
    fn corridor_choke_borders_both_regions() {
        let arena = linked_corridor_arena();
        let choke_id = arena
            .iter()
            .find(|(_, a)| a.is_raw_choke())
            .map(|(id, _)| id)
            .expect("corridor choke must survive classification");

        let bordering_regions: Vec<AreaId> = arena
            .get(choke_id)
            .bordering
            .iter()
            .copied()
            .filter(|n| arena.get(*n).is_region())
            .collect();
        assert_eq!(bordering_regions.len(), 2);
    }

    #[test]
    fn regions_record_their_boundary_chokes() {
        let arena = linked_corridor_arena();
        for region in arena.region_ids() {
            let chokes = arena.get(region).region_chokes();
            assert_eq!(chokes.len(), 1, "each room touches exactly one choke");
            assert!(arena.get(chokes[0]).is_raw_choke());
        }
    }

    #[test]
    fn no_area_borders_itself() {
        let arena = linked_corridor_arena();
        for (id, area) in arena.iter() {
            assert!(!area.bordering.contains(&id));
        }
    }
}
