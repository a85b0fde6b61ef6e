//! End-to-end compile tests on synthetic maps.

use map_surveyor::*;

/// Two 5x5 rooms joined by a 1-wide pathable corridor, with the corridor
/// reported by the narrow-passage detector.
fn corridor_input() -> MapInput {
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
    input.base_locations.push(Location::from_coords(2, 4));
    input.base_locations.push(Location::from_coords(12, 4));
    input
}

fn corridor_settings() -> CompileSettings {
    let mut settings = CompileSettings::default();
    settings.min_region_area = 10;
    settings
}

#[test]
fn uniform_map_is_one_region() {
    let input = MapInput::open("open", 10, 10);
    let model = MapModel::compile(&input, &CompileSettings::default()).unwrap();
    assert_eq!(model.regions().len(), 1);
    assert!(model.chokes().is_empty());
}

#[test]
fn corridor_decomposition_and_connectivity() {
    let model = MapModel::compile(&corridor_input(), &corridor_settings()).unwrap();

    let regions = model.regions();
    assert_eq!(regions.len(), 2);
    assert_eq!(model.chokes().len(), 1);

    // Each base location landed in its own region.
    for region in &regions {
        match &model.area(*region).kind {
            AreaKind::Region { bases, .. } => assert_eq!(bases.len(), 1),
            _ => unreachable!(),
        }
    }

    // Exactly one region-level route, and it is direct.
    let paths = model.region_connectivity_all_paths(regions[0], regions[1], &[]);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].first(), Some(&regions[0]));
    assert_eq!(paths[0].last(), Some(&regions[1]));

    // Excluding either endpoint kills the route.
    assert!(model
        .region_connectivity_all_paths(regions[0], regions[1], &[regions[1]])
        .is_empty());
}

#[test]
fn ground_path_crosses_the_choke() {
    let mut model = MapModel::compile(&corridor_input(), &corridor_settings()).unwrap();
    let grid = model.ground_grid(1.0);
    let path = model
        .pathfind(
            &grid,
            Location::from_coords(2, 4),
            Location::from_coords(12, 4),
            &PathOptions::default(),
        )
        .unwrap();

    let choke = model.chokes()[0];
    assert!(
        path.iter()
            .any(|p| model.area(choke).geometry.contains_location(*p)),
        "path between the rooms must pass through the choke"
    );

    // Every path tile resolves to at least one area, regions first.
    for p in &path {
        let hits = model.where_all(*p);
        assert!(!hits.is_empty());
        let mut seen_choke = false;
        for id in &hits {
            if model.area(*id).is_choke() {
                seen_choke = true;
            } else {
                assert!(!seen_choke, "region listed after a choke at {:?}", p);
            }
        }
    }
}

#[test]
fn safe_cost_stamping_never_drops_below_one() {
    let model = MapModel::compile(&corridor_input(), &corridor_settings()).unwrap();
    let mut grid = model.ground_grid(1.0);
    cost::add_cost(&mut grid, (3.0, 4.0), 4.0, -10.0, true, 0.0);
    for (_, w) in grid.iter() {
        if w.is_finite() {
            assert!(*w >= 1.0);
        }
    }
}

#[test]
fn lowest_cost_points_cover_uniform_disk() {
    let model = MapModel::compile(&MapInput::open("open", 10, 10), &CompileSettings::default())
        .unwrap();
    let grid = model.clean_air_grid(1.0);
    let points = model.find_lowest_cost_points(&grid, (5.0, 5.0), 1.0);
    // Center plus cardinal neighbors on a uniform grid.
    assert_eq!(points.len(), 5);
}

#[test]
fn recompilation_is_deterministic() {
    let input = corridor_input();
    let settings = corridor_settings();
    let a = MapModel::compile(&input, &settings).unwrap();
    let b = MapModel::compile(&input, &settings).unwrap();

    assert_eq!(a.regions(), b.regions());
    assert_eq!(a.chokes(), b.chokes());
    for (id, area) in a.arena().iter() {
        let other = b.area(id);
        assert_eq!(area.bordering, other.bordering);
        assert_eq!(area.geometry.area(), other.geometry.area());
        assert_eq!(area.geometry.center(), other.geometry.center());
    }
}

#[test]
fn compiled_model_round_trips_through_serde() {
    let model = MapModel::compile(&corridor_input(), &corridor_settings()).unwrap();
    let encoded = serde_json::to_string(&model).unwrap();
    let mut decoded: map_surveyor::MapModel = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded.map_name(), model.map_name());
    assert_eq!(decoded.generation(), model.generation());
    assert_eq!(decoded.regions(), model.regions());
    assert_eq!(decoded.chokes(), model.chokes());

    let regions = decoded.regions();
    assert_eq!(
        decoded.region_connectivity_all_paths(regions[0], regions[1], &[]),
        model.region_connectivity_all_paths(regions[0], regions[1], &[])
    );
    // Queries work on the reloaded model; its memoization starts empty.
    assert!(!decoded.where_all(Location::from_coords(2, 4)).is_empty());
}
