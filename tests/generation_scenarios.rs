//! Integration tests for the single-biome and composite generators.

use strata::{
    largest_component_share, shortest_path, walkable_components, CompositeGenerator, GenerationParams, Generator,
    GeneratorKind, Grid, MazeGenerator, RoomType, StrataError,
};

fn assert_same_grid(a: &Grid, b: &Grid) {
    assert_eq!(a.tiles(), b.tiles());
    assert_eq!(a.rooms, b.rooms);
    assert_eq!(a.stairs_up, b.stairs_up);
    assert_eq!(a.stairs_down, b.stairs_down);
}

fn params_for(kind: GeneratorKind) -> GenerationParams {
    match kind {
        GeneratorKind::Composite => GenerationParams::new("fantasy").with_size(80, 60),
        _ => GenerationParams::new("fantasy").with_size(60, 40),
    }
}

/// Every generator reproduces its output exactly for the same seed.
#[test]
fn test_all_generators_are_deterministic() {
    let kinds = [
        GeneratorKind::Bsp,
        GeneratorKind::Cellular,
        GeneratorKind::Maze,
        GeneratorKind::Forest,
        GeneratorKind::City,
        GeneratorKind::Composite,
    ];
    for kind in kinds {
        let params = params_for(kind);
        let first = kind.generate(2024, &params).expect("first generation failed");
        let second = kind.generate(2024, &params).expect("second generation failed");
        assert_same_grid(&first, &second);
        assert_eq!(first.generator, kind.name());
    }
}

/// Different seeds give different maps.
#[test]
fn test_seed_changes_output() {
    let params = params_for(GeneratorKind::Cellular);
    let a = GeneratorKind::Cellular.generate(1, &params).unwrap();
    let b = GeneratorKind::Cellular.generate(2, &params).unwrap();
    assert_ne!(a.tiles(), b.tiles());
}

/// Every generator passes its own validation and leaves accessible stairs.
#[test]
fn test_generated_grids_validate() {
    for kind in GeneratorKind::SINGLE_BIOME.into_iter().chain([GeneratorKind::Composite]) {
        for seed in [3, 17, 256] {
            let grid = kind.generate(seed, &params_for(kind)).unwrap();
            kind.validate(&grid)
                .unwrap_or_else(|err| panic!("{kind} seed {seed} failed validation: {err}"));
            for pos in grid.all_stairs() {
                assert!(grid.has_exit(pos), "{kind} seed {seed}: stair at {pos:?} is stranded");
            }
        }
    }
}

#[test]
fn test_bsp_reproducibility_scenario() {
    let params = GenerationParams::new("fantasy").with_size(40, 30);
    let first = GeneratorKind::Bsp.generate(12345, &params).unwrap();
    let second = GeneratorKind::Bsp.generate(12345, &params).unwrap();

    assert_same_grid(&first, &second);
    assert!(!first.rooms.is_empty());
    assert_eq!(first.rooms.first().map(|room| room.room_type), Some(RoomType::Spawn));
    assert_eq!(first.rooms.last().map(|room| room.room_type), Some(RoomType::Exit));
}

#[test]
fn test_cellular_connectivity_scenario() {
    let mut params = GenerationParams::new("fantasy").with_size(80, 50);
    params.custom.fill_probability = Some(0.4);
    params.custom.iterations = Some(5);
    let grid = GeneratorKind::Cellular.generate(1, &params).unwrap();

    assert_eq!(walkable_components(&grid).len(), 1);
    assert!(grid.walkable_ratio() >= 0.3);
}

#[test]
fn test_composite_stitching_scenario() {
    let mut params = GenerationParams::new("fantasy").with_size(100, 80);
    params.custom.biome_count = Some(3);
    let map = CompositeGenerator::new().generate_detailed(7, &params).unwrap();

    assert_eq!(map.partition.regions.len(), 3);
    for (index, a) in map.biomes.iter().enumerate() {
        assert!(map.biomes[index + 1..].iter().all(|b| b != a));
    }
    assert!(!map.transition_tiles.is_empty());
    assert!(largest_component_share(&map.grid) >= 0.9);
    assert!(map.grid.walkable_ratio() >= 0.25);
}

/// Two- and four-region composites partition fully, use distinct biomes and
/// stay connected from the first region's stair to the last region's.
#[test]
fn test_composite_biome_count_extremes() {
    let generator = CompositeGenerator::new();
    for biome_count in [2u32, 4] {
        for seed in [7, 31] {
            let mut params = GenerationParams::new("fantasy").with_size(100, 80);
            params.custom.biome_count = Some(biome_count);
            let map = generator.generate_detailed(seed, &params).unwrap();

            assert_eq!(map.partition.regions.len(), biome_count as usize);
            assert_eq!(map.biomes.len(), biome_count as usize);
            let mut distinct = map.biomes.clone();
            distinct.sort();
            distinct.dedup();
            assert_eq!(distinct.len(), biome_count as usize);
            let owned: usize = map.partition.regions.iter().map(|region| region.tiles.len()).sum();
            assert_eq!(owned, 100 * 80);

            generator
                .validate(&map.grid)
                .unwrap_or_else(|err| panic!("{biome_count} biomes, seed {seed}: {err}"));
            assert!(largest_component_share(&map.grid) >= 0.9);
            let up = map.grid.stairs_up[0];
            let down = map.grid.stairs_down[0];
            assert!(shortest_path(&map.grid, up, down).is_some());
        }
    }
}

#[test]
fn test_maze_odd_dimension_normalization() {
    let generator = MazeGenerator::new();
    let grid = generator
        .generate(5, &GenerationParams::new("horror").with_size(40, 30))
        .unwrap();
    assert_eq!((grid.width(), grid.height()), (41, 31));

    let grid = generator
        .generate(5, &GenerationParams::new("horror").with_size(41, 31))
        .unwrap();
    assert_eq!((grid.width(), grid.height()), (41, 31));
}

#[test]
fn test_dimension_rejection() {
    let cases: [(GeneratorKind, i64, i64); 9] = [
        (GeneratorKind::Bsp, 0, 30),
        (GeneratorKind::Cellular, 40, -5),
        (GeneratorKind::Maze, 10_001, 30),
        (GeneratorKind::Maze, 10_000, 5),
        (GeneratorKind::Forest, 1_001, 30),
        (GeneratorKind::City, 80, 1_001),
        (GeneratorKind::Composite, 59, 40),
        (GeneratorKind::Composite, 60, 39),
        (GeneratorKind::Composite, 501, 100),
    ];
    for (kind, width, height) in cases {
        let params = GenerationParams::new("fantasy").with_size(width, height);
        assert!(
            matches!(kind.generate(1, &params), Err(StrataError::InvalidConfig(_))),
            "{kind} accepted {width}x{height}"
        );
    }
}
