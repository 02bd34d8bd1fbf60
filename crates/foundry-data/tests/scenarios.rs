//! Loading the scenario fixtures under `tests/fixtures/`.

use foundry_core::building::BuildingKind;
use foundry_core::event::{Event, EventKind};
use foundry_core::grid::GridSize;
use foundry_core::item::ResourceType;
use foundry_core::test_utils::*;
use foundry_core::world::LayoutError;
use foundry_data::{DataLoadError, load_scenario, load_simulation};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn mixed_format_scenario_loads() {
    let scenario = load_scenario(&fixture("line")).unwrap();
    assert_eq!(scenario.config.starting_balance, 100);
    assert_eq!(scenario.config.cost(BuildingKind::Furnace), 8);
    assert_eq!(scenario.layout.resource_nodes.len(), 2);
    assert_eq!(scenario.layout.water_sources.len(), 2);
    assert_eq!(scenario.placements.len(), 7);
}

#[test]
fn built_scenario_pays_for_its_placements() {
    let sim = load_simulation(&fixture("line")).unwrap();
    assert_eq!(sim.building_count(), 7);
    // 10 + 1 + 8 + 15 + 5 + 10 + 15
    assert_eq!(sim.balance(), 100 - 64);
    assert_eq!(sim.grid().resource_at(pos(0, 0)), Some(ResourceType::Iron));
}

#[test]
fn built_scenario_runs_with_configured_forge_mode() {
    let mut sim = load_simulation(&fixture("line")).unwrap();
    run(&mut sim, 1);
    assert!(sim.has_water(pos(1, 3)));

    run(&mut sim, 60);
    let first_sale = sim
        .event_bus
        .events(EventKind::ItemSold)
        .find_map(|e| match e {
            Event::ItemSold { value, .. } => Some(*value),
            _ => None,
        });
    // Iron ore 2, ingot 3, bolt 4.
    assert_eq!(first_sale, Some(4));
    assert!(sim.balance() > 36);
}

#[test]
fn config_alone_is_enough() {
    let scenario = load_scenario(&fixture("minimal")).unwrap();
    assert_eq!(scenario.config.grid, GridSize::new(10, 5));
    assert!(scenario.layout.resource_nodes.is_empty());
    assert!(scenario.placements.is_empty());

    let sim = scenario.build().unwrap();
    assert_eq!(sim.balance(), 40);
    assert_eq!(sim.building_count(), 0);
}

#[test]
fn conflicting_config_files_are_rejected() {
    let err = load_scenario(&fixture("conflict")).unwrap_err();
    assert!(matches!(err, DataLoadError::ConflictingFormats { .. }));
}

#[test]
fn missing_directory_reports_missing_config() {
    let err = load_scenario(&fixture("does_not_exist")).unwrap_err();
    assert!(matches!(err, DataLoadError::MissingRequired { .. }));
}

#[test]
fn refused_placement_names_the_building() {
    let err = load_simulation(&fixture("bad_placement")).unwrap_err();
    match err {
        DataLoadError::Placement { kind, position, .. } => {
            assert_eq!(kind, BuildingKind::Miner);
            assert_eq!(position, pos(5, 5));
        }
        other => panic!("expected a placement error, got {other}"),
    }
}

#[test]
fn overlapping_terrain_is_rejected() {
    let err = load_scenario(&fixture("bad_world")).unwrap_err();
    assert!(matches!(err, DataLoadError::Layout(LayoutError::Conflict(p)) if p == pos(2, 2)));
}
