//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::building::{Accepted, BuildingKind};
use crate::config::SimConfig;
use crate::engine::Simulation;
use crate::fixed::Fixed64;
use crate::grid::{Direction, GridPosition};
use crate::item::{Item, ItemForm, ResourceType};
use crate::world::WorldLayout;

// ===========================================================================
// Scalars
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn pos(x: i32, y: i32) -> GridPosition {
    GridPosition::new(x, y)
}

/// Step length used throughout the tests. A quarter second keeps every
/// default timing an exact multiple.
pub const DT: f64 = 0.25;

// ===========================================================================
// Simulation setup
// ===========================================================================

/// Default config with enough money that placement never runs dry.
pub fn rich_config() -> SimConfig {
    SimConfig {
        starting_balance: 1_000_000,
        ..SimConfig::default()
    }
}

pub fn rich_sim() -> Simulation {
    Simulation::new(rich_config())
}

/// Run `steps` steps of [`DT`] seconds.
pub fn run(sim: &mut Simulation, steps: u32) {
    for _ in 0..steps {
        sim.step(fixed(DT));
    }
}

/// Place a row of buildings left to right starting at `(x, y)`.
pub fn place_row(
    sim: &mut Simulation,
    x: i32,
    y: i32,
    kinds: &[(BuildingKind, Direction)],
) {
    for (offset, &(kind, rotation)) in kinds.iter().enumerate() {
        sim.place_building(kind, pos(x + offset as i32, y), rotation)
            .unwrap_or_else(|e| panic!("placing {kind} at ({}, {y}): {e}", x + offset as i32));
    }
}

/// Fluent [`WorldLayout`] construction.
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    layout: WorldLayout,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, x: i32, y: i32, resource: ResourceType) -> Self {
        self.layout.resource_nodes.push((pos(x, y), resource));
        self
    }

    pub fn water(mut self, x: i32, y: i32) -> Self {
        self.layout.water_sources.push(pos(x, y));
        self
    }

    pub fn build(self) -> WorldLayout {
        self.layout
    }
}

// ===========================================================================
// Item injection
// ===========================================================================

/// Mint an item with a fresh id from the simulation's counter.
pub fn mint(sim: &mut Simulation, resource: ResourceType, form: ItemForm, value: u32) -> Item {
    Item {
        id: sim.item_ids.next_id(),
        resource,
        secondary_resource: None,
        form,
        value,
        is_washed: false,
    }
}

/// Hand `item` straight to the building at `position`, bypassing belts.
/// Items given to a seller vanish without crediting the ledger.
pub fn give(sim: &mut Simulation, position: GridPosition, item: Item) -> Result<(), Item> {
    let Some(id) = sim.grid.get(position) else {
        return Err(item);
    };
    match sim.buildings.get_mut(id) {
        Some(building) => building.accept(item).map(|_: Accepted| ()),
        None => Err(item),
    }
}
