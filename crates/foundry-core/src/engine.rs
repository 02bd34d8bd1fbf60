//! The simulation: owns the grid, every building, the ledger and the clock,
//! and runs the per-step pipeline.
//!
//! # Step pipeline
//!
//! Each [`Simulation::step`] runs:
//! 1. **Water** -- recompute every building's `has_water` flag from scratch
//! 2. **Buildings** -- in row-major order, each building advances its own
//!    production and then offers its output item to its neighbors
//! 3. **Bookkeeping** -- advance the clock, compute the state hash and
//!    deliver the step's events
//!
//! # Commands
//!
//! Placement, removal, rotation, moves and the debug spawner are
//! all-or-nothing: on any error the simulation is left untouched. Their
//! events are delivered immediately.

use crate::building::{Accepted, Building, BuildingKind, ForgeMode, Machine, Rejection, TickContext};
use crate::config::SimConfig;
use crate::economy::{Credits, Ledger};
use crate::event::{Event, EventBus, EventKind, PassiveListener};
use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, Grid, GridError, GridPosition};
use crate::id::{BuildingId, ItemId};
use crate::item::{Item, ItemIds, ResourceType};
use crate::query::BuildingSnapshot;
use crate::sim::{SimState, StateHash};
use crate::water;
use crate::world::{LayoutError, WorldLayout};
use slotmap::SlotMap;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("position {0} is outside the grid")]
    OutOfBounds(GridPosition),
    #[error("cell {0} is already occupied")]
    CellOccupied(GridPosition),
    #[error("{kind} cannot stand at {position}: water-source mismatch")]
    InvalidWaterAffinity {
        kind: BuildingKind,
        position: GridPosition,
    },
    #[error("no resource node at {0}")]
    NoResourceNode(GridPosition),
    #[error("{kind} costs {cost}, balance is {balance}")]
    InsufficientFunds {
        kind: BuildingKind,
        cost: Credits,
        balance: Credits,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("no building at {0}")]
    EmptyCell(GridPosition),
    #[error("position {0} is outside the grid")]
    OutOfBounds(GridPosition),
    #[error("cell {0} is already occupied")]
    CellOccupied(GridPosition),
    #[error("{kind} cannot stand at {position}: water-source mismatch")]
    InvalidWaterAffinity {
        kind: BuildingKind,
        position: GridPosition,
    },
    #[error("no resource node at {0}")]
    NoResourceNode(GridPosition),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RotateError {
    #[error("no building at {0}")]
    EmptyCell(GridPosition),
    #[error("{kind} at {position} cannot be rotated")]
    NotRotatable {
        kind: BuildingKind,
        position: GridPosition,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("no building at {0}")]
    EmptyCell(GridPosition),
    #[error("items can only be spawned onto conveyors, found {kind} at {position}")]
    NotAConveyor {
        kind: BuildingKind,
        position: GridPosition,
    },
    #[error("conveyor refused the item: {0}")]
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigureError {
    #[error("no building at {0}")]
    EmptyCell(GridPosition),
    #[error("{kind} at {position} is not a forge")]
    NotAForge {
        kind: BuildingKind,
        position: GridPosition,
    },
}

impl PlacementError {
    fn from_grid(kind: BuildingKind, err: GridError) -> Self {
        match err {
            GridError::OutOfBounds(pos) => PlacementError::OutOfBounds(pos),
            GridError::Occupied(pos) | GridError::Vacant(pos) => PlacementError::CellOccupied(pos),
            GridError::WaterAffinity { position } => {
                PlacementError::InvalidWaterAffinity { kind, position }
            }
        }
    }
}

impl MoveError {
    fn from_grid(kind: BuildingKind, err: GridError) -> Self {
        match err {
            GridError::OutOfBounds(pos) => MoveError::OutOfBounds(pos),
            GridError::Occupied(pos) => MoveError::CellOccupied(pos),
            GridError::Vacant(pos) => MoveError::EmptyCell(pos),
            GridError::WaterAffinity { position } => {
                MoveError::InvalidWaterAffinity { kind, position }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A complete factory simulation, owned by the host application.
#[derive(Debug)]
pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) grid: Grid,
    pub(crate) buildings: SlotMap<BuildingId, Building>,
    pub(crate) ledger: Ledger,
    pub(crate) sim_state: SimState,
    pub(crate) item_ids: ItemIds,
    pub(crate) last_state_hash: u64,
    /// Typed event bus for simulation events.
    pub event_bus: EventBus,
}

impl Simulation {
    /// An empty world: no resource nodes, no water.
    pub fn new(config: SimConfig) -> Self {
        Self {
            grid: Grid::new(config.grid),
            buildings: SlotMap::with_key(),
            ledger: Ledger::new(config.starting_balance),
            sim_state: SimState::new(),
            item_ids: ItemIds::new(),
            last_state_hash: 0,
            event_bus: EventBus::default(),
            config,
        }
    }

    pub fn with_layout(config: SimConfig, layout: &WorldLayout) -> Result<Self, LayoutError> {
        let mut sim = Self::new(config);
        layout.apply(&mut sim.grid)?;
        debug!(
            target: "sim.place",
            nodes = layout.resource_nodes.len(),
            water = layout.water_sources.len(),
            "world layout applied"
        );
        Ok(sim)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Build `kind` at `position`, paying its cost. Nothing changes on error.
    pub fn place_building(
        &mut self,
        kind: BuildingKind,
        position: GridPosition,
        rotation: Direction,
    ) -> Result<BuildingId, PlacementError> {
        let result = self.try_place(kind, position, rotation);
        match &result {
            Ok(_) => debug!(
                target: "sim.place",
                %kind,
                %position,
                balance = self.ledger.balance(),
                "building placed"
            ),
            Err(err) => debug!(target: "sim.place", %kind, %position, %err, "placement rejected"),
        }
        self.event_bus.deliver();
        result
    }

    fn try_place(
        &mut self,
        kind: BuildingKind,
        position: GridPosition,
        rotation: Direction,
    ) -> Result<BuildingId, PlacementError> {
        let water_only = kind.requires_water_source();
        self.grid
            .check_place(position, water_only)
            .map_err(|e| PlacementError::from_grid(kind, e))?;
        let node = self.grid.resource_at(position);
        let building = Building::new(kind, position, rotation, &self.config, node)
            .ok_or(PlacementError::NoResourceNode(position))?;
        let cost = building.cost();
        if !self.ledger.can_afford(cost) {
            return Err(PlacementError::InsufficientFunds {
                kind,
                cost,
                balance: self.ledger.balance(),
            });
        }

        let id = self.buildings.insert(building);
        if let Err(err) = self.grid.place(position, id, water_only) {
            self.buildings.remove(id);
            return Err(PlacementError::from_grid(kind, err));
        }
        let spent = self.ledger.try_spend(cost);
        debug_assert!(spent, "affordability checked above");

        let tick = self.sim_state.tick;
        self.event_bus.emit(Event::BuildingPlaced {
            building: id,
            kind,
            position,
            tick,
        });
        if cost > 0 {
            self.emit_funds_changed(-(cost as i64));
        }
        Ok(id)
    }

    /// Demolish the building at `position`, destroying anything it holds
    /// and refunding its placement cost. `None` for an empty cell.
    pub fn remove_building(&mut self, position: GridPosition) -> Option<Credits> {
        let id = self.grid.remove(position)?;
        let Some(mut building) = self.buildings.remove(id) else {
            debug_assert!(false, "grid referenced a missing building at {position}");
            return None;
        };
        let tick = self.sim_state.tick;
        for item in building.take_items() {
            self.event_bus.emit(Event::ItemDestroyed {
                item: item.id,
                position,
                tick,
            });
        }

        let refund = building.cost();
        self.ledger.credit(refund);
        self.event_bus.emit(Event::BuildingRemoved {
            building: id,
            kind: building.kind(),
            position,
            refund,
            tick,
        });
        if refund > 0 {
            self.emit_funds_changed(refund as i64);
        }
        debug!(
            target: "sim.place",
            kind = %building.kind(),
            %position,
            refund,
            "building removed"
        );
        self.event_bus.deliver();
        Some(refund)
    }

    /// Turn the building at `position` 90 degrees clockwise.
    pub fn rotate_building(&mut self, position: GridPosition) -> Result<(), RotateError> {
        let id = self
            .grid
            .get(position)
            .ok_or(RotateError::EmptyCell(position))?;
        let building = self
            .buildings
            .get_mut(id)
            .ok_or(RotateError::EmptyCell(position))?;
        if !building.rotate_clockwise() {
            return Err(RotateError::NotRotatable {
                kind: building.kind(),
                position,
            });
        }
        let rotation = building.rotation();
        self.event_bus.emit(Event::BuildingRotated {
            building: id,
            position,
            rotation,
            tick: self.sim_state.tick,
        });
        self.event_bus.deliver();
        Ok(())
    }

    /// Relocate the building at `from` to the empty cell `to`, keeping its
    /// rotation and held items. Moving onto itself is a no-op.
    pub fn move_building(&mut self, from: GridPosition, to: GridPosition) -> Result<(), MoveError> {
        let id = self.grid.get(from).ok_or(MoveError::EmptyCell(from))?;
        if from == to {
            return Ok(());
        }
        let kind = self
            .buildings
            .get(id)
            .map(Building::kind)
            .ok_or(MoveError::EmptyCell(from))?;
        let water_only = kind.requires_water_source();
        self.grid
            .check_place(to, water_only)
            .map_err(|e| MoveError::from_grid(kind, e))?;
        let node = self.grid.resource_at(to);
        if kind.requires_resource_node() && node.is_none() {
            return Err(MoveError::NoResourceNode(to));
        }
        self.grid
            .move_building(from, to, water_only)
            .map_err(|e| MoveError::from_grid(kind, e))?;
        if let Some(building) = self.buildings.get_mut(id) {
            building.relocate(to, node);
        }

        self.event_bus.emit(Event::BuildingMoved {
            building: id,
            from,
            to,
            tick: self.sim_state.tick,
        });
        debug!(target: "sim.place", %kind, %from, %to, "building moved");
        self.event_bus.deliver();
        Ok(())
    }

    /// Choose what the forge at `position` makes. A buffered ingot is
    /// forged with whatever mode is set when its cycle completes.
    pub fn set_forge_mode(
        &mut self,
        position: GridPosition,
        mode: ForgeMode,
    ) -> Result<(), ConfigureError> {
        let building = self
            .grid
            .get(position)
            .and_then(|id| self.buildings.get_mut(id))
            .ok_or(ConfigureError::EmptyCell(position))?;
        if !building.set_forge_mode(mode) {
            return Err(ConfigureError::NotAForge {
                kind: building.kind(),
                position,
            });
        }
        debug!(target: "sim.place", %position, ?mode, "forge mode set");
        Ok(())
    }

    /// Debug spawner: put a fresh ore of `resource` on the conveyor at
    /// `position`.
    pub fn spawn_item(
        &mut self,
        position: GridPosition,
        resource: ResourceType,
    ) -> Result<ItemId, SpawnError> {
        let building = self
            .grid
            .get(position)
            .and_then(|id| self.buildings.get_mut(id))
            .ok_or(SpawnError::EmptyCell(position))?;
        if building.kind() != BuildingKind::Conveyor {
            return Err(SpawnError::NotAConveyor {
                kind: building.kind(),
                position,
            });
        }
        let ore = Item::ore(self.item_ids.peek(), resource);
        building.check_accept(&ore).map_err(SpawnError::Rejected)?;
        let id = self.item_ids.next_id();
        debug_assert_eq!(id, ore.id);
        if building.accept(ore).is_err() {
            debug_assert!(false, "conveyor refused a checked item");
        }

        self.event_bus.emit(Event::ItemCreated {
            item: id,
            position,
            tick: self.sim_state.tick,
        });
        self.event_bus.deliver();
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Event system
    // -----------------------------------------------------------------------

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.event_bus.suppress(kind);
    }

    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.event_bus.on_passive(kind, listener);
    }

    fn emit_funds_changed(&mut self, delta: i64) {
        self.event_bus.emit(Event::FundsChanged {
            balance: self.ledger.balance(),
            delta,
            tick: self.sim_state.tick,
        });
    }

    // -----------------------------------------------------------------------
    // Step
    // -----------------------------------------------------------------------

    /// Advance the world by `dt` seconds. Negative durations are treated as
    /// zero.
    pub fn step(&mut self, dt: Fixed64) {
        let dt = dt.max(Fixed64::ZERO);
        let tick = self.sim_state.tick;

        // Phase 1: water.
        self.phase_water(tick);

        // Phase 2: buildings, row-major.
        let order: Vec<(GridPosition, BuildingId)> = self.grid.occupied().collect();
        for (position, id) in order {
            self.tick_building(id, position, dt, tick);
        }

        // Phase 3: bookkeeping.
        self.sim_state.advance(dt);
        self.last_state_hash = self.compute_state_hash();
        let delivered = self.event_bus.pending_count();
        self.event_bus.deliver();
        trace!(
            target: "sim.tick",
            tick,
            delivered,
            balance = self.ledger.balance(),
            items = self.item_count(),
            "step complete"
        );
    }

    fn phase_water(&mut self, tick: Ticks) {
        for change in water::propagate(&self.grid, &mut self.buildings) {
            debug!(
                target: "sim.water",
                position = %change.position,
                has_water = change.has_water,
                "water state changed"
            );
            self.event_bus.emit(Event::WaterStateChanged {
                position: change.position,
                has_water: change.has_water,
                tick,
            });
        }
    }

    fn tick_building(&mut self, id: BuildingId, position: GridPosition, dt: Fixed64, tick: Ticks) {
        let Some(building) = self.buildings.get_mut(id) else {
            return;
        };
        let mut ctx = TickContext {
            dt,
            tick,
            position,
            config: &self.config,
            item_ids: &mut self.item_ids,
            events: &mut self.event_bus,
        };
        building.advance(&mut ctx);
        self.flush_output(id, position, tick);
    }

    /// Offer the building's output item to its candidate neighbors in
    /// order. The first that accepts takes ownership.
    fn flush_output(&mut self, id: BuildingId, position: GridPosition, tick: Ticks) {
        let Some(building) = self.buildings.get(id) else {
            return;
        };
        let candidates = building.output_candidates();
        let Some(item) = building.output() else {
            return;
        };
        let target = candidates.iter().enumerate().find_map(|(probe, &dir)| {
            let neighbor_id = self.grid.neighbor(position, dir)?;
            let neighbor = self.buildings.get(neighbor_id)?;
            neighbor
                .can_accept(Some(item))
                .then_some((probe, position.step(dir), neighbor_id))
        });

        let Some((probe, to, neighbor_id)) = target else {
            if !candidates.is_empty() {
                if let Some(building) = self.buildings.get_mut(id) {
                    building.on_output_blocked();
                }
            }
            return;
        };

        let Some(item) = self.buildings.get_mut(id).and_then(|b| b.output.take()) else {
            return;
        };
        let item_id = item.id;
        let Some(neighbor) = self.buildings.get_mut(neighbor_id) else {
            return;
        };
        match neighbor.accept(item) {
            Ok(Accepted::Stored) => self.event_bus.emit(Event::ItemMoved {
                item: item_id,
                from: position,
                to,
                tick,
            }),
            Ok(Accepted::Sold(item)) => self.sell(item, to, tick),
            Err(item) => {
                debug_assert!(false, "neighbor at {to} refused a checked item");
                if let Some(building) = self.buildings.get_mut(id) {
                    building.output = Some(item);
                }
                return;
            }
        }
        if let Some(building) = self.buildings.get_mut(id) {
            building.on_output_sent(probe);
        }
    }

    fn sell(&mut self, item: Item, position: GridPosition, tick: Ticks) {
        let value = item.value as Credits;
        self.ledger.credit(value);
        self.event_bus.emit(Event::ItemSold {
            item: item.id,
            position,
            value: item.value,
            tick,
        });
        self.event_bus.emit(Event::FundsChanged {
            balance: self.ledger.balance(),
            delta: value as i64,
            tick,
        });
        trace!(
            target: "sim.economy",
            item = %item.id,
            value,
            balance = self.ledger.balance(),
            "item sold"
        );
    }

    fn compute_state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        hash.write_fixed64(self.sim_state.elapsed);
        hash.write_u64(self.ledger.balance());
        hash.write_u64(self.ledger.total_spent());
        hash.write_u64(self.ledger.total_credited());
        hash.write_u64(self.item_ids.issued());
        for (position, id) in self.grid.occupied() {
            let Some(building) = self.buildings.get(id) else {
                continue;
            };
            hash.write_i32(position.x);
            hash.write_i32(position.y);
            hash.write_u32(building.kind() as u32);
            hash.write_u32(building.rotation() as u32);
            hash.write(&[building.has_water() as u8]);
            hash.write_fixed64(building.progress(&self.config));
            if let Machine::Splitter(splitter) = building.machine() {
                hash.write(&[splitter.cursor()]);
            }
            for item in building.held_items() {
                hash.write_item(item);
            }
        }
        hash.finish()
    }

    // -----------------------------------------------------------------------
    // Query API (read-only)
    // -----------------------------------------------------------------------

    pub fn building_at(&self, position: GridPosition) -> Option<&Building> {
        self.grid.get(position).and_then(|id| self.buildings.get(id))
    }

    pub fn building_id_at(&self, position: GridPosition) -> Option<BuildingId> {
        self.grid.get(position)
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    /// The item in the output slot of the building at `position`.
    pub fn item_at(&self, position: GridPosition) -> Option<&Item> {
        self.building_at(position).and_then(Building::output)
    }

    pub fn has_water(&self, position: GridPosition) -> bool {
        self.building_at(position).is_some_and(Building::has_water)
    }

    pub fn balance(&self) -> Credits {
        self.ledger.balance()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Every live item, wherever it is held.
    pub fn item_count(&self) -> usize {
        self.buildings.values().map(Building::held_count).sum()
    }

    /// Placed buildings in row-major order.
    pub fn buildings(&self) -> impl Iterator<Item = (BuildingId, &Building)> + '_ {
        self.grid
            .occupied()
            .filter_map(|(_, id)| self.buildings.get(id).map(|b| (id, b)))
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn snapshot_building(&self, position: GridPosition) -> Option<BuildingSnapshot> {
        let id = self.grid.get(position)?;
        let building = self.buildings.get(id)?;
        Some(BuildingSnapshot::capture(id, building, &self.config))
    }

    /// Snapshots of every building, row-major.
    pub fn snapshot_all(&self) -> Vec<BuildingSnapshot> {
        self.buildings()
            .map(|(id, building)| BuildingSnapshot::capture(id, building, &self.config))
            .collect()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    /// Seconds simulated so far.
    pub fn elapsed(&self) -> Fixed64 {
        self.sim_state.elapsed
    }

    /// The hash computed at the end of the most recent step.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }
}
