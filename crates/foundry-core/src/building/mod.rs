//! Buildings: the thirteen kinds, their shared state and per-kind behavior.
//!
//! Every building answers the same contract: can it take this item, take
//! it, advance one tick, and offer its output to neighbors. Kind-specific
//! behavior lives in the [`Machine`] variant and is dispatched with plain
//! `match` statements.
//!
//! Each building owns at most one item in its output slot plus whatever its
//! machine buffers internally. The engine moves items between buildings
//! through [`Building::accept`] and the output-slot hooks; nothing else
//! creates or destroys items.

mod conveyor;
mod fluid;
mod miner;
mod processing;
mod splitter;

pub use conveyor::Conveyor;
pub use miner::Miner;
pub use processing::{AlloyFurnace, CraftingTable, Forge, ForgeMode, Refiner};
pub use splitter::Splitter;

use crate::config::SimConfig;
use crate::economy::Credits;
use crate::event::EventBus;
use crate::fixed::{Fixed64, Ticks, unit_fraction};
use crate::grid::{Direction, Directions, GridPosition};
use crate::item::{Item, ItemIds, ResourceType};
use processing::Refinement;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The placeable building kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    Conveyor,
    Furnace,
    AlloyFurnace,
    Forge,
    Miner,
    Splitter,
    Seller,
    CraftingTable,
    WaterPump,
    StraightPipe,
    CornerPipe,
    CrossPipe,
    OreWasher,
}

impl BuildingKind {
    pub fn all() -> [BuildingKind; 13] {
        [
            BuildingKind::Conveyor,
            BuildingKind::Furnace,
            BuildingKind::AlloyFurnace,
            BuildingKind::Forge,
            BuildingKind::Miner,
            BuildingKind::Splitter,
            BuildingKind::Seller,
            BuildingKind::CraftingTable,
            BuildingKind::WaterPump,
            BuildingKind::StraightPipe,
            BuildingKind::CornerPipe,
            BuildingKind::CrossPipe,
            BuildingKind::OreWasher,
        ]
    }

    /// Symmetric kinds ignore rotation and always face north.
    pub fn is_rotatable(self) -> bool {
        !matches!(
            self,
            BuildingKind::Seller | BuildingKind::WaterPump | BuildingKind::CrossPipe
        )
    }

    /// Only pumps go on water-source cells, and only on them.
    pub fn requires_water_source(self) -> bool {
        self == BuildingKind::WaterPump
    }

    pub fn requires_resource_node(self) -> bool {
        self == BuildingKind::Miner
    }

    /// Kinds that carry water on to their neighbors.
    pub fn is_water_pass_through(self) -> bool {
        matches!(
            self,
            BuildingKind::WaterPump
                | BuildingKind::StraightPipe
                | BuildingKind::CornerPipe
                | BuildingKind::CrossPipe
        )
    }
}

impl std::fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildingKind::Conveyor => "conveyor",
            BuildingKind::Furnace => "furnace",
            BuildingKind::AlloyFurnace => "alloy furnace",
            BuildingKind::Forge => "forge",
            BuildingKind::Miner => "miner",
            BuildingKind::Splitter => "splitter",
            BuildingKind::Seller => "seller",
            BuildingKind::CraftingTable => "crafting table",
            BuildingKind::WaterPump => "water pump",
            BuildingKind::StraightPipe => "straight pipe",
            BuildingKind::CornerPipe => "corner pipe",
            BuildingKind::CrossPipe => "cross pipe",
            BuildingKind::OreWasher => "ore washer",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Acceptance
// ---------------------------------------------------------------------------

/// Why a building refused an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("building does not take items")]
    NotAccepting,
    #[error("no room for another item")]
    Full,
    #[error("cannot process {0:?}")]
    WrongForm(crate::item::ItemForm),
    #[error("item does not fit the recipe")]
    RecipeMismatch,
    #[error("ore is already washed")]
    AlreadyWashed,
}

/// Where an accepted item went.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    Stored,
    /// Sellers consume the item on the spot. The caller credits its value.
    Sold(Item),
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Per-kind state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Machine {
    Conveyor(Conveyor),
    Furnace(Refiner),
    AlloyFurnace(AlloyFurnace),
    Forge(Forge),
    Miner(Miner),
    Splitter(Splitter),
    Seller,
    CraftingTable(CraftingTable),
    WaterPump,
    StraightPipe,
    CornerPipe,
    CrossPipe,
    OreWasher(Refiner),
}

/// Everything a building may touch while it advances.
pub(crate) struct TickContext<'a> {
    pub dt: Fixed64,
    pub tick: Ticks,
    pub position: GridPosition,
    pub config: &'a SimConfig,
    pub item_ids: &'a mut ItemIds,
    pub events: &'a mut EventBus,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// A placed building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    position: GridPosition,
    rotation: Direction,
    pub(crate) output: Option<Item>,
    has_water: bool,
    /// What was paid at placement, refunded on removal.
    cost: Credits,
    machine: Machine,
}

impl Building {
    /// A fresh building with empty buffers. Miners need the resource of the
    /// node they sit on; `None` there yields `None`.
    pub fn new(
        kind: BuildingKind,
        position: GridPosition,
        rotation: Direction,
        config: &SimConfig,
        node: Option<ResourceType>,
    ) -> Option<Self> {
        let rotation = if kind.is_rotatable() {
            rotation
        } else {
            Direction::North
        };
        let machine = match kind {
            BuildingKind::Conveyor => Machine::Conveyor(Conveyor::default()),
            BuildingKind::Furnace => Machine::Furnace(Refiner::default()),
            BuildingKind::AlloyFurnace => Machine::AlloyFurnace(AlloyFurnace::default()),
            BuildingKind::Forge => Machine::Forge(Forge::default()),
            BuildingKind::Miner => Machine::Miner(Miner::new(node?)),
            BuildingKind::Splitter => Machine::Splitter(Splitter::default()),
            BuildingKind::Seller => Machine::Seller,
            BuildingKind::CraftingTable => Machine::CraftingTable(CraftingTable::new(
                config.max_plate_buffer,
                config.max_bolt_buffer,
            )),
            BuildingKind::WaterPump => Machine::WaterPump,
            BuildingKind::StraightPipe => Machine::StraightPipe,
            BuildingKind::CornerPipe => Machine::CornerPipe,
            BuildingKind::CrossPipe => Machine::CrossPipe,
            BuildingKind::OreWasher => Machine::OreWasher(Refiner::default()),
        };
        Some(Self {
            position,
            rotation,
            output: None,
            has_water: false,
            cost: config.cost(kind),
            machine,
        })
    }

    pub fn kind(&self) -> BuildingKind {
        match &self.machine {
            Machine::Conveyor(_) => BuildingKind::Conveyor,
            Machine::Furnace(_) => BuildingKind::Furnace,
            Machine::AlloyFurnace(_) => BuildingKind::AlloyFurnace,
            Machine::Forge(_) => BuildingKind::Forge,
            Machine::Miner(_) => BuildingKind::Miner,
            Machine::Splitter(_) => BuildingKind::Splitter,
            Machine::Seller => BuildingKind::Seller,
            Machine::CraftingTable(_) => BuildingKind::CraftingTable,
            Machine::WaterPump => BuildingKind::WaterPump,
            Machine::StraightPipe => BuildingKind::StraightPipe,
            Machine::CornerPipe => BuildingKind::CornerPipe,
            Machine::CrossPipe => BuildingKind::CrossPipe,
            Machine::OreWasher(_) => BuildingKind::OreWasher,
        }
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn rotation(&self) -> Direction {
        self.rotation
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn output(&self) -> Option<&Item> {
        self.output.as_ref()
    }

    pub fn has_water(&self) -> bool {
        self.has_water
    }

    pub fn cost(&self) -> Credits {
        self.cost
    }

    // -- Acceptance --

    /// Whether `item` would be taken right now, and why not.
    pub fn check_accept(&self, item: &Item) -> Result<(), Rejection> {
        match &self.machine {
            Machine::Conveyor(_) | Machine::Splitter(_) => {
                if self.output.is_some() {
                    Err(Rejection::Full)
                } else {
                    Ok(())
                }
            }
            Machine::Furnace(r) => r.check(Refinement::Smelt, item),
            Machine::Forge(f) => f.refiner.check(f.refinement(), item),
            Machine::OreWasher(r) => r.check(Refinement::Wash, item),
            Machine::AlloyFurnace(a) => a.check(item),
            Machine::CraftingTable(t) => t.check(item),
            Machine::Seller => Ok(()),
            Machine::Miner(_)
            | Machine::WaterPump
            | Machine::StraightPipe
            | Machine::CornerPipe
            | Machine::CrossPipe => Err(Rejection::NotAccepting),
        }
    }

    /// With an item: would this exact item be taken. Without: is there any
    /// room at all.
    pub fn can_accept(&self, item: Option<&Item>) -> bool {
        match item {
            Some(item) => self.check_accept(item).is_ok(),
            None => self.has_room(),
        }
    }

    fn has_room(&self) -> bool {
        match &self.machine {
            Machine::Conveyor(_) | Machine::Splitter(_) => self.output.is_none(),
            Machine::Furnace(r) | Machine::OreWasher(r) => r.input.is_none(),
            Machine::Forge(f) => f.refiner.input.is_none(),
            Machine::AlloyFurnace(a) => a.inputs.len() < AlloyFurnace::INPUTS,
            Machine::CraftingTable(t) => {
                t.plates.len() < t.max_plates as usize || t.bolts.len() < t.max_bolts as usize
            }
            Machine::Seller => true,
            Machine::Miner(_)
            | Machine::WaterPump
            | Machine::StraightPipe
            | Machine::CornerPipe
            | Machine::CrossPipe => false,
        }
    }

    /// Take ownership of `item`, or hand it back untouched when refused.
    pub fn accept(&mut self, item: Item) -> Result<Accepted, Item> {
        if self.check_accept(&item).is_err() {
            return Err(item);
        }
        match &mut self.machine {
            Machine::Conveyor(c) => {
                c.restart();
                self.output = Some(item);
            }
            Machine::Splitter(_) => self.output = Some(item),
            Machine::Furnace(r) | Machine::OreWasher(r) => r.store(item),
            Machine::Forge(f) => f.refiner.store(item),
            Machine::AlloyFurnace(a) => a.store(item),
            Machine::CraftingTable(t) => t.store(item),
            Machine::Seller => return Ok(Accepted::Sold(item)),
            Machine::Miner(_)
            | Machine::WaterPump
            | Machine::StraightPipe
            | Machine::CornerPipe
            | Machine::CrossPipe => return Err(item),
        }
        Ok(Accepted::Stored)
    }

    // -- Ticking --

    /// Run this building's own production for one tick. Output hand-off is
    /// driven separately by the engine.
    pub(crate) fn advance(&mut self, ctx: &mut TickContext<'_>) {
        let output = &mut self.output;
        match &mut self.machine {
            Machine::Conveyor(c) => c.advance(output.is_some(), ctx.dt, ctx.config.conveyor_speed),
            Machine::Furnace(r) => {
                r.advance(Refinement::Smelt, true, ctx.config.furnace_time, output, ctx)
            }
            Machine::Forge(f) => {
                let refinement = f.refinement();
                f.refiner
                    .advance(refinement, true, ctx.config.forge_time, output, ctx)
            }
            Machine::OreWasher(r) => r.advance(
                Refinement::Wash,
                self.has_water,
                ctx.config.washer_time,
                output,
                ctx,
            ),
            Machine::AlloyFurnace(a) => a.advance(output, ctx),
            Machine::CraftingTable(t) => t.advance(output, ctx),
            Machine::Miner(m) => m.advance(output, ctx),
            Machine::Splitter(_)
            | Machine::Seller
            | Machine::WaterPump
            | Machine::StraightPipe
            | Machine::CornerPipe
            | Machine::CrossPipe => {}
        }
    }

    /// Directions to offer the output item to this tick, in probe order.
    pub(crate) fn output_candidates(&self) -> Vec<Direction> {
        if self.output.is_none() {
            return Vec::new();
        }
        match &self.machine {
            Machine::Conveyor(c) if c.at_far_edge() => vec![self.rotation],
            Machine::Conveyor(_) => Vec::new(),
            Machine::Splitter(s) => s.probe_order(self.rotation).to_vec(),
            Machine::Furnace(_)
            | Machine::Forge(_)
            | Machine::OreWasher(_)
            | Machine::AlloyFurnace(_)
            | Machine::CraftingTable(_)
            | Machine::Miner(_) => vec![self.rotation],
            Machine::Seller
            | Machine::WaterPump
            | Machine::StraightPipe
            | Machine::CornerPipe
            | Machine::CrossPipe => Vec::new(),
        }
    }

    /// The output item went to the `probe`-th candidate.
    pub(crate) fn on_output_sent(&mut self, probe: usize) {
        match &mut self.machine {
            Machine::Splitter(s) => s.sent(probe),
            Machine::Conveyor(c) => c.restart(),
            _ => {}
        }
    }

    /// Every candidate refused the output item.
    pub(crate) fn on_output_blocked(&mut self) {
        if let Machine::Conveyor(c) = &mut self.machine {
            c.park();
        }
    }

    // -- Commands --

    /// Turn 90 degrees clockwise. Returns false for kinds that ignore
    /// rotation.
    pub(crate) fn rotate_clockwise(&mut self) -> bool {
        if !self.kind().is_rotatable() {
            return false;
        }
        self.rotation = self.rotation.rotate_clockwise();
        if let Machine::Conveyor(c) = &mut self.machine {
            c.restart();
        }
        true
    }

    /// Relocate to `to`. Conveyors restart their item; miners bind to the
    /// node at the destination.
    pub(crate) fn relocate(&mut self, to: GridPosition, node: Option<ResourceType>) {
        self.position = to;
        match &mut self.machine {
            Machine::Conveyor(c) => c.restart(),
            Machine::Miner(m) => {
                if let Some(resource) = node {
                    m.resource = resource;
                }
                m.timer = Fixed64::ZERO;
            }
            _ => {}
        }
    }

    /// Returns false when this building is not a forge.
    pub(crate) fn set_forge_mode(&mut self, mode: ForgeMode) -> bool {
        match &mut self.machine {
            Machine::Forge(f) => {
                f.mode = mode;
                true
            }
            _ => false,
        }
    }

    // -- Water --

    /// Edges through which this building joins a water network.
    pub fn water_connections(&self) -> Directions {
        match self.machine {
            Machine::WaterPump | Machine::CrossPipe | Machine::OreWasher(_) => Directions::ALL,
            Machine::StraightPipe => fluid::straight_pipe(self.rotation),
            Machine::CornerPipe => fluid::corner_pipe(self.rotation),
            _ => Directions::EMPTY,
        }
    }

    pub(crate) fn set_has_water(&mut self, has_water: bool) {
        self.has_water = has_water;
    }

    // -- Inspection --

    /// Every item this building owns: output slot first, then buffers.
    pub fn held_items(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.output.iter().collect();
        match &self.machine {
            Machine::Furnace(r) | Machine::OreWasher(r) => items.extend(r.input.iter()),
            Machine::Forge(f) => items.extend(f.refiner.input.iter()),
            Machine::AlloyFurnace(a) => items.extend(a.inputs.iter()),
            Machine::CraftingTable(t) => items.extend(t.plates.iter().chain(&t.bolts)),
            _ => {}
        }
        items
    }

    pub fn held_count(&self) -> usize {
        self.held_items().len()
    }

    /// Remove and return every held item.
    pub(crate) fn take_items(&mut self) -> Vec<Item> {
        let mut items: Vec<Item> = self.output.take().into_iter().collect();
        match &mut self.machine {
            Machine::Furnace(r) | Machine::OreWasher(r) => items.extend(r.input.take()),
            Machine::Forge(f) => items.extend(f.refiner.input.take()),
            Machine::AlloyFurnace(a) => items.append(&mut a.inputs),
            Machine::CraftingTable(t) => {
                items.append(&mut t.plates);
                items.append(&mut t.bolts);
            }
            _ => {}
        }
        items
    }

    /// Progress of the current activity in `[0, 1]`: belt travel for
    /// conveyors, cycle completion for processors and miners.
    pub fn progress(&self, config: &SimConfig) -> Fixed64 {
        let timer = match &self.machine {
            Machine::Conveyor(c) => return c.progress(),
            Machine::Furnace(r) | Machine::OreWasher(r) => r.timer,
            Machine::Forge(f) => f.refiner.timer,
            Machine::AlloyFurnace(a) => a.timer,
            Machine::CraftingTable(t) => t.timer,
            Machine::Miner(m) => m.timer,
            _ => return Fixed64::ZERO,
        };
        let duration = config.process_time(self.kind()).unwrap_or(Fixed64::ONE);
        unit_fraction(timer, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ItemId;
    use crate::item::ItemForm;

    fn build(kind: BuildingKind, rotation: Direction) -> Building {
        Building::new(
            kind,
            GridPosition::new(3, 3),
            rotation,
            &SimConfig::default(),
            Some(ResourceType::Copper),
        )
        .unwrap()
    }

    fn ore(n: u64) -> Item {
        Item::ore(ItemId(n), ResourceType::Copper)
    }

    #[test]
    fn miner_needs_a_node() {
        let config = SimConfig::default();
        let pos = GridPosition::new(0, 0);
        let place = |kind| Building::new(kind, pos, Direction::East, &config, None);
        assert!(place(BuildingKind::Miner).is_none());
        assert!(place(BuildingKind::Conveyor).is_some());
    }

    #[test]
    fn symmetric_kinds_face_north() {
        for kind in [BuildingKind::Seller, BuildingKind::WaterPump, BuildingKind::CrossPipe] {
            let mut b = build(kind, Direction::West);
            assert_eq!(b.rotation(), Direction::North);
            assert!(!b.rotate_clockwise());
            assert_eq!(b.rotation(), Direction::North);
        }
    }

    #[test]
    fn cost_is_recorded_at_construction() {
        let b = build(BuildingKind::AlloyFurnace, Direction::North);
        assert_eq!(b.cost(), SimConfig::default().cost(BuildingKind::AlloyFurnace));
    }

    #[test]
    fn conveyor_takes_one_item() {
        let mut b = build(BuildingKind::Conveyor, Direction::East);
        assert!(b.can_accept(None));
        assert_eq!(b.accept(ore(0)), Ok(Accepted::Stored));
        assert!(!b.can_accept(None));
        assert_eq!(b.accept(ore(1)), Err(ore(1)));
        assert_eq!(b.held_count(), 1);
    }

    #[test]
    fn seller_sells_on_accept() {
        let mut b = build(BuildingKind::Seller, Direction::North);
        assert!(b.can_accept(None));
        assert_eq!(b.accept(ore(4)), Ok(Accepted::Sold(ore(4))));
        assert_eq!(b.held_count(), 0);
    }

    #[test]
    fn sources_and_pipes_never_accept() {
        for kind in [
            BuildingKind::Miner,
            BuildingKind::WaterPump,
            BuildingKind::StraightPipe,
            BuildingKind::CornerPipe,
            BuildingKind::CrossPipe,
        ] {
            let b = build(kind, Direction::North);
            assert!(!b.can_accept(None), "{kind}");
            assert_eq!(b.check_accept(&ore(0)), Err(Rejection::NotAccepting));
        }
    }

    #[test]
    fn furnace_input_is_independent_of_output() {
        let mut b = build(BuildingKind::Furnace, Direction::East);
        let mut done = ore(9);
        done.form = ItemForm::Ingot;
        b.output = Some(done);
        assert!(b.can_accept(Some(&ore(0))));
        assert_eq!(b.accept(ore(0)), Ok(Accepted::Stored));
        assert!(!b.can_accept(Some(&ore(1))));
        assert_eq!(b.held_count(), 2);
    }

    #[test]
    fn forge_mode_defaults_to_plate() {
        let mut b = build(BuildingKind::Forge, Direction::North);
        match b.machine() {
            Machine::Forge(f) => assert_eq!(f.mode(), ForgeMode::IngotToPlate),
            other => panic!("unexpected machine {other:?}"),
        }
        assert!(b.set_forge_mode(ForgeMode::IngotToBolt));
        let mut furnace = build(BuildingKind::Furnace, Direction::North);
        assert!(!furnace.set_forge_mode(ForgeMode::IngotToBolt));
    }

    #[test]
    fn splitter_candidates_follow_cursor() {
        let mut b = build(BuildingKind::Splitter, Direction::North);
        assert!(b.output_candidates().is_empty());
        let _ = b.accept(ore(0));
        assert_eq!(
            b.output_candidates(),
            vec![Direction::West, Direction::North, Direction::East]
        );
        b.on_output_sent(0);
        let _ = b.output.take();
        let _ = b.accept(ore(1));
        assert_eq!(
            b.output_candidates(),
            vec![Direction::North, Direction::East, Direction::West]
        );
    }

    #[test]
    fn rotating_a_conveyor_restarts_its_item() {
        let mut b = build(BuildingKind::Conveyor, Direction::North);
        let _ = b.accept(ore(0));
        b.on_output_blocked();
        assert_eq!(b.progress(&SimConfig::default()), Fixed64::ONE);
        assert!(b.rotate_clockwise());
        assert_eq!(b.rotation(), Direction::East);
        assert_eq!(b.progress(&SimConfig::default()), Fixed64::ZERO);
    }

    #[test]
    fn water_connections_by_kind() {
        for (kind, rotation) in [
            (BuildingKind::WaterPump, Direction::North),
            (BuildingKind::OreWasher, Direction::South),
        ] {
            assert_eq!(build(kind, rotation).water_connections(), Directions::ALL);
        }
        assert_eq!(
            build(BuildingKind::StraightPipe, Direction::East).water_connections(),
            Directions::pair(Direction::North, Direction::South)
        );
        assert!(build(BuildingKind::Furnace, Direction::North).water_connections().is_empty());
    }

    #[test]
    fn take_items_empties_every_slot() {
        let mut b = build(BuildingKind::AlloyFurnace, Direction::North);
        let mut ingot = ore(0);
        ingot.form = ItemForm::Ingot;
        let _ = b.accept(ingot.clone());
        b.output = Some(ore(5));
        assert_eq!(b.take_items().len(), 2);
        assert_eq!(b.held_count(), 0);
    }
}
