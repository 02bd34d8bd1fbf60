//! Recipe machines: furnace, forge, ore washer, alloy furnace and crafting
//! table.
//!
//! Every processor has a private input buffer and shares the building's
//! output slot. Inputs are accepted while the buffer has room, regardless
//! of the output. A cycle only runs while the output slot is empty; a
//! blocked output stops the timer at zero.

use super::{Rejection, TickContext};
use crate::event::Event;
use crate::fixed::Fixed64;
use crate::item::{Item, ItemForm, washed_value};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Single-input refinements
// ---------------------------------------------------------------------------

/// Which part an ingot is forged into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForgeMode {
    #[default]
    IngotToPlate,
    IngotToBolt,
}

/// The in-place transformation a single-input processor applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refinement {
    Smelt,
    Forge(ForgeMode),
    Wash,
}

impl Refinement {
    fn check(self, item: &Item) -> Result<(), Rejection> {
        let wanted = match self {
            Refinement::Smelt | Refinement::Wash => ItemForm::Ore,
            Refinement::Forge(_) => ItemForm::Ingot,
        };
        if item.form != wanted {
            return Err(Rejection::WrongForm(item.form));
        }
        if self == Refinement::Wash && item.is_washed {
            return Err(Rejection::AlreadyWashed);
        }
        Ok(())
    }

    fn apply(self, item: &mut Item) {
        match self {
            Refinement::Smelt => {
                item.form = ItemForm::Ingot;
                item.value += 1;
            }
            Refinement::Forge(ForgeMode::IngotToPlate) => {
                item.form = ItemForm::Plate;
                item.value += 2;
            }
            Refinement::Forge(ForgeMode::IngotToBolt) => {
                item.form = ItemForm::Bolt;
                item.value += 1;
            }
            Refinement::Wash => {
                item.value = washed_value(item.value);
                item.is_washed = true;
            }
        }
    }
}

/// One-slot input buffer plus cycle timer, shared by furnace, forge and
/// ore washer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refiner {
    pub(crate) input: Option<Item>,
    pub(crate) timer: Fixed64,
}

impl Refiner {
    pub fn input(&self) -> Option<&Item> {
        self.input.as_ref()
    }

    pub fn timer(&self) -> Fixed64 {
        self.timer
    }

    pub(crate) fn check(&self, refinement: Refinement, item: &Item) -> Result<(), Rejection> {
        refinement.check(item)?;
        if self.input.is_some() {
            return Err(Rejection::Full);
        }
        Ok(())
    }

    pub(crate) fn store(&mut self, item: Item) {
        self.input = Some(item);
        self.timer = Fixed64::ZERO;
    }

    /// Run one tick of the cycle. `ready` gates processing on external
    /// conditions (the washer's water supply).
    pub(crate) fn advance(
        &mut self,
        refinement: Refinement,
        ready: bool,
        duration: Fixed64,
        output: &mut Option<Item>,
        ctx: &mut TickContext<'_>,
    ) {
        if !ready || output.is_some() || self.input.is_none() {
            self.timer = Fixed64::ZERO;
            return;
        }
        self.timer = self.timer.saturating_add(ctx.dt);
        if self.timer < duration {
            return;
        }
        self.timer = Fixed64::ZERO;
        if let Some(mut item) = self.input.take() {
            refinement.apply(&mut item);
            ctx.events.emit(Event::ItemTransformed {
                item: item.id,
                position: ctx.position,
                form: item.form,
                value: item.value,
                tick: ctx.tick,
            });
            *output = Some(item);
        }
    }
}

/// A forge is a refiner with a selectable product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forge {
    pub(crate) mode: ForgeMode,
    pub(crate) refiner: Refiner,
}

impl Forge {
    pub fn mode(&self) -> ForgeMode {
        self.mode
    }

    pub fn refiner(&self) -> &Refiner {
        &self.refiner
    }

    pub(crate) fn refinement(&self) -> Refinement {
        Refinement::Forge(self.mode)
    }
}

// ---------------------------------------------------------------------------
// Alloy furnace
// ---------------------------------------------------------------------------

/// Combines two plain ingots into one alloy ingot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlloyFurnace {
    pub(crate) inputs: Vec<Item>,
    pub(crate) timer: Fixed64,
}

impl AlloyFurnace {
    pub const INPUTS: usize = 2;

    pub fn inputs(&self) -> &[Item] {
        &self.inputs
    }

    pub fn timer(&self) -> Fixed64 {
        self.timer
    }

    /// Any two non-alloy ingots combine, including two of the same resource.
    pub(crate) fn check(&self, item: &Item) -> Result<(), Rejection> {
        if item.form != ItemForm::Ingot {
            return Err(Rejection::WrongForm(item.form));
        }
        if item.is_alloy() {
            return Err(Rejection::RecipeMismatch);
        }
        if self.inputs.len() >= Self::INPUTS {
            return Err(Rejection::Full);
        }
        Ok(())
    }

    pub(crate) fn store(&mut self, item: Item) {
        self.inputs.push(item);
        self.timer = Fixed64::ZERO;
    }

    pub(crate) fn advance(&mut self, output: &mut Option<Item>, ctx: &mut TickContext<'_>) {
        if output.is_some() || self.inputs.len() < Self::INPUTS {
            self.timer = Fixed64::ZERO;
            return;
        }
        self.timer = self.timer.saturating_add(ctx.dt);
        if self.timer < ctx.config.alloy_time {
            return;
        }
        self.timer = Fixed64::ZERO;
        let [first, second]: [Item; 2] = match std::mem::take(&mut self.inputs).try_into() {
            Ok(pair) => pair,
            Err(inputs) => {
                debug_assert!(false, "alloy furnace held {} inputs", inputs.len());
                self.inputs = inputs;
                return;
            }
        };
        let alloy = Item::alloy(ctx.item_ids.next_id(), &first, &second);
        for consumed in [&first, &second] {
            ctx.events.emit(Event::ItemConsumed {
                item: consumed.id,
                position: ctx.position,
                tick: ctx.tick,
            });
        }
        ctx.events.emit(Event::ItemCreated {
            item: alloy.id,
            position: ctx.position,
            tick: ctx.tick,
        });
        *output = Some(alloy);
    }
}

// ---------------------------------------------------------------------------
// Crafting table
// ---------------------------------------------------------------------------

/// Combines one plate and two bolts of the same material into a
/// reinforced plate worth twice the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingTable {
    pub(crate) plates: Vec<Item>,
    pub(crate) bolts: Vec<Item>,
    pub(crate) max_plates: u8,
    pub(crate) max_bolts: u8,
    pub(crate) timer: Fixed64,
}

impl CraftingTable {
    pub const PLATES_PER_CRAFT: usize = 1;
    pub const BOLTS_PER_CRAFT: usize = 2;

    pub(crate) fn new(max_plates: u8, max_bolts: u8) -> Self {
        Self {
            plates: Vec::new(),
            bolts: Vec::new(),
            max_plates,
            max_bolts,
            timer: Fixed64::ZERO,
        }
    }

    pub fn plates(&self) -> &[Item] {
        &self.plates
    }

    pub fn bolts(&self) -> &[Item] {
        &self.bolts
    }

    pub fn timer(&self) -> Fixed64 {
        self.timer
    }

    /// Form first, then material against everything buffered, then caps.
    pub(crate) fn check(&self, item: &Item) -> Result<(), Rejection> {
        let (buffer, cap) = match item.form {
            ItemForm::Plate => (&self.plates, self.max_plates),
            ItemForm::Bolt => (&self.bolts, self.max_bolts),
            other => return Err(Rejection::WrongForm(other)),
        };
        let material = item.material();
        if self
            .plates
            .iter()
            .chain(&self.bolts)
            .any(|held| held.material() != material)
        {
            return Err(Rejection::RecipeMismatch);
        }
        if buffer.len() >= cap as usize {
            return Err(Rejection::Full);
        }
        Ok(())
    }

    pub(crate) fn store(&mut self, item: Item) {
        match item.form {
            ItemForm::Plate => self.plates.push(item),
            ItemForm::Bolt => self.bolts.push(item),
            _ => debug_assert!(false, "crafting table stored a {:?}", item.form),
        }
        self.timer = Fixed64::ZERO;
    }

    fn ready(&self) -> bool {
        self.plates.len() >= Self::PLATES_PER_CRAFT && self.bolts.len() >= Self::BOLTS_PER_CRAFT
    }

    pub(crate) fn advance(&mut self, output: &mut Option<Item>, ctx: &mut TickContext<'_>) {
        if output.is_some() || !self.ready() {
            self.timer = Fixed64::ZERO;
            return;
        }
        self.timer = self.timer.saturating_add(ctx.dt);
        if self.timer < ctx.config.crafting_time {
            return;
        }
        self.timer = Fixed64::ZERO;

        let consumed: Vec<Item> = self
            .plates
            .drain(..Self::PLATES_PER_CRAFT)
            .chain(self.bolts.drain(..Self::BOLTS_PER_CRAFT))
            .collect();
        let plate = &consumed[0];
        let total: u32 = consumed.iter().map(|i| i.value).sum();
        let product = Item {
            id: ctx.item_ids.next_id(),
            resource: plate.resource,
            secondary_resource: plate.secondary_resource,
            form: ItemForm::ReinforcedPlate,
            value: total * 2,
            is_washed: false,
        };
        for input in &consumed {
            ctx.events.emit(Event::ItemConsumed {
                item: input.id,
                position: ctx.position,
                tick: ctx.tick,
            });
        }
        ctx.events.emit(Event::ItemCreated {
            item: product.id,
            position: ctx.position,
            tick: ctx.tick,
        });
        *output = Some(product);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ItemId;
    use crate::item::ResourceType;

    fn item(resource: ResourceType, form: ItemForm, value: u32) -> Item {
        Item {
            id: ItemId(value as u64),
            resource,
            secondary_resource: None,
            form,
            value,
            is_washed: false,
        }
    }

    #[test]
    fn refinement_recipes() {
        let mut ore = item(ResourceType::Copper, ItemForm::Ore, 1);
        Refinement::Smelt.apply(&mut ore);
        assert_eq!((ore.form, ore.value), (ItemForm::Ingot, 2));

        let mut plate = ore.clone();
        Refinement::Forge(ForgeMode::IngotToPlate).apply(&mut plate);
        assert_eq!((plate.form, plate.value), (ItemForm::Plate, 4));

        let mut bolt = ore;
        Refinement::Forge(ForgeMode::IngotToBolt).apply(&mut bolt);
        assert_eq!((bolt.form, bolt.value), (ItemForm::Bolt, 3));

        let mut gold = item(ResourceType::Gold, ItemForm::Ore, 3);
        Refinement::Wash.apply(&mut gold);
        assert_eq!((gold.form, gold.value, gold.is_washed), (ItemForm::Ore, 5, true));
    }

    #[test]
    fn washer_rejects_washed_ore() {
        let mut ore = item(ResourceType::Iron, ItemForm::Ore, 2);
        ore.is_washed = true;
        assert_eq!(Refinement::Wash.check(&ore), Err(Rejection::AlreadyWashed));
        // Washed ore still smelts.
        assert_eq!(Refinement::Smelt.check(&ore), Ok(()));
    }

    #[test]
    fn refiner_holds_one_input() {
        let mut r = Refiner::default();
        let ore = item(ResourceType::Copper, ItemForm::Ore, 1);
        assert_eq!(r.check(Refinement::Smelt, &ore), Ok(()));
        r.store(ore.clone());
        assert_eq!(r.check(Refinement::Smelt, &ore), Err(Rejection::Full));
        let ingot = item(ResourceType::Copper, ItemForm::Ingot, 2);
        assert_eq!(
            r.check(Refinement::Smelt, &ingot),
            Err(Rejection::WrongForm(ItemForm::Ingot))
        );
    }

    #[test]
    fn alloy_gate() {
        let mut f = AlloyFurnace::default();
        let copper = item(ResourceType::Copper, ItemForm::Ingot, 2);
        assert_eq!(
            f.check(&item(ResourceType::Copper, ItemForm::Ore, 1)),
            Err(Rejection::WrongForm(ItemForm::Ore))
        );
        let mut alloy = copper.clone();
        alloy.secondary_resource = Some(ResourceType::Iron);
        assert_eq!(f.check(&alloy), Err(Rejection::RecipeMismatch));

        f.store(copper.clone());
        f.store(copper.clone());
        assert_eq!(f.check(&copper), Err(Rejection::Full));
    }

    #[test]
    fn crafting_gate_checks_material_before_caps() {
        let mut t = CraftingTable::new(2, 4);
        let copper_plate = item(ResourceType::Copper, ItemForm::Plate, 4);
        let iron_plate = item(ResourceType::Iron, ItemForm::Plate, 5);
        let copper_bolt = item(ResourceType::Copper, ItemForm::Bolt, 3);

        assert_eq!(
            t.check(&item(ResourceType::Copper, ItemForm::Ingot, 2)),
            Err(Rejection::WrongForm(ItemForm::Ingot))
        );

        t.store(copper_plate.clone());
        t.store(copper_plate.clone());
        assert_eq!(t.check(&copper_plate), Err(Rejection::Full));
        assert_eq!(t.check(&iron_plate), Err(Rejection::RecipeMismatch));
        assert_eq!(t.check(&copper_bolt), Ok(()));
    }

    #[test]
    fn crafting_table_caps_bolts() {
        let mut t = CraftingTable::new(2, 4);
        let bolt = item(ResourceType::Gold, ItemForm::Bolt, 5);
        for _ in 0..4 {
            assert_eq!(t.check(&bolt), Ok(()));
            t.store(bolt.clone());
        }
        assert_eq!(t.check(&bolt), Err(Rejection::Full));
        assert!(!t.ready());
    }
}
