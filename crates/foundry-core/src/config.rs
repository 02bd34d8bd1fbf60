//! Simulation tuning: grid size, money, timings and buffer limits.

use crate::building::BuildingKind;
use crate::economy::{Credits, CostTable};
use crate::fixed::Fixed64;
use crate::grid::GridSize;
use serde::{Deserialize, Serialize};

/// Everything tunable about a simulation. Fixed for the lifetime of a
/// [`Simulation`](crate::engine::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub grid: GridSize,
    pub starting_balance: Credits,
    /// Conveyor segments traversed per second.
    pub conveyor_speed: Fixed64,
    /// Seconds a miner needs per ore.
    pub mine_time: Fixed64,
    pub furnace_time: Fixed64,
    pub forge_time: Fixed64,
    pub alloy_time: Fixed64,
    pub crafting_time: Fixed64,
    pub washer_time: Fixed64,
    /// Plates a crafting table buffers before refusing more.
    pub max_plate_buffer: u8,
    /// Bolts a crafting table buffers before refusing more.
    pub max_bolt_buffer: u8,
    pub costs: CostTable,
}

impl SimConfig {
    /// Seconds one production cycle takes for `kind`, if it has one.
    pub fn process_time(&self, kind: BuildingKind) -> Option<Fixed64> {
        match kind {
            BuildingKind::Furnace => Some(self.furnace_time),
            BuildingKind::Forge => Some(self.forge_time),
            BuildingKind::AlloyFurnace => Some(self.alloy_time),
            BuildingKind::CraftingTable => Some(self.crafting_time),
            BuildingKind::OreWasher => Some(self.washer_time),
            BuildingKind::Miner => Some(self.mine_time),
            _ => None,
        }
    }

    pub fn cost(&self, kind: BuildingKind) -> Credits {
        self.costs.cost(kind)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::default(),
            starting_balance: 200,
            conveyor_speed: Fixed64::from_num(2),
            mine_time: Fixed64::from_num(2),
            furnace_time: Fixed64::from_num(2),
            forge_time: Fixed64::from_num(1.5),
            alloy_time: Fixed64::from_num(2),
            crafting_time: Fixed64::from_num(2),
            washer_time: Fixed64::from_num(1.5),
            max_plate_buffer: 2,
            max_bolt_buffer: 4,
            costs: CostTable::default(),
        }
    }
}
