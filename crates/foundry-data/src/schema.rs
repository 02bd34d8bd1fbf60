//! Serde data file structs for scenario definitions.
//!
//! These structs define the on-disk format of `config.*`, `world.*` and
//! `placements.*`. Durations are written as plain decimals and converted to
//! fixed point when the scenario is resolved.

use crate::loader::DataLoadError;
use foundry_core::building::{BuildingKind, ForgeMode};
use foundry_core::config::SimConfig;
use foundry_core::economy::Credits;
use foundry_core::fixed::Fixed64;
use foundry_core::grid::{Direction, GridPosition, GridSize};
use foundry_core::item::ResourceType;
use foundry_core::world::{LayoutParams, WorldLayout};
use serde::Deserialize;
use std::path::Path;

// ===========================================================================
// Config
// ===========================================================================

/// Simulation tuning. Every field is optional and defaults to the
/// reference instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigData {
    pub width: u32,
    pub height: u32,
    pub starting_balance: Credits,
    pub conveyor_speed: f64,
    pub mine_time: f64,
    pub furnace_time: f64,
    pub forge_time: f64,
    pub alloy_time: f64,
    pub crafting_time: f64,
    pub washer_time: f64,
    pub max_plate_buffer: u8,
    pub max_bolt_buffer: u8,
    /// Overrides for individual kinds; unlisted kinds keep their default.
    pub costs: Vec<CostData>,
}

/// One entry of the cost override table.
#[derive(Debug, Clone, Deserialize)]
pub struct CostData {
    pub kind: BuildingKind,
    pub cost: Credits,
}

impl Default for ConfigData {
    fn default() -> Self {
        let config = SimConfig::default();
        Self {
            width: config.grid.width,
            height: config.grid.height,
            starting_balance: config.starting_balance,
            conveyor_speed: config.conveyor_speed.to_num(),
            mine_time: config.mine_time.to_num(),
            furnace_time: config.furnace_time.to_num(),
            forge_time: config.forge_time.to_num(),
            alloy_time: config.alloy_time.to_num(),
            crafting_time: config.crafting_time.to_num(),
            washer_time: config.washer_time.to_num(),
            max_plate_buffer: config.max_plate_buffer,
            max_bolt_buffer: config.max_bolt_buffer,
            costs: Vec::new(),
        }
    }
}

/// Convert a strictly positive, finite number of seconds (or cells per
/// second) to fixed point.
fn positive(file: &Path, field: &str, value: f64) -> Result<Fixed64, DataLoadError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DataLoadError::Invalid {
            file: file.to_path_buf(),
            detail: format!("{field} must be a positive number, got {value}"),
        });
    }
    Fixed64::checked_from_num(value).ok_or_else(|| DataLoadError::Invalid {
        file: file.to_path_buf(),
        detail: format!("{field} is out of range: {value}"),
    })
}

impl ConfigData {
    /// Resolve into a [`SimConfig`]. `file` is only used in error messages.
    pub fn into_config(self, file: &Path) -> Result<SimConfig, DataLoadError> {
        if self.width == 0 || self.height == 0 {
            return Err(DataLoadError::Invalid {
                file: file.to_path_buf(),
                detail: format!("grid must not be empty, got {}x{}", self.width, self.height),
            });
        }
        let mut config = SimConfig {
            grid: GridSize::new(self.width, self.height),
            starting_balance: self.starting_balance,
            conveyor_speed: positive(file, "conveyor_speed", self.conveyor_speed)?,
            mine_time: positive(file, "mine_time", self.mine_time)?,
            furnace_time: positive(file, "furnace_time", self.furnace_time)?,
            forge_time: positive(file, "forge_time", self.forge_time)?,
            alloy_time: positive(file, "alloy_time", self.alloy_time)?,
            crafting_time: positive(file, "crafting_time", self.crafting_time)?,
            washer_time: positive(file, "washer_time", self.washer_time)?,
            max_plate_buffer: self.max_plate_buffer,
            max_bolt_buffer: self.max_bolt_buffer,
            ..SimConfig::default()
        };
        for entry in self.costs {
            config.costs.set(entry.kind, entry.cost);
        }
        Ok(config)
    }
}

// ===========================================================================
// World
// ===========================================================================

/// A single grid cell.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CellData {
    pub x: i32,
    pub y: i32,
}

impl From<CellData> for GridPosition {
    fn from(cell: CellData) -> Self {
        GridPosition::new(cell.x, cell.y)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NodeData {
    pub x: i32,
    pub y: i32,
    pub resource: ResourceType,
}

/// Seeded random terrain, scattered before the explicit entries are added.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GenerateData {
    pub seed: u64,
    pub nodes_per_resource: u32,
    pub water_pools: u32,
    pub pool_size: u32,
}

impl Default for GenerateData {
    fn default() -> Self {
        let params = LayoutParams::default();
        Self {
            seed: 0,
            nodes_per_resource: params.nodes_per_resource,
            water_pools: params.water_pools,
            pool_size: params.pool_size,
        }
    }
}

/// Terrain of a world. Explicit entries are added on top of any generated
/// ones; a cell listed twice makes the layout invalid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorldData {
    pub generate: Option<GenerateData>,
    pub resource_nodes: Vec<NodeData>,
    pub water_sources: Vec<CellData>,
}

impl WorldData {
    pub fn into_layout(self, size: GridSize) -> WorldLayout {
        let mut layout = match self.generate {
            Some(g) => WorldLayout::generate(
                size,
                g.seed,
                LayoutParams {
                    nodes_per_resource: g.nodes_per_resource,
                    water_pools: g.water_pools,
                    pool_size: g.pool_size,
                },
            ),
            None => WorldLayout::default(),
        };
        layout.resource_nodes.extend(
            self.resource_nodes
                .into_iter()
                .map(|n| (GridPosition::new(n.x, n.y), n.resource)),
        );
        layout
            .water_sources
            .extend(self.water_sources.into_iter().map(GridPosition::from));
        layout
    }
}

// ===========================================================================
// Placements
// ===========================================================================

/// A building placed when the scenario is built, in file order.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacementData {
    pub kind: BuildingKind,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub rotation: Direction,
    /// Only meaningful for forges.
    #[serde(default)]
    pub forge_mode: Option<ForgeMode>,
}

impl PlacementData {
    pub fn position(&self) -> GridPosition {
        GridPosition::new(self.x, self.y)
    }
}
