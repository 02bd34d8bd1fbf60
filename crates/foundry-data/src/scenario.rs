//! Scenario loading: a directory of data files resolved into a ready-made
//! [`Simulation`].
//!
//! A scenario directory contains:
//!
//! | Base name    | Required | Contents                                 |
//! |--------------|----------|------------------------------------------|
//! | `config`     | yes      | [`ConfigData`]                           |
//! | `world`      | no       | [`WorldData`]; empty world when absent   |
//! | `placements` | no       | list of [`PlacementData`]                |
//!
//! Each may be `.ron`, `.toml` or `.json`.

use crate::loader::{
    DataLoadError, deserialize_file, deserialize_list, find_data_file, require_data_file,
};
use crate::schema::{ConfigData, PlacementData, WorldData};
use foundry_core::config::SimConfig;
use foundry_core::engine::Simulation;
use foundry_core::world::WorldLayout;
use std::path::Path;
use tracing::{debug, info};

/// A fully resolved scenario, not yet turned into a simulation.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: SimConfig,
    pub layout: WorldLayout,
    pub placements: Vec<PlacementData>,
}

/// Load and resolve every scenario file in `dir`.
pub fn load_scenario(dir: &Path) -> Result<Scenario, DataLoadError> {
    let config_path = require_data_file(dir, "config")?;
    let config_data: ConfigData = deserialize_file(&config_path)?;
    let config = config_data.into_config(&config_path)?;

    let layout = match find_data_file(dir, "world")? {
        Some(path) => deserialize_file::<WorldData>(&path)?.into_layout(config.grid),
        None => WorldLayout::default(),
    };
    layout.validate(config.grid)?;

    let placements = match find_data_file(dir, "placements")? {
        Some(path) => deserialize_list(&path, "placements")?,
        None => Vec::new(),
    };

    info!(
        target: "data.load",
        dir = %dir.display(),
        nodes = layout.resource_nodes.len(),
        water = layout.water_sources.len(),
        placements = placements.len(),
        "scenario loaded"
    );
    Ok(Scenario {
        config,
        layout,
        placements,
    })
}

impl Scenario {
    /// Build the simulation and apply the placements in order. Placement
    /// costs come out of the starting balance like any other placement.
    pub fn build(&self) -> Result<Simulation, DataLoadError> {
        let mut sim = Simulation::with_layout(self.config.clone(), &self.layout)?;
        for placement in &self.placements {
            let position = placement.position();
            sim.place_building(placement.kind, position, placement.rotation)
                .map_err(|source| DataLoadError::Placement {
                    kind: placement.kind,
                    position,
                    source,
                })?;
            if let Some(mode) = placement.forge_mode {
                // Modes on anything but a forge are ignored.
                if sim.set_forge_mode(position, mode).is_err() {
                    debug!(
                        target: "data.load",
                        kind = %placement.kind,
                        %position,
                        "forge mode ignored"
                    );
                }
            }
        }
        Ok(sim)
    }
}

/// [`load_scenario`] followed by [`Scenario::build`].
pub fn load_simulation(dir: &Path) -> Result<Simulation, DataLoadError> {
    load_scenario(dir)?.build()
}
