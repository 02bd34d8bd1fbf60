//! Static world terrain: resource nodes and water sources.
//!
//! A layout is stamped onto the grid once when a simulation is built and
//! never changes afterwards.

use crate::grid::{Direction, Grid, GridPosition, GridSize};
use crate::item::ResourceType;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout cell {0} is outside the grid")]
    OutOfBounds(GridPosition),
    #[error("layout cell {0} is listed more than once")]
    Conflict(GridPosition),
}

/// Resource nodes and water-source cells of a world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldLayout {
    pub resource_nodes: Vec<(GridPosition, ResourceType)>,
    pub water_sources: Vec<GridPosition>,
}

/// Generation knobs for [`WorldLayout::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub nodes_per_resource: u32,
    pub water_pools: u32,
    /// Cells per pool, including the pool's seed cell.
    pub pool_size: u32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            nodes_per_resource: 4,
            water_pools: 2,
            pool_size: 3,
        }
    }
}

impl WorldLayout {
    /// Check every cell is in bounds and listed at most once across both
    /// tables.
    pub fn validate(&self, size: GridSize) -> Result<(), LayoutError> {
        let probe = Grid::new(size);
        let mut seen = BTreeSet::new();
        let cells = self
            .resource_nodes
            .iter()
            .map(|(pos, _)| *pos)
            .chain(self.water_sources.iter().copied());
        for pos in cells {
            if !probe.in_bounds(pos) {
                return Err(LayoutError::OutOfBounds(pos));
            }
            if !seen.insert((pos.y, pos.x)) {
                return Err(LayoutError::Conflict(pos));
            }
        }
        Ok(())
    }

    /// Validate, then write the terrain into `grid`.
    pub(crate) fn apply(&self, grid: &mut Grid) -> Result<(), LayoutError> {
        self.validate(grid.size())?;
        for &(pos, resource) in &self.resource_nodes {
            if let Some(terrain) = grid.terrain_mut(pos) {
                terrain.resource = Some(resource);
            }
        }
        for &pos in &self.water_sources {
            if let Some(terrain) = grid.terrain_mut(pos) {
                terrain.water_source = true;
            }
        }
        Ok(())
    }

    /// Scatter nodes and water pools over `size`. The same seed always
    /// gives the same layout. Cells already taken are skipped, so small
    /// grids may end up with fewer entries than requested.
    pub fn generate(size: GridSize, seed: u64, params: LayoutParams) -> Self {
        let mut rng = SimRng::new(seed);
        let mut taken = BTreeSet::new();
        let mut layout = WorldLayout::default();
        if size.cell_count() == 0 {
            return layout;
        }
        let random_cell = |rng: &mut SimRng| {
            GridPosition::new(rng.below(size.width) as i32, rng.below(size.height) as i32)
        };
        let bounds = Grid::new(size);
        let dirs = Direction::all();

        for resource in ResourceType::all() {
            for _ in 0..params.nodes_per_resource {
                let pos = random_cell(&mut rng);
                if taken.insert((pos.y, pos.x)) {
                    layout.resource_nodes.push((pos, resource));
                }
            }
        }

        for _ in 0..params.water_pools {
            let mut pos = random_cell(&mut rng);
            for _ in 0..params.pool_size {
                if bounds.in_bounds(pos) && taken.insert((pos.y, pos.x)) {
                    layout.water_sources.push(pos);
                }
                if let Some(&dir) = rng.pick(&dirs) {
                    pos = pos.step(dir);
                }
            }
        }
        layout
    }
}
