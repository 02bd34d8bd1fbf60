//! Read-only views of simulation state.
//!
//! Snapshot types are owned copies with no references into the
//! simulation, suitable for rendering and UI layers.

use crate::building::{Building, BuildingKind};
use crate::config::SimConfig;
use crate::fixed::Fixed64;
use crate::grid::{Direction, GridPosition};
use crate::id::BuildingId;
use crate::item::Item;

// ---------------------------------------------------------------------------
// Building snapshot
// ---------------------------------------------------------------------------

/// A copy of one building's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingSnapshot {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub position: GridPosition,
    pub rotation: Direction,
    /// The item in the output slot (the belt item, for conveyors).
    pub output: Option<Item>,
    /// Items waiting in internal input buffers.
    pub buffered: Vec<Item>,
    /// Belt travel or cycle completion as a 0..1 fraction.
    pub progress: Fixed64,
    pub has_water: bool,
}

impl BuildingSnapshot {
    pub(crate) fn capture(id: BuildingId, building: &Building, config: &SimConfig) -> Self {
        let skip = usize::from(building.output().is_some());
        Self {
            id,
            kind: building.kind(),
            position: building.position(),
            rotation: building.rotation(),
            output: building.output().cloned(),
            buffered: building
                .held_items()
                .into_iter()
                .skip(skip)
                .cloned()
                .collect(),
            progress: building.progress(config),
            has_water: building.has_water(),
        }
    }

    /// Everything this building holds.
    pub fn item_count(&self) -> usize {
        self.buffered.len() + usize::from(self.output.is_some())
    }
}
