//! Water network propagation.
//!
//! Water flows out of every pump standing on a water-source cell, through
//! connected pipes, into any consumer that shares an edge with the network.
//! Two neighbors are connected only when both expose the shared edge.
//! Consumers receive water but never pass it on.
//!
//! The whole grid is re-flooded from scratch each step, so removing a pipe
//! cuts everything downstream on the very next step.

use crate::building::{Building, BuildingKind};
use crate::grid::{Grid, GridPosition};
use crate::id::BuildingId;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::VecDeque;

/// A building whose water flag flipped during propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterChange {
    pub building: BuildingId,
    pub position: GridPosition,
    pub has_water: bool,
}

/// Recompute every building's water flag. Returns the buildings whose flag
/// changed, in row-major order.
pub fn propagate(grid: &Grid, buildings: &mut SlotMap<BuildingId, Building>) -> Vec<WaterChange> {
    let wet = flood(grid, buildings);

    let mut changes = Vec::new();
    for (position, id) in grid.occupied() {
        let Some(building) = buildings.get_mut(id) else {
            continue;
        };
        let has_water = wet.contains_key(id);
        if building.has_water() != has_water {
            building.set_has_water(has_water);
            changes.push(WaterChange {
                building: id,
                position,
                has_water,
            });
        }
    }
    changes
}

/// Breadth-first flood from every grounded pump.
fn flood(grid: &Grid, buildings: &SlotMap<BuildingId, Building>) -> SecondaryMap<BuildingId, ()> {
    let mut wet = SecondaryMap::new();
    let mut queue = VecDeque::new();

    for (position, id) in grid.occupied() {
        let is_pump = buildings
            .get(id)
            .is_some_and(|b| b.kind() == BuildingKind::WaterPump);
        if is_pump && grid.is_water_source(position) {
            wet.insert(id, ());
            queue.push_back((position, id));
        }
    }

    while let Some((position, id)) = queue.pop_front() {
        let Some(building) = buildings.get(id) else {
            continue;
        };
        for dir in building.water_connections().iter() {
            let Some(next_id) = grid.neighbor(position, dir) else {
                continue;
            };
            if wet.contains_key(next_id) {
                continue;
            }
            let Some(neighbor) = buildings.get(next_id) else {
                continue;
            };
            if !neighbor.water_connections().contains(dir.opposite()) {
                continue;
            }
            wet.insert(next_id, ());
            if neighbor.kind().is_water_pass_through() {
                queue.push_back((position.step(dir), next_id));
            }
        }
    }
    wet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::grid::{Direction, GridSize};

    struct Fixture {
        grid: Grid,
        buildings: SlotMap<BuildingId, Building>,
        config: SimConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let mut grid = Grid::new(GridSize::new(6, 6));
            if let Some(t) = grid.terrain_mut(GridPosition::new(0, 0)) {
                t.water_source = true;
            }
            Self {
                grid,
                buildings: SlotMap::with_key(),
                config: SimConfig::default(),
            }
        }

        fn put(&mut self, kind: BuildingKind, x: i32, y: i32, rotation: Direction) -> BuildingId {
            let pos = GridPosition::new(x, y);
            let building = Building::new(kind, pos, rotation, &self.config, None).unwrap();
            let id = self.buildings.insert(building);
            self.grid
                .place(pos, id, kind.requires_water_source())
                .unwrap();
            id
        }

        fn wet(&self, id: BuildingId) -> bool {
            self.buildings[id].has_water()
        }
    }

    #[test]
    fn pump_feeds_washer_through_pipes() {
        let mut f = Fixture::new();
        let pump = f.put(BuildingKind::WaterPump, 0, 0, Direction::North);
        // Straight pipes facing north run east-west.
        let a = f.put(BuildingKind::StraightPipe, 1, 0, Direction::North);
        let b = f.put(BuildingKind::StraightPipe, 2, 0, Direction::North);
        // Corner facing west joins west and north.
        let c = f.put(BuildingKind::CornerPipe, 3, 0, Direction::West);
        let washer = f.put(BuildingKind::OreWasher, 3, 1, Direction::East);

        let changes = propagate(&f.grid, &mut f.buildings);
        assert_eq!(changes.len(), 5);
        for id in [pump, a, b, c, washer] {
            assert!(f.wet(id));
        }
    }

    #[test]
    fn misaligned_pipe_blocks_flow() {
        let mut f = Fixture::new();
        f.put(BuildingKind::WaterPump, 0, 0, Direction::North);
        // Facing east means a north-south run: no west edge.
        let pipe = f.put(BuildingKind::StraightPipe, 1, 0, Direction::East);
        propagate(&f.grid, &mut f.buildings);
        assert!(!f.wet(pipe));
    }

    #[test]
    fn consumers_do_not_relay() {
        let mut f = Fixture::new();
        f.put(BuildingKind::WaterPump, 0, 0, Direction::North);
        f.put(BuildingKind::OreWasher, 1, 0, Direction::North);
        let far = f.put(BuildingKind::OreWasher, 2, 0, Direction::North);
        propagate(&f.grid, &mut f.buildings);
        assert!(!f.wet(far));
    }

    #[test]
    fn removal_dries_downstream() {
        let mut f = Fixture::new();
        f.put(BuildingKind::WaterPump, 0, 0, Direction::North);
        f.put(BuildingKind::CrossPipe, 1, 0, Direction::North);
        let washer = f.put(BuildingKind::OreWasher, 2, 0, Direction::North);
        propagate(&f.grid, &mut f.buildings);
        assert!(f.wet(washer));

        let pipe = f.grid.remove(GridPosition::new(1, 0)).unwrap();
        f.buildings.remove(pipe);
        let changes = propagate(&f.grid, &mut f.buildings);
        assert!(!f.wet(washer));
        assert_eq!(
            changes,
            vec![WaterChange {
                building: washer,
                position: GridPosition::new(2, 0),
                has_water: false,
            }]
        );
    }

    #[test]
    fn second_pass_reports_no_changes() {
        let mut f = Fixture::new();
        f.put(BuildingKind::WaterPump, 0, 0, Direction::North);
        f.put(BuildingKind::CrossPipe, 0, 1, Direction::North);
        assert_eq!(propagate(&f.grid, &mut f.buildings).len(), 2);
        assert!(propagate(&f.grid, &mut f.buildings).is_empty());
    }
}
