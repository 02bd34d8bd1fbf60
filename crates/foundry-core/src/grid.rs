//! The fixed-size 2-D grid: coordinates, directions, terrain and occupancy.
//!
//! The grid stores only [`BuildingId`]s; the buildings themselves live in the
//! simulation's arena. [`Grid::in_bounds`] is the one place bounds are
//! decided, and every other component asks it.

use crate::id::BuildingId;
use crate::item::ResourceType;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A cell coordinate. `y` grows northwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent cell in `dir`. May lie outside the grid.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal directions, in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four cardinal directions.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// N -> E -> S -> W -> N.
    pub fn rotate_clockwise(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    pub fn rotate_counter_clockwise(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    pub fn opposite(self) -> Self {
        self.rotate_clockwise().rotate_clockwise()
    }

    /// Unit step for this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of directions, stored as a 4-bit mask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Directions(u8);

impl Directions {
    pub const EMPTY: Directions = Directions(0);
    pub const ALL: Directions = Directions(0b1111);

    pub const fn with(self, dir: Direction) -> Self {
        Self(self.0 | dir.bit())
    }

    pub const fn pair(a: Direction, b: Direction) -> Self {
        Self::EMPTY.with(a).with(b)
    }

    pub fn contains(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in clockwise order starting from North.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::all().into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for Directions {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        iter.into_iter().fold(Directions::EMPTY, Directions::with)
    }
}

impl std::fmt::Debug for Directions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// ---------------------------------------------------------------------------
// Size and terrain
// ---------------------------------------------------------------------------

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(26, 15)
    }
}

/// Immutable per-cell world features, fixed at world generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Terrain {
    /// The resource node under this cell, if any.
    pub resource: Option<ResourceType>,
    pub water_source: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from grid occupancy operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("position {0} is outside the grid")]
    OutOfBounds(GridPosition),
    #[error("cell {0} is already occupied")]
    Occupied(GridPosition),
    #[error("cell {0} is empty")]
    Vacant(GridPosition),
    /// Water-only occupants need a water-source cell, everything else
    /// needs dry land.
    #[error("water affinity mismatch at {position}")]
    WaterAffinity { position: GridPosition },
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Fixed-size table of cells mapping each coordinate to at most one building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: GridSize,
    cells: Vec<Option<BuildingId>>,
    terrain: Vec<Terrain>,
}

impl Grid {
    pub fn new(size: GridSize) -> Self {
        Self {
            size,
            cells: vec![None; size.cell_count()],
            terrain: vec![Terrain::default(); size.cell_count()],
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as u32) < self.size.width
            && (pos.y as u32) < self.size.height
    }

    /// Row-major index.
    fn index(&self, pos: GridPosition) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(pos.y as usize * self.size.width as usize + pos.x as usize)
    }

    // -- Terrain --

    pub fn terrain(&self, pos: GridPosition) -> Option<&Terrain> {
        self.index(pos).map(|i| &self.terrain[i])
    }

    pub fn resource_at(&self, pos: GridPosition) -> Option<ResourceType> {
        self.terrain(pos).and_then(|t| t.resource)
    }

    pub fn is_water_source(&self, pos: GridPosition) -> bool {
        self.terrain(pos).is_some_and(|t| t.water_source)
    }

    pub(crate) fn terrain_mut(&mut self, pos: GridPosition) -> Option<&mut Terrain> {
        let i = self.index(pos)?;
        Some(&mut self.terrain[i])
    }

    // -- Occupancy --

    pub fn get(&self, pos: GridPosition) -> Option<BuildingId> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    pub fn is_occupied(&self, pos: GridPosition) -> bool {
        self.get(pos).is_some()
    }

    /// The occupant of the cell next to `pos` in `dir`.
    pub fn neighbor(&self, pos: GridPosition, dir: Direction) -> Option<BuildingId> {
        self.get(pos.step(dir))
    }

    /// Check that an occupant with the given water affinity could go at `pos`.
    pub fn check_place(&self, pos: GridPosition, water_only: bool) -> Result<(), GridError> {
        let i = self.index(pos).ok_or(GridError::OutOfBounds(pos))?;
        if self.cells[i].is_some() {
            return Err(GridError::Occupied(pos));
        }
        if self.terrain[i].water_source != water_only {
            return Err(GridError::WaterAffinity { position: pos });
        }
        Ok(())
    }

    pub fn place(
        &mut self,
        pos: GridPosition,
        id: BuildingId,
        water_only: bool,
    ) -> Result<(), GridError> {
        self.check_place(pos, water_only)?;
        debug_assert!(
            !self.cells.contains(&Some(id)),
            "building registered at two cells"
        );
        if let Some(i) = self.index(pos) {
            self.cells[i] = Some(id);
        }
        Ok(())
    }

    pub fn remove(&mut self, pos: GridPosition) -> Option<BuildingId> {
        let i = self.index(pos)?;
        self.cells[i].take()
    }

    /// Move the occupant of `from` to `to`. Nothing changes on error.
    pub fn move_building(
        &mut self,
        from: GridPosition,
        to: GridPosition,
        water_only: bool,
    ) -> Result<BuildingId, GridError> {
        let id = self.get(from).ok_or(GridError::Vacant(from))?;
        self.check_place(to, water_only)?;
        self.remove(from);
        self.place(to, id, water_only)?;
        Ok(id)
    }

    // -- Iteration --

    /// Every cell position in row-major order (`y` outer, `x` inner).
    pub fn positions(&self) -> impl Iterator<Item = GridPosition> + use<> {
        let (w, h) = (self.size.width as i32, self.size.height as i32);
        (0..h).flat_map(move |y| (0..w).map(move |x| GridPosition::new(x, y)))
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (GridPosition, BuildingId)> + '_ {
        self.positions()
            .filter_map(|pos| self.get(pos).map(|id| (pos, id)))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}
