//! Water connection shapes for pumps, pipes and water consumers.

use crate::grid::{Direction, Directions};

/// Straight pipes expose the pair of edges perpendicular to their facing.
pub(crate) fn straight_pipe(rotation: Direction) -> Directions {
    match rotation {
        Direction::North | Direction::South => Directions::pair(Direction::East, Direction::West),
        Direction::East | Direction::West => Directions::pair(Direction::North, Direction::South),
    }
}

/// Corner pipes expose their facing and the next edge clockwise.
pub(crate) fn corner_pipe(rotation: Direction) -> Directions {
    Directions::pair(rotation, rotation.rotate_clockwise())
}
