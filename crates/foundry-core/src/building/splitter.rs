use crate::grid::Direction;
use serde::{Deserialize, Serialize};

/// Three-way round-robin splitter.
///
/// Lanes are left, forward and right relative to the facing. `cursor` is
/// the lane the next item is offered to first; after a successful hand-off
/// it moves to one past the lane that took the item. A fully blocked
/// splitter keeps its cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Splitter {
    pub(crate) cursor: u8,
}

impl Splitter {
    pub fn cursor(&self) -> u8 {
        self.cursor
    }

    /// The three output directions in the order they are probed.
    pub(crate) fn probe_order(&self, rotation: Direction) -> [Direction; 3] {
        let lanes = [
            rotation.rotate_counter_clockwise(),
            rotation,
            rotation.rotate_clockwise(),
        ];
        let start = self.cursor as usize;
        std::array::from_fn(|k| lanes[(start + k) % 3])
    }

    /// Record that the `probe`-th direction of [`probe_order`](Self::probe_order) took the item.
    pub(crate) fn sent(&mut self, probe: usize) {
        let lane = (self.cursor as usize + probe) % 3;
        self.cursor = ((lane + 1) % 3) as u8;
    }
}
