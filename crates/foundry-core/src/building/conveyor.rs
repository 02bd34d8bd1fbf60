use crate::fixed::Fixed64;
use serde::{Deserialize, Serialize};

/// A one-cell belt segment carrying at most one item towards its facing.
///
/// `progress` runs from 0 at the cell centre to 1 at the edge shared with
/// the next cell. An item that reaches 1 and cannot be handed off stays
/// parked at 1 until the neighbor frees up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conveyor {
    pub(crate) progress: Fixed64,
}

impl Conveyor {
    pub fn progress(&self) -> Fixed64 {
        self.progress
    }

    pub(crate) fn advance(&mut self, carrying: bool, dt: Fixed64, speed: Fixed64) {
        if !carrying {
            self.progress = Fixed64::ZERO;
            return;
        }
        self.progress = self.progress.saturating_add(dt.saturating_mul(speed)).min(Fixed64::ONE);
    }

    pub(crate) fn at_far_edge(&self) -> bool {
        self.progress >= Fixed64::ONE
    }

    pub(crate) fn restart(&mut self) {
        self.progress = Fixed64::ZERO;
    }

    pub(crate) fn park(&mut self) {
        self.progress = Fixed64::ONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_at_speed_and_clamps() {
        let mut c = Conveyor::default();
        let dt = Fixed64::from_num(0.25);
        let speed = Fixed64::from_num(2);
        c.advance(true, dt, speed);
        assert_eq!(c.progress(), Fixed64::from_num(0.5));
        assert!(!c.at_far_edge());
        c.advance(true, dt, speed);
        c.advance(true, dt, speed);
        assert_eq!(c.progress(), Fixed64::ONE);
        assert!(c.at_far_edge());
    }

    #[test]
    fn huge_dt_parks_at_the_edge() {
        let mut c = Conveyor::default();
        c.advance(true, Fixed64::from_num(1_500_000_000), Fixed64::from_num(2));
        assert_eq!(c.progress(), Fixed64::ONE);
        c.advance(true, Fixed64::MAX, Fixed64::MAX);
        assert_eq!(c.progress(), Fixed64::ONE);
    }

    #[test]
    fn empty_belt_stays_at_zero() {
        let mut c = Conveyor { progress: Fixed64::from_num(0.5) };
        c.advance(false, Fixed64::ONE, Fixed64::from_num(2));
        assert_eq!(c.progress(), Fixed64::ZERO);
    }
}
