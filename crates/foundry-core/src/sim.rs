//! Clock state and desync hashing.

use crate::fixed::{Fixed64, Ticks};
use crate::item::Item;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// The simulation clock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Number of completed steps.
    pub tick: Ticks,
    /// Sum of every `dt` passed to a step, in seconds.
    pub elapsed: Fixed64,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn advance(&mut self, dt: Fixed64) {
        self.tick += 1;
        self.elapsed = self.elapsed.saturating_add(dt);
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A deterministic hash of simulation state for desync detection.
///
/// FNV-1a (64-bit). Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Every field of an item, with `0` standing for a missing secondary.
    pub fn write_item(&mut self, item: &Item) {
        self.write_u64(item.id.0);
        self.write_u32(item.resource as u32);
        self.write_u32(item.secondary_resource.map_or(0, |r| r as u32 + 1));
        self.write_u32(item.form as u32);
        self.write_u32(item.value);
        self.write(&[item.is_washed as u8]);
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
