//! Binary snapshots of a whole simulation.
//!
//! `bitcode` encoding with a versioned header. The event bus is not part of
//! a snapshot: listeners are closures and must be re-registered after
//! [`Simulation::deserialize`].

use crate::building::Building;
use crate::config::SimConfig;
use crate::economy::Ledger;
use crate::engine::Simulation;
use crate::event::EventBus;
use crate::grid::Grid;
use crate::id::BuildingId;
use crate::item::ItemIds;
use crate::sim::SimState;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a simulation snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xF0D2_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header stored ahead of the payload for format and version checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Read only the header of a serialized snapshot.
///
/// bitcode has no partial decoding, so this decodes the full payload.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: SimulationSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

// ---------------------------------------------------------------------------
// Serializable state
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SimulationSnapshot {
    header: SnapshotHeader,
    config: SimConfig,
    grid: Grid,
    buildings: SlotMap<BuildingId, Building>,
    ledger: Ledger,
    sim_state: SimState,
    item_ids: ItemIds,
    last_state_hash: u64,
}

impl Simulation {
    /// Encode the full simulation state.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = SimulationSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            config: self.config.clone(),
            grid: self.grid.clone(),
            buildings: self.buildings.clone(),
            ledger: self.ledger.clone(),
            sim_state: self.sim_state.clone(),
            item_ids: self.item_ids.clone(),
            last_state_hash: self.last_state_hash,
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Rebuild a simulation from [`serialize`](Self::serialize) output.
    /// The event bus starts empty.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: SimulationSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        Ok(Simulation {
            config: snapshot.config,
            grid: snapshot.grid,
            buildings: snapshot.buildings,
            ledger: snapshot.ledger,
            sim_state: snapshot.sim_state,
            item_ids: snapshot.item_ids,
            last_state_hash: snapshot.last_state_hash,
            event_bus: EventBus::default(),
        })
    }
}
