//! Foundry Core -- the simulation core of a grid-based factory game.
//!
//! A fixed 2-D grid holds at most one building per cell. Every step, water
//! is re-flooded from pumps through pipes, then each building advances its
//! own production and hands its output item to a neighbor. Items are owned
//! by exactly one building at a time; they are only created by miners,
//! recipes and the debug spawner, and only disappear into recipes, sellers
//! or demolition.
//!
//! # Step Pipeline
//!
//! Each call to [`engine::Simulation::step`]:
//!
//! 1. **Water** -- Breadth-first flood from grounded pumps sets `has_water`.
//! 2. **Buildings** -- Row-major; each building ticks, then offers output.
//! 3. **Bookkeeping** -- Clock, state hash, event delivery.
//!
//! # Key Types
//!
//! - [`engine::Simulation`] -- Owns all state; commands, step and queries.
//! - [`building::Building`] -- A placed building; behavior per
//!   [`building::Machine`] variant.
//! - [`grid::Grid`] -- Cell table mapping coordinates to buildings, plus
//!   terrain.
//! - [`item::Item`] -- A valued unit of production.
//! - [`economy::Ledger`] -- Non-negative currency balance.
//! - [`event::EventBus`] -- Typed events with per-kind buffers and listeners.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic timing.
//! - [`serialize`] -- Versioned binary snapshots via bitcode.

pub mod building;
pub mod config;
pub mod economy;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod item;
pub mod query;
pub mod rng;
pub mod serialize;
pub mod sim;
pub mod water;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
