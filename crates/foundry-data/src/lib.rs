//! Foundry Data -- scenario loading from RON, TOML or JSON data files.

pub mod loader;
pub mod scenario;
pub mod schema;

pub use loader::DataLoadError;
pub use scenario::{Scenario, load_scenario, load_simulation};
