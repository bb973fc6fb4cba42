pub mod config;
pub mod constants;
pub mod error;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{
    ChannelConfig, ChannelLink, DependenceType, ExteriorConfig, SimulationConfig, SpeciesConfig,
    Timing, VesicleConfig,
};
pub use constants::{FARADAY_CONSTANT, HYDROGEN_SPECIES, IDEAL_GAS_CONSTANT, LITERS_PER_CUBIC_METER};
pub use error::ConfigError;
pub use snapshot::HistoriesSnapshot;
