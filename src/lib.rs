//! Lumped-parameter simulation of ion transport across a vesicle membrane.
//!
//! A [`Simulation`] is built once from a [`SimulationConfig`], then stepped with
//! [`Simulation::run_one_iteration`] or [`Simulation::run`]. Every step records the
//! state of each tracked object into a [`HistoriesStorage`], exported as a flat
//! [`HistoriesSnapshot`].

pub mod error;
pub mod exterior;
pub mod flux_params;
pub mod histories;
pub mod ion_channel;
pub mod ion_species;
pub mod simulation;
pub mod trackable;
pub mod vesicle;

pub use error::{HistoryError, SimulationError};
pub use exterior::Exterior;
pub use flux_params::FluxCalculationParameters;
pub use histories::HistoriesStorage;
pub use ion_channel::IonChannel;
pub use ion_species::IonSpecies;
pub use simulation::Simulation;
pub use trackable::Trackable;
pub use vesicle::Vesicle;

// Re-export the shared configuration types so callers need a single dependency
pub use vesicle_common::{
    constants, ChannelConfig, ChannelLink, ConfigError, DependenceType, ExteriorConfig, HistoriesSnapshot,
    SimulationConfig, SpeciesConfig, VesicleConfig, FARADAY_CONSTANT, HYDROGEN_SPECIES,
    IDEAL_GAS_CONSTANT, LITERS_PER_CUBIC_METER,
};
