use thiserror::Error;
use vesicle_common::ConfigError;

/// Failures of the time-series recorder.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("duplicate object: an object with the name \"{name}\" has already been registered")]
    DuplicateObject { name: String },

    #[error("object \"{name}\" was never registered with the histories")]
    UnregisteredObject { name: String },

    #[error("registered object \"{name}\" was not supplied for recording")]
    MissingObject { name: String },

    #[error("object \"{name}\" reported field \"{field}\" that was not registered")]
    UnknownField { name: String, field: String },
}

/// Anything that can abort a running simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    History(#[from] HistoryError),
}
