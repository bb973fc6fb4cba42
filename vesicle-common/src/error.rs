use thiserror::Error;

/// Fatal problems with a simulation configuration.
///
/// Any of these aborts loading; a `Simulation` is never handed out in a
/// partially wired state.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{origin}': {message}")]
    Parse { origin: String, message: String },

    #[error("missing required parameter: {0}")]
    MissingField(&'static str),

    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("channel '{channel}' has unknown dependence_type '{value}'")]
    UnknownDependenceType { channel: String, value: String },

    #[error("channel '{channel}' does not define allowed_primary_ion")]
    MissingAllowedIon { channel: String },

    #[error("link for species '{species}' references unknown channel '{channel}'")]
    UnknownChannel { species: String, channel: String },

    #[error("{context} references unknown species '{species}'")]
    UnknownSpecies { species: String, context: String },

    #[error(
        "channel '{channel}' does not support the provided ion species: primary='{primary}', secondary='{}' (expected {expected})",
        .secondary.as_deref().unwrap_or("none")
    )]
    IncompatibleChannel {
        channel: String,
        primary: String,
        secondary: Option<String>,
        expected: String,
    },

    #[error("two-ion channel '{channel}' requires a secondary ion species for '{species}'")]
    MissingSecondarySpecies { channel: String, species: String },

    #[error("single-ion channel '{channel}' connected to '{species}' cannot take secondary species '{secondary}'")]
    UnexpectedSecondarySpecies {
        channel: String,
        species: String,
        secondary: String,
    },

    #[error("channel '{channel}' is already connected to '{species}'")]
    ChannelAlreadyConnected { channel: String, species: String },

    #[error("channel '{channel}' has no primary species connected")]
    UnconnectedChannel { channel: String },

    #[error("name conflict: \"{name}\" is already used by another tracked object")]
    DuplicateName { name: String },
}
