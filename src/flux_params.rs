use serde::{Deserialize, Serialize};

/// Snapshot of the compartment state handed to every channel when computing flux.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FluxCalculationParameters {
    /// Membrane voltage (V).
    pub voltage: f64,
    /// Vesicle pH.
    pub ph: f64,
    /// Simulation time (s).
    pub time: f64,
    /// Membrane area (m^2).
    pub area: f64,
    /// RT/F (V).
    pub nernst_constant: f64,
    // Unbuffered hydrogen concentrations (mol/L)
    pub vesicle_hydrogen_free: f64,
    pub exterior_hydrogen_free: f64,
}
