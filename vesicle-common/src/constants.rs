//! Physical constants and unit conversions shared by the engine and its consumers.

/// Ideal gas constant, J/(mol*K).
pub const IDEAL_GAS_CONSTANT: f64 = 8.31446261815324;

/// Faraday constant, C/mol.
pub const FARADAY_CONSTANT: f64 = 96485.0;

/// Volumes are tracked in m^3, concentrations in mol/L.
pub const LITERS_PER_CUBIC_METER: f64 = 1000.0;

/// Name of the species whose concentration drives the vesicle pH.
pub const HYDROGEN_SPECIES: &str = "h";

/// Floor applied when a vesicle concentration would become zero or negative (mol/L).
pub const MIN_VESICLE_CONCENTRATION: f64 = 1e-9;

/// Typical voltage gate parameters, used to derive the safe initial voltage range.
pub const TYPICAL_VOLTAGE_EXPONENT: f64 = 80.0;
pub const TYPICAL_HALF_ACT_VOLTAGE: f64 = -0.04;

/// Largest |voltage| for which `exp(80 * (v + 0.04))` stays representable.
pub const MAX_INIT_VOLTAGE: f64 = 709.0 / TYPICAL_VOLTAGE_EXPONENT + TYPICAL_HALF_ACT_VOLTAGE;
