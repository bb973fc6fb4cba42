//! Configuration builders shared by the integration tests.

#![allow(dead_code)]

use vesicle_engine::{ChannelConfig, Simulation, SimulationConfig, SpeciesConfig};

/// A single hydrogen species leaking through one channel.
pub fn hydrogen_only(conductance: f64) -> SimulationConfig {
    SimulationConfig::new(0.001, 0.1)
        .with_species("h", SpeciesConfig::new(1e-7, 1e-7, 1.0))
        .with_channel("hleak", ChannelConfig::single("h", conductance))
        .with_link("h", "hleak", None)
}

/// Four species with gated, exchanging and plain channels.
pub fn mixed(conductance_scale: f64) -> SimulationConfig {
    let asor = ChannelConfig {
        dependence_type: Some("voltage_and_pH".to_string()),
        voltage_exponent: Some(80.0),
        half_act_voltage: Some(-0.04),
        ph_exponent: Some(3.0),
        half_act_ph: Some(5.4),
        ..ChannelConfig::single("cl", 8e-5 * conductance_scale)
    };
    let clc = ChannelConfig {
        nernst_multiplier: 1.0 / 3.0,
        flux_multiplier: 2.0,
        primary_exponent: 2,
        use_free_hydrogen: true,
        ..ChannelConfig::exchanger("cl", "h", 1e-7 * conductance_scale)
    };
    let nhe = ChannelConfig {
        voltage_multiplier: 0.0,
        custom_nernst_constant: Some(1.0),
        use_free_hydrogen: true,
        ..ChannelConfig::exchanger("na", "h", 1e-8 * conductance_scale)
    };
    let tpc = ChannelConfig {
        voltage_multiplier: -1.0,
        ..ChannelConfig::single("na", 2e-6 * conductance_scale)
    };
    let hleak = ChannelConfig {
        voltage_multiplier: -1.0,
        use_free_hydrogen: true,
        ..ChannelConfig::single("h", 1.6e-8 * conductance_scale)
    };
    let k_channel = ChannelConfig {
        voltage_multiplier: -1.0,
        ..ChannelConfig::single("k", 1e-7 * conductance_scale)
    };

    SimulationConfig::new(0.001, 0.2)
        .with_species("cl", SpeciesConfig::new(0.159, 0.02, -1.0))
        .with_species("h", SpeciesConfig::new(7.962143411069939e-05, 0.0001261914688960386, 1.0))
        .with_species("na", SpeciesConfig::new(0.15, 0.01, 1.0))
        .with_species("k", SpeciesConfig::new(0.005, 0.14, 1.0))
        .with_channel("asor", asor)
        .with_channel("clc", clc)
        .with_channel("nhe", nhe)
        .with_channel("tpc", tpc)
        .with_channel("hleak", hleak)
        .with_channel("k_channel", k_channel)
        .with_link("cl", "asor", None)
        .with_link("cl", "clc", Some("h"))
        .with_link("na", "tpc", None)
        .with_link("h", "nhe", Some("na"))
        .with_link("h", "hleak", None)
        .with_link("k", "k_channel", None)
}

pub fn load(config: SimulationConfig) -> Simulation {
    Simulation::load(config).expect("test configuration should load")
}

pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected == 0.0 {
        actual.abs()
    } else {
        ((actual - expected) / expected).abs()
    }
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64, what: &str) {
    assert!(
        relative_error(actual, expected) <= tolerance,
        "{}: expected {:e}, got {:e} (relative error {:e})",
        what,
        expected,
        actual,
        relative_error(actual, expected)
    );
}
