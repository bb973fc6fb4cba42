//! End-to-end behaviour of small, hand-checkable configurations.

mod common;

use common::{assert_close, hydrogen_only, load};
use vesicle_engine::{
    ChannelConfig, ConfigError, Simulation, SimulationConfig, SpeciesConfig, Trackable, VesicleConfig,
};

#[test]
fn test_zero_conductance_iteration_changes_nothing() {
    let mut sim = load(hydrogen_only(0.0));
    let h = &sim.species()[0];
    let (conc, amount) = (h.vesicle_conc(), h.vesicle_amount());
    let init_charge = sim.vesicle().init_charge();

    sim.run_one_iteration().unwrap();

    let h = &sim.species()[0];
    assert_eq!(h.vesicle_amount(), amount, "no flux means no amount change");
    assert_close(h.vesicle_conc(), conc, 1e-12, "concentration");
    assert_close(sim.vesicle().charge(), init_charge, 1e-9, "charge");
    assert_close(sim.vesicle().voltage(), 0.04, 1e-9, "voltage");
    assert_eq!(sim.vesicle().volume(), sim.vesicle().init_volume());
    assert_eq!(sim.channel_by_name("hleak").unwrap().flux(), 0.0);
}

#[test]
fn test_exchanger_accepts_reversed_role_order() {
    let config = SimulationConfig::new(0.001, 0.01)
        .with_species("na", SpeciesConfig::new(0.15, 0.01, 1.0))
        .with_species("h", SpeciesConfig::new(8e-5, 1.2e-4, 1.0))
        .with_channel("nhe", ChannelConfig::exchanger("na", "h", 1e-8))
        .with_link("h", "nhe", Some("na"));
    let mut sim = load(config);

    let nhe = sim.channel_by_name("nhe").unwrap();
    let na_index = sim.species().iter().position(|s| s.display_name() == "na").unwrap();
    let h_index = sim.species().iter().position(|s| s.display_name() == "h").unwrap();
    assert_eq!(nhe.primary(), Some(na_index));
    assert_eq!(nhe.secondary(), Some(h_index));
    assert!(sim.species_by_name("na").unwrap().channels().is_empty());
    assert_eq!(sim.species_by_name("h").unwrap().channels().len(), 1);

    // The exchanger's flux moves hydrogen, na stays put
    let na_amount = sim.species_by_name("na").unwrap().vesicle_amount();
    sim.run_one_iteration().unwrap();
    assert_eq!(sim.species_by_name("na").unwrap().vesicle_amount(), na_amount);
}

#[test]
fn test_mismatched_exchanger_is_rejected() {
    let config = SimulationConfig::new(0.001, 0.01)
        .with_species("na", SpeciesConfig::new(0.15, 0.01, 1.0))
        .with_species("h", SpeciesConfig::new(8e-5, 1.2e-4, 1.0))
        .with_channel("nhe", ChannelConfig::exchanger("na", "cl", 1e-8))
        .with_link("h", "nhe", Some("na"));

    match Simulation::load(config) {
        Err(ConfigError::IncompatibleChannel { channel, primary, .. }) => {
            assert_eq!(channel, "nhe");
            assert_eq!(primary, "h");
        }
        Err(other) => panic!("expected IncompatibleChannel, got {}", other),
        Ok(_) => panic!("mismatched exchanger should not load"),
    }
}

#[test]
fn test_large_outward_flux_clamps_amount_to_zero() {
    let channel = ChannelConfig {
        voltage_multiplier: 0.0,
        ..ChannelConfig::single("na", 1e3)
    };
    let config = SimulationConfig::new(1.0, 10.0)
        .with_species("na", SpeciesConfig::new(0.1, 0.01, 1.0))
        .with_channel("tpc", channel)
        .with_link("na", "tpc", None);
    let mut sim = load(config);

    sim.run_one_iteration().unwrap();
    let first_flux = sim.channel_by_name("tpc").unwrap().flux();
    assert!(first_flux < 0.0, "flux should be outward, got {}", first_flux);

    let na = sim.species_by_name("na").unwrap();
    assert_eq!(na.vesicle_amount(), 0.0);
    assert_eq!(na.vesicle_conc(), 1e-9, "concentration is floored, not zero");

    sim.run_one_iteration().unwrap();
    let expected = sim.nernst_constant() * (0.01f64 / 1e-9).ln();
    assert_close(
        sim.channel_by_name("tpc").unwrap().nernst_potential(),
        expected,
        1e-12,
        "Nernst potential after clamping",
    );
    assert!(sim.species_by_name("na").unwrap().vesicle_amount() > 0.0);
}

#[test]
fn test_unbuffered_hydrogen_keeps_configured_ph() {
    let mut config = hydrogen_only(1e-6);
    config.init_buffer_capacity = 0.0;
    config.vesicle_params = VesicleConfig {
        init_ph: 6.5,
        ..VesicleConfig::default()
    };
    let mut sim = load(config);
    assert_eq!(sim.flux_parameters().vesicle_hydrogen_free, 0.0);

    sim.run_one_iteration().unwrap();
    assert_eq!(sim.vesicle().ph(), 6.5);
    assert_eq!(sim.buffer_capacity(), 0.0);
    assert_eq!(sim.histories().history("Vesicle_pH"), Some(&[6.5][..]));

    sim.run_one_iteration().unwrap();
    assert_eq!(sim.vesicle().ph(), 6.5);
}

#[test]
fn test_full_run_produces_consistent_histories() {
    let mut sim = load(common::mixed(1.0));
    sim.run(|_| {}).unwrap();

    let histories = sim.export_histories();
    let points = sim.iteration_count() as usize + 1;
    assert_eq!(histories.point_count(), points);
    for (key, values) in histories.iter() {
        assert_eq!(values.len(), points, "history {} has the wrong length", key);
        assert!(values.iter().all(|v| v.is_finite()), "history {} has non-finite values", key);
    }

    for key in ["Vesicle_voltage", "Exterior_pH", "cl_vesicle_conc", "asor_pH_dependence", "tpc_flux"] {
        assert!(histories.contains_key(key), "missing history {}", key);
    }
    assert!(!histories.contains_key("tpc_voltage_dependence"));
    assert_eq!(
        histories.get("Vesicle_voltage").unwrap().last().copied(),
        Some(sim.vesicle().voltage())
    );
    assert_eq!(sim.vesicle().current_state().len(), 6);
}
