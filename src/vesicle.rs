use log::warn;
use std::f64::consts::PI;

use crate::trackable::Trackable;
use vesicle_common::constants::MAX_INIT_VOLTAGE;
use vesicle_common::VesicleConfig;

/// Physical state of the simulated compartment.
///
/// The `init_*` values are fixed at construction. The live values start equal to
/// them and are advanced by [`crate::Simulation`] once per step.
#[derive(Debug, Clone)]
pub struct Vesicle {
    display_name: String,
    specific_capacitance: f64, // F/m^2

    init_radius: f64,
    init_voltage: f64,
    init_ph: f64,
    init_volume: f64,
    init_area: f64,
    init_capacitance: f64,
    init_charge: f64,

    volume: f64,      // m^3
    area: f64,        // m^2
    capacitance: f64, // F
    charge: f64,      // C
    voltage: f64,     // V
    ph: f64,
}

impl Vesicle {
    pub fn new(config: &VesicleConfig) -> Self {
        let init_voltage = clamp_init_voltage(config.init_voltage);
        let radius = config.init_radius;

        let init_volume = 4.0 / 3.0 * PI * radius.powi(3);
        let init_area = 4.0 * PI * radius.powi(2);
        let init_capacitance = init_area * config.specific_capacitance;
        let init_charge = init_voltage * init_capacitance;

        Vesicle {
            display_name: config.display_name.clone(),
            specific_capacitance: config.specific_capacitance,
            init_radius: radius,
            init_voltage,
            init_ph: config.init_ph,
            init_volume,
            init_area,
            init_capacitance,
            init_charge,
            volume: init_volume,
            area: init_area,
            capacitance: init_capacitance,
            charge: init_charge,
            voltage: init_voltage,
            ph: config.init_ph,
        }
    }

    /// Area of a sphere with the current volume.
    pub fn update_area(&mut self) {
        self.area = (36.0 * PI).powf(1.0 / 3.0) * self.volume.powf(2.0 / 3.0);
    }

    pub fn update_capacitance(&mut self) {
        self.capacitance = self.area * self.specific_capacitance;
    }

    pub(crate) fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    pub(crate) fn set_charge(&mut self, charge: f64) {
        self.charge = charge;
    }

    pub(crate) fn set_voltage(&mut self, voltage: f64) {
        self.voltage = voltage;
    }

    pub(crate) fn set_ph(&mut self, ph: f64) {
        self.ph = ph;
    }

    pub fn specific_capacitance(&self) -> f64 {
        self.specific_capacitance
    }

    pub fn init_radius(&self) -> f64 {
        self.init_radius
    }

    /// Initial voltage after clamping.
    pub fn init_voltage(&self) -> f64 {
        self.init_voltage
    }

    pub fn init_ph(&self) -> f64 {
        self.init_ph
    }

    pub fn init_volume(&self) -> f64 {
        self.init_volume
    }

    pub fn init_area(&self) -> f64 {
        self.init_area
    }

    pub fn init_capacitance(&self) -> f64 {
        self.init_capacitance
    }

    pub fn init_charge(&self) -> f64 {
        self.init_charge
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn capacitance(&self) -> f64 {
        self.capacitance
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    pub fn ph(&self) -> f64 {
        self.ph
    }
}

fn clamp_init_voltage(voltage: f64) -> f64 {
    if voltage.abs() > MAX_INIT_VOLTAGE {
        let clamped = voltage.clamp(-MAX_INIT_VOLTAGE, MAX_INIT_VOLTAGE);
        warn!(
            "Initial voltage {} V is outside [-{max}, {max}] V, clamping to {}",
            voltage,
            clamped,
            max = MAX_INIT_VOLTAGE
        );
        clamped
    } else {
        voltage
    }
}

impl Trackable for Vesicle {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn current_state(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("pH", self.ph),
            ("volume", self.volume),
            ("area", self.area),
            ("capacitance", self.capacitance),
            ("charge", self.charge),
            ("voltage", self.voltage),
        ]
    }
}
