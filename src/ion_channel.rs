use log::warn;

use crate::flux_params::FluxCalculationParameters;
use crate::ion_species::IonSpecies;
use crate::trackable::Trackable;
use vesicle_common::{ChannelConfig, ConfigError, DependenceType, HYDROGEN_SPECIES};

/// `1 / (1 + exp(exponent * (x - half_activation)))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticGate {
    pub exponent: f64,
    pub half_activation: f64,
}

impl LogisticGate {
    /// A gate only exists when both of its parameters are configured.
    fn from_params(exponent: Option<f64>, half_activation: Option<f64>) -> Option<Self> {
        match (exponent, half_activation) {
            (Some(exponent), Some(half_activation)) => Some(LogisticGate {
                exponent,
                half_activation,
            }),
            _ => None,
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        1.0 / (1.0 + (self.exponent * (x - self.half_activation)).exp())
    }
}

/// A membrane transporter moving one ion species, or exchanging two.
///
/// Species links are indices into the owning simulation's species list,
/// resolved once at load.
#[derive(Debug, Clone)]
pub struct IonChannel {
    display_name: String,
    conductance: f64,
    channel_type: Option<String>,
    dependence: DependenceType,
    voltage_multiplier: f64,
    nernst_multiplier: f64,
    voltage_shift: f64,
    flux_multiplier: f64,
    allowed_primary: String,
    allowed_secondary: Option<String>,
    primary_exponent: i32,
    secondary_exponent: i32,
    custom_nernst_constant: Option<f64>,
    use_free_hydrogen: bool,
    voltage_gate: Option<LogisticGate>,
    ph_gate: Option<LogisticGate>,
    time_gate: Option<LogisticGate>,

    primary: Option<usize>,
    secondary: Option<usize>,

    // Telemetry from the latest compute_flux
    flux: f64,
    nernst_potential: f64,
    ph_dependence: f64,
    voltage_dependence: f64,
    time_dependence: f64,
}

impl IonChannel {
    pub fn new(name: &str, config: &ChannelConfig) -> Result<Self, ConfigError> {
        let dependence = config.dependence(name)?;
        let allowed_primary = config
            .allowed_primary()
            .ok_or_else(|| ConfigError::MissingAllowedIon {
                channel: name.to_string(),
            })?
            .to_string();

        Ok(IonChannel {
            display_name: name.to_string(),
            conductance: config.conductance,
            channel_type: config.channel_type.clone(),
            dependence,
            voltage_multiplier: config.voltage_multiplier,
            nernst_multiplier: config.nernst_multiplier,
            voltage_shift: config.voltage_shift,
            flux_multiplier: config.flux_multiplier,
            allowed_primary,
            allowed_secondary: config.allowed_secondary().map(str::to_string),
            primary_exponent: config.primary_exponent,
            secondary_exponent: config.secondary_exponent,
            custom_nernst_constant: config.custom_nernst_constant,
            use_free_hydrogen: config.use_free_hydrogen,
            voltage_gate: LogisticGate::from_params(config.voltage_exponent, config.half_act_voltage),
            ph_gate: LogisticGate::from_params(config.ph_exponent, config.half_act_ph),
            time_gate: LogisticGate::from_params(config.time_exponent, config.half_act_time),
            primary: None,
            secondary: None,
            flux: 0.0,
            nernst_potential: 0.0,
            ph_dependence: 1.0,
            voltage_dependence: 1.0,
            time_dependence: 1.0,
        })
    }

    /// Records the species this channel acts on. A channel is wired exactly once.
    pub(crate) fn connect(
        &mut self,
        primary: usize,
        secondary: Option<usize>,
        linking_species: &str,
    ) -> Result<(), ConfigError> {
        if self.primary.is_some() {
            return Err(ConfigError::ChannelAlreadyConnected {
                channel: self.display_name.clone(),
                species: linking_species.to_string(),
            });
        }
        self.primary = Some(primary);
        self.secondary = secondary;
        Ok(())
    }

    /// Flux of the primary ion into the vesicle (mol/s) for the given state.
    ///
    /// Also stores the Nernst potential, the gate values and the flux itself for
    /// recording.
    pub fn compute_flux(
        &mut self,
        species: &[IonSpecies],
        params: &FluxCalculationParameters,
    ) -> Result<f64, ConfigError> {
        let primary = self.primary.ok_or_else(|| ConfigError::UnconnectedChannel {
            channel: self.display_name.clone(),
        })?;

        if self.conductance == 0.0 {
            return Ok(0.0);
        }

        let ph_dependence = self.ph_dependence(params.ph);
        let voltage_dependence = self.voltage_dependence(params.voltage);
        let time_dependence = self.time_dependence(params.time);

        let log_term = self.log_term(species, primary, params);
        let nernst_potential = self.voltage_multiplier * params.voltage
            + self.nernst_multiplier * self.nernst_constant(params) * log_term
            - self.voltage_shift;

        let flux = self.flux_multiplier
            * nernst_potential
            * self.conductance
            * params.area
            * (ph_dependence * voltage_dependence * time_dependence);

        self.ph_dependence = ph_dependence;
        self.voltage_dependence = voltage_dependence;
        self.time_dependence = time_dependence;
        self.nernst_potential = nernst_potential;
        self.flux = flux;
        Ok(flux)
    }

    fn ph_dependence(&self, ph: f64) -> f64 {
        match self.ph_gate {
            Some(gate) if self.dependence.uses_ph() => gate.evaluate(ph),
            _ => 1.0,
        }
    }

    fn voltage_dependence(&self, voltage: f64) -> f64 {
        match self.voltage_gate {
            Some(gate) if self.dependence.uses_voltage() => {
                gate.evaluate(voltage * self.voltage_multiplier - self.voltage_shift)
            }
            _ => 1.0,
        }
    }

    fn time_dependence(&self, time: f64) -> f64 {
        match self.time_gate {
            Some(gate) if self.dependence.uses_time() => gate.evaluate(time),
            _ => 1.0,
        }
    }

    fn nernst_constant(&self, params: &FluxCalculationParameters) -> f64 {
        match self.custom_nernst_constant {
            Some(constant) if constant != 0.0 => constant,
            _ => params.nernst_constant,
        }
    }

    // (exterior, vesicle) concentrations as seen by this channel
    fn concentrations(&self, species: &IonSpecies, params: &FluxCalculationParameters) -> (f64, f64) {
        if self.use_free_hydrogen && species.display_name() == HYDROGEN_SPECIES {
            (params.exterior_hydrogen_free, params.vesicle_hydrogen_free)
        } else {
            (species.exterior_conc(), species.vesicle_conc())
        }
    }

    fn log_term(&self, species: &[IonSpecies], primary: usize, params: &FluxCalculationParameters) -> f64 {
        let (exterior_primary, vesicle_primary) = self.concentrations(&species[primary], params);
        let primary_exponent = f64::from(self.primary_exponent);

        let Some(secondary) = self.secondary else {
            if exterior_primary <= 0.0 || vesicle_primary <= 0.0 {
                warn!(
                    "Channel '{}': non-positive concentration (exterior {}, vesicle {}), using zero log term",
                    self.display_name, exterior_primary, vesicle_primary
                );
                return 0.0;
            }
            return (exterior_primary / vesicle_primary).powf(primary_exponent).ln();
        };

        let (exterior_secondary, vesicle_secondary) = self.concentrations(&species[secondary], params);
        let ratio = (exterior_primary / vesicle_primary).powf(primary_exponent)
            * (vesicle_secondary / exterior_secondary).powf(f64::from(self.secondary_exponent));
        if !(ratio > 0.0) || !ratio.is_finite() {
            warn!(
                "Channel '{}': log term ratio {} is not positive and finite, using zero log term",
                self.display_name, ratio
            );
            return 0.0;
        }
        ratio.ln()
    }

    pub fn conductance(&self) -> f64 {
        self.conductance
    }

    /// Free-form label; carries no behavior.
    pub fn channel_type(&self) -> Option<&str> {
        self.channel_type.as_deref()
    }

    pub fn dependence(&self) -> DependenceType {
        self.dependence
    }

    pub fn allowed_primary(&self) -> &str {
        &self.allowed_primary
    }

    pub fn allowed_secondary(&self) -> Option<&str> {
        self.allowed_secondary.as_deref()
    }

    pub fn primary(&self) -> Option<usize> {
        self.primary
    }

    pub fn secondary(&self) -> Option<usize> {
        self.secondary
    }

    pub fn is_connected(&self) -> bool {
        self.primary.is_some()
    }

    pub fn flux(&self) -> f64 {
        self.flux
    }

    pub fn nernst_potential(&self) -> f64 {
        self.nernst_potential
    }
}

impl Trackable for IonChannel {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn current_state(&self) -> Vec<(&'static str, f64)> {
        let mut state = vec![("flux", self.flux), ("nernst_potential", self.nernst_potential)];
        if self.dependence.uses_ph() {
            state.push(("pH_dependence", self.ph_dependence));
        }
        if self.dependence.uses_voltage() {
            state.push(("voltage_dependence", self.voltage_dependence));
        }
        if self.dependence.uses_time() {
            state.push(("time_dependence", self.time_dependence));
        }
        state
    }
}
