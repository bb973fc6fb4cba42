use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::constants::{FARADAY_CONSTANT, IDEAL_GAS_CONSTANT};
use crate::error::ConfigError;

// Parameters of the simulated compartment
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct VesicleConfig {
    #[serde(default = "default_init_radius")]
    pub init_radius: f64, // m
    #[serde(default = "default_init_voltage")]
    pub init_voltage: f64, // V
    #[serde(default = "default_init_ph", rename = "init_pH")]
    pub init_ph: f64,
    #[serde(default = "default_specific_capacitance")]
    pub specific_capacitance: f64, // F/m^2
    #[serde(default = "default_vesicle_name")]
    pub display_name: String,
}

impl Default for VesicleConfig {
    fn default() -> Self {
        VesicleConfig {
            init_radius: default_init_radius(),
            init_voltage: default_init_voltage(),
            init_ph: default_init_ph(),
            specific_capacitance: default_specific_capacitance(),
            display_name: default_vesicle_name(),
        }
    }
}

// Parameters of the surrounding medium
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ExteriorConfig {
    #[serde(default = "default_exterior_ph", rename = "pH")]
    pub ph: f64,
    #[serde(default = "default_exterior_name")]
    pub display_name: String,
}

impl Default for ExteriorConfig {
    fn default() -> Self {
        ExteriorConfig {
            ph: default_exterior_ph(),
            display_name: default_exterior_name(),
        }
    }
}

// One ion species; the map key is its name
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SpeciesConfig {
    #[serde(default)]
    pub init_vesicle_conc: f64, // mol/L
    #[serde(default)]
    pub exterior_conc: f64, // mol/L
    #[serde(default)]
    pub elementary_charge: f64,
}

impl SpeciesConfig {
    pub fn new(init_vesicle_conc: f64, exterior_conc: f64, elementary_charge: f64) -> Self {
        SpeciesConfig {
            init_vesicle_conc,
            exterior_conc,
            elementary_charge,
        }
    }
}

/// Which logistic gates a channel applies to its flux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependenceType {
    #[default]
    None,
    Voltage,
    PH,
    Time,
    VoltageAndPH,
}

impl DependenceType {
    /// Parses the configuration spelling. Absent, empty and `"none"` all mean no gating.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value {
            None | Some("") | Some("none") | Some("None") => Some(DependenceType::None),
            Some("voltage") => Some(DependenceType::Voltage),
            Some("pH") => Some(DependenceType::PH),
            Some("time") => Some(DependenceType::Time),
            Some("voltage_and_pH") => Some(DependenceType::VoltageAndPH),
            Some(_) => None,
        }
    }

    pub fn uses_voltage(self) -> bool {
        matches!(self, DependenceType::Voltage | DependenceType::VoltageAndPH)
    }

    pub fn uses_ph(self) -> bool {
        matches!(self, DependenceType::PH | DependenceType::VoltageAndPH)
    }

    pub fn uses_time(self) -> bool {
        self == DependenceType::Time
    }
}

// Parameters of one ion channel; the map key is its name
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    #[serde(default)]
    pub conductance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependence_type: Option<String>,
    #[serde(default = "default_multiplier")]
    pub voltage_multiplier: f64,
    #[serde(default = "default_multiplier")]
    pub nernst_multiplier: f64,
    #[serde(default)]
    pub voltage_shift: f64,
    #[serde(default = "default_multiplier")]
    pub flux_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_primary_ion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_secondary_ion: Option<String>,
    #[serde(default = "default_exponent")]
    pub primary_exponent: i32,
    #[serde(default = "default_exponent")]
    pub secondary_exponent: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_nernst_constant: Option<f64>,
    #[serde(default)]
    pub use_free_hydrogen: bool,

    // Gate parameters; a gate with either value unset is the identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_exponent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_act_voltage: Option<f64>,
    #[serde(default, rename = "pH_exponent", skip_serializing_if = "Option::is_none")]
    pub ph_exponent: Option<f64>,
    #[serde(default, rename = "half_act_pH", skip_serializing_if = "Option::is_none")]
    pub half_act_ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_exponent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_act_time: Option<f64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            conductance: 0.0,
            channel_type: None,
            dependence_type: None,
            voltage_multiplier: default_multiplier(),
            nernst_multiplier: default_multiplier(),
            voltage_shift: 0.0,
            flux_multiplier: default_multiplier(),
            allowed_primary_ion: None,
            allowed_secondary_ion: None,
            primary_exponent: default_exponent(),
            secondary_exponent: default_exponent(),
            custom_nernst_constant: None,
            use_free_hydrogen: false,
            voltage_exponent: None,
            half_act_voltage: None,
            ph_exponent: None,
            half_act_ph: None,
            time_exponent: None,
            half_act_time: None,
        }
    }
}

impl ChannelConfig {
    /// A single-ion channel for `primary` with the given conductance and unit multipliers.
    pub fn single(primary: &str, conductance: f64) -> Self {
        ChannelConfig {
            conductance,
            allowed_primary_ion: Some(primary.to_string()),
            ..ChannelConfig::default()
        }
    }

    /// A two-ion channel exchanging `primary` against `secondary`.
    pub fn exchanger(primary: &str, secondary: &str, conductance: f64) -> Self {
        ChannelConfig {
            allowed_secondary_ion: Some(secondary.to_string()),
            ..ChannelConfig::single(primary, conductance)
        }
    }

    pub fn dependence(&self, channel: &str) -> Result<DependenceType, ConfigError> {
        DependenceType::parse(self.dependence_type.as_deref()).ok_or_else(|| {
            ConfigError::UnknownDependenceType {
                channel: channel.to_string(),
                value: self.dependence_type.clone().unwrap_or_default(),
            }
        })
    }

    /// The allowed secondary ion, treating an empty name as "none".
    pub fn allowed_secondary(&self) -> Option<&str> {
        self.allowed_secondary_ion.as_deref().filter(|name| !name.is_empty())
    }

    pub fn allowed_primary(&self) -> Option<&str> {
        self.allowed_primary_ion.as_deref().filter(|name| !name.is_empty())
    }
}

/// One `[channel_name, secondary_species_or_null]` entry of `ion_channel_links`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "Vec<Option<String>>", into = "Vec<Option<String>>")]
pub struct ChannelLink {
    pub channel: String,
    pub secondary: Option<String>,
}

impl ChannelLink {
    pub fn new(channel: &str, secondary: Option<&str>) -> Self {
        ChannelLink {
            channel: channel.to_string(),
            secondary: secondary.map(str::to_string),
        }
    }
}

impl TryFrom<Vec<Option<String>>> for ChannelLink {
    type Error = String;

    fn try_from(entry: Vec<Option<String>>) -> Result<Self, Self::Error> {
        let mut parts = entry.into_iter();
        let channel = match parts.next() {
            Some(Some(name)) if !name.is_empty() => name,
            _ => return Err("link entry must start with a channel name".to_string()),
        };
        let secondary = parts.next().flatten().filter(|name| !name.is_empty());
        if parts.next().is_some() {
            return Err(format!("link entry for channel '{}' has more than two elements", channel));
        }
        Ok(ChannelLink { channel, secondary })
    }
}

impl From<ChannelLink> for Vec<Option<String>> {
    fn from(link: ChannelLink) -> Self {
        vec![Some(link.channel), link.secondary]
    }
}

/// Time stepping parameters, present and positive once validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub time_step: f64,
    pub total_time: f64,
}

// Main simulation configuration document, loaded from JSON (or TOML).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_step: Option<f64>, // s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>, // s
    #[serde(default = "default_simulation_name")]
    pub display_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64, // K
    #[serde(default = "default_buffer_capacity")]
    pub init_buffer_capacity: f64,
    #[serde(default)]
    pub vesicle_params: VesicleConfig,
    #[serde(default)]
    pub exterior_params: ExteriorConfig,
    // Ordered maps: iteration order is part of the numeric contract
    #[serde(default)]
    pub species: BTreeMap<String, SpeciesConfig>,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
    #[serde(default)]
    pub ion_channel_links: BTreeMap<String, Vec<ChannelLink>>,
}

impl SimulationConfig {
    /// An otherwise empty configuration with the given timing and all defaults.
    pub fn new(time_step: f64, total_time: f64) -> Self {
        SimulationConfig {
            time_step: Some(time_step),
            total_time: Some(total_time),
            display_name: default_simulation_name(),
            temperature: default_temperature(),
            init_buffer_capacity: default_buffer_capacity(),
            vesicle_params: VesicleConfig::default(),
            exterior_params: ExteriorConfig::default(),
            species: BTreeMap::new(),
            channels: BTreeMap::new(),
            ion_channel_links: BTreeMap::new(),
        }
    }

    pub fn with_species(mut self, name: &str, species: SpeciesConfig) -> Self {
        self.species.insert(name.to_string(), species);
        self
    }

    pub fn with_channel(mut self, name: &str, channel: ChannelConfig) -> Self {
        self.channels.insert(name.to_string(), channel);
        self
    }

    pub fn with_link(mut self, species: &str, channel: &str, secondary: Option<&str>) -> Self {
        self.ion_channel_links
            .entry(species.to_string())
            .or_default()
            .push(ChannelLink::new(channel, secondary));
        self
    }

    /// Loads and validates a configuration file. `.toml` files are parsed as TOML,
    /// everything else as JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let origin = path_ref.display().to_string();

        let config_str = std::fs::read_to_string(path_ref).map_err(|e| ConfigError::Io {
            path: origin.clone(),
            source: e,
        })?;

        let is_toml = path_ref
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let config: SimulationConfig = if is_toml {
            toml::from_str(&config_str).map_err(|e| ConfigError::Parse {
                origin: origin.clone(),
                message: e.to_string(),
            })?
        } else {
            Self::parse_json(&config_str, &origin)?
        };

        config.validate()?;
        log::debug!(
            "Loaded configuration '{}' from {} ({} species, {} channels)",
            config.display_name,
            origin,
            config.species.len(),
            config.channels.len()
        );
        Ok(config)
    }

    /// Parses an in-memory JSON document. Validation is left to the caller.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::parse_json(json, "<inline>")
    }

    fn parse_json(json: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Checks every parameter and every name reference. Channel/species wiring
    /// compatibility is checked when the engine connects them.
    pub fn validate(&self) -> Result<Timing, ConfigError> {
        let time_step = self.time_step.ok_or(ConfigError::MissingField("time_step"))?;
        let total_time = self.total_time.ok_or(ConfigError::MissingField("total_time"))?;
        require_positive("time_step", time_step)?;
        require_positive("total_time", total_time)?;
        require_positive("temperature", self.temperature)?;
        require_non_negative("init_buffer_capacity", self.init_buffer_capacity)?;

        let vesicle = &self.vesicle_params;
        require_positive("vesicle_params.init_radius", vesicle.init_radius)?;
        require_positive("vesicle_params.specific_capacitance", vesicle.specific_capacitance)?;
        require_finite("vesicle_params.init_voltage", vesicle.init_voltage)?;
        require_finite("vesicle_params.init_pH", vesicle.init_ph)?;
        require_finite("exterior_params.pH", self.exterior_params.ph)?;

        for (name, species) in &self.species {
            require_non_negative(&format!("species.{}.init_vesicle_conc", name), species.init_vesicle_conc)?;
            require_non_negative(&format!("species.{}.exterior_conc", name), species.exterior_conc)?;
            require_finite(&format!("species.{}.elementary_charge", name), species.elementary_charge)?;
        }

        for (name, channel) in &self.channels {
            channel.dependence(name)?;
            if channel.allowed_primary().is_none() {
                return Err(ConfigError::MissingAllowedIon { channel: name.clone() });
            }
            for (field, value) in [
                ("conductance", channel.conductance),
                ("voltage_multiplier", channel.voltage_multiplier),
                ("nernst_multiplier", channel.nernst_multiplier),
                ("voltage_shift", channel.voltage_shift),
                ("flux_multiplier", channel.flux_multiplier),
            ] {
                require_finite(&format!("channels.{}.{}", name, field), value)?;
            }
            for (field, value) in [
                ("voltage_exponent", channel.voltage_exponent),
                ("half_act_voltage", channel.half_act_voltage),
                ("pH_exponent", channel.ph_exponent),
                ("half_act_pH", channel.half_act_ph),
                ("time_exponent", channel.time_exponent),
                ("half_act_time", channel.half_act_time),
                ("custom_nernst_constant", channel.custom_nernst_constant),
            ] {
                if let Some(value) = value {
                    require_finite(&format!("channels.{}.{}", name, field), value)?;
                }
            }
        }

        for (species_name, links) in &self.ion_channel_links {
            if !self.species.contains_key(species_name) {
                return Err(ConfigError::UnknownSpecies {
                    species: species_name.clone(),
                    context: "ion_channel_links".to_string(),
                });
            }
            for link in links {
                if !self.channels.contains_key(&link.channel) {
                    return Err(ConfigError::UnknownChannel {
                        species: species_name.clone(),
                        channel: link.channel.clone(),
                    });
                }
                if let Some(secondary) = &link.secondary {
                    if !self.species.contains_key(secondary) {
                        return Err(ConfigError::UnknownSpecies {
                            species: secondary.clone(),
                            context: format!("link '{}' of species '{}'", link.channel, species_name),
                        });
                    }
                }
            }
        }

        Ok(Timing { time_step, total_time })
    }

    /// RT/F for the configured temperature, in volts.
    pub fn nernst_constant(&self) -> f64 {
        IDEAL_GAS_CONSTANT * self.temperature / FARADAY_CONSTANT
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            field: field.to_string(),
            reason: format!("must be a finite number, got {}", value),
        })
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::InvalidParameter {
            field: field.to_string(),
            reason: format!("must be positive, got {}", value),
        });
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::InvalidParameter {
            field: field.to_string(),
            reason: format!("cannot be negative, got {}", value),
        });
    }
    Ok(())
}

// Default functions for optional parameters
fn default_simulation_name() -> String {
    "simulation".to_string()
}

fn default_temperature() -> f64 {
    2578.5871 / IDEAL_GAS_CONSTANT // ~310 K
}

fn default_buffer_capacity() -> f64 {
    5e-4
}

fn default_init_radius() -> f64 {
    1.3e-6
}

fn default_init_voltage() -> f64 {
    4e-2
}

fn default_init_ph() -> f64 {
    7.4
}

fn default_specific_capacitance() -> f64 {
    1e-2
}

fn default_vesicle_name() -> String {
    "Vesicle".to_string()
}

fn default_exterior_ph() -> f64 {
    7.2
}

fn default_exterior_name() -> String {
    "Exterior".to_string()
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_exponent() -> i32 {
    1
}
