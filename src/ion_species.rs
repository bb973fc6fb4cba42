use log::warn;

use crate::flux_params::FluxCalculationParameters;
use crate::ion_channel::IonChannel;
use crate::trackable::Trackable;
use vesicle_common::constants::MIN_VESICLE_CONCENTRATION;
use vesicle_common::{ConfigError, SpeciesConfig, LITERS_PER_CUBIC_METER};

/// One ion species: its concentrations, vesicle amount and linked channels.
#[derive(Debug, Clone)]
pub struct IonSpecies {
    display_name: String,
    init_vesicle_conc: f64, // mol/L
    vesicle_conc: f64,      // mol/L
    vesicle_amount: f64,    // mol
    exterior_conc: f64,     // mol/L
    elementary_charge: f64,
    // Channel indices in link order
    channels: Vec<usize>,
}

impl IonSpecies {
    /// A configured vesicle concentration that is not positive starts at the
    /// concentration floor, so the initial and current values agree.
    pub fn new(name: &str, config: &SpeciesConfig) -> Self {
        let mut init_vesicle_conc = config.init_vesicle_conc;
        if init_vesicle_conc <= 0.0 {
            warn!(
                "Ion species '{}': initial vesicle concentration {} is not positive, starting at {}",
                name, init_vesicle_conc, MIN_VESICLE_CONCENTRATION
            );
            init_vesicle_conc = MIN_VESICLE_CONCENTRATION;
        }
        IonSpecies {
            display_name: name.to_string(),
            init_vesicle_conc,
            vesicle_conc: init_vesicle_conc,
            vesicle_amount: 0.0,
            exterior_conc: config.exterior_conc,
            elementary_charge: config.elementary_charge,
            channels: Vec::new(),
        }
    }

    /// Wires `channel` to this species, checking the channel's allowed ions.
    ///
    /// `own_index` is this species' position in the simulation and `secondary`
    /// the (index, name) of the partner species for two-ion channels. The flux of
    /// the channel is attributed to this species even when the roles are reversed.
    pub fn connect_channel(
        &mut self,
        own_index: usize,
        channel_index: usize,
        channel: &mut IonChannel,
        secondary: Option<(usize, &str)>,
    ) -> Result<(), ConfigError> {
        let channel_name = channel.display_name().to_string();
        let primary_ion = channel.allowed_primary().to_string();

        let (primary, partner) = match (channel.allowed_secondary().map(str::to_string), secondary) {
            (Some(_), None) => {
                return Err(ConfigError::MissingSecondarySpecies {
                    channel: channel_name,
                    species: self.display_name.clone(),
                });
            }
            (None, Some((_, secondary_name))) => {
                return Err(ConfigError::UnexpectedSecondarySpecies {
                    channel: channel_name,
                    species: self.display_name.clone(),
                    secondary: secondary_name.to_string(),
                });
            }
            (None, None) => {
                if self.display_name != primary_ion {
                    return Err(self.incompatible(&channel_name, None, primary_ion));
                }
                (own_index, None)
            }
            (Some(secondary_ion), Some((secondary_index, secondary_name))) => {
                if self.display_name == primary_ion && secondary_name == secondary_ion {
                    (own_index, Some(secondary_index))
                } else if self.display_name == secondary_ion && secondary_name == primary_ion {
                    (secondary_index, Some(own_index))
                } else {
                    let expected = format!("{} and {}", primary_ion, secondary_ion);
                    return Err(self.incompatible(&channel_name, Some(secondary_name), expected));
                }
            }
        };

        channel.connect(primary, partner, &self.display_name)?;
        self.channels.push(channel_index);
        Ok(())
    }

    fn incompatible(&self, channel: &str, secondary: Option<&str>, expected: String) -> ConfigError {
        ConfigError::IncompatibleChannel {
            channel: channel.to_string(),
            primary: self.display_name.clone(),
            secondary: secondary.map(str::to_string),
            expected,
        }
    }

    /// Net flux of this species into the vesicle (mol/s), summed in link order.
    pub fn compute_total_flux(
        &self,
        channels: &mut [IonChannel],
        species: &[IonSpecies],
        params: &FluxCalculationParameters,
    ) -> Result<f64, ConfigError> {
        let mut total_flux = 0.0;
        for &index in &self.channels {
            total_flux += channels[index].compute_flux(species, params)?;
        }
        Ok(total_flux)
    }

    /// `amount = conc * 1000 * volume`, with volume in m^3.
    pub fn amount_for_volume(&self, volume: f64) -> f64 {
        self.vesicle_conc * LITERS_PER_CUBIC_METER * volume
    }

    /// Sets the vesicle amount (mol); negative values are clamped to zero.
    pub fn set_vesicle_amount(&mut self, amount: f64) {
        if amount < 0.0 {
            warn!(
                "Ion species '{}': vesicle amount {} is negative, clamping to 0",
                self.display_name, amount
            );
            self.vesicle_amount = 0.0;
        } else {
            self.vesicle_amount = amount;
        }
    }

    /// Sets the vesicle concentration (mol/L), keeping it above a small floor.
    pub fn set_vesicle_conc(&mut self, conc: f64) {
        if conc <= 0.0 {
            warn!(
                "Ion species '{}': vesicle concentration {} is not positive, clamping to {}",
                self.display_name, conc, MIN_VESICLE_CONCENTRATION
            );
            self.vesicle_conc = MIN_VESICLE_CONCENTRATION;
        } else {
            self.vesicle_conc = conc;
        }
    }

    pub fn init_vesicle_conc(&self) -> f64 {
        self.init_vesicle_conc
    }

    pub fn vesicle_conc(&self) -> f64 {
        self.vesicle_conc
    }

    pub fn vesicle_amount(&self) -> f64 {
        self.vesicle_amount
    }

    pub fn exterior_conc(&self) -> f64 {
        self.exterior_conc
    }

    pub fn elementary_charge(&self) -> f64 {
        self.elementary_charge
    }

    pub fn channels(&self) -> &[usize] {
        &self.channels
    }
}

impl Trackable for IonSpecies {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn current_state(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("vesicle_conc", self.vesicle_conc),
            ("vesicle_amount", self.vesicle_amount),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesicle_common::ChannelConfig;

    fn setup() -> (Vec<IonSpecies>, IonChannel) {
        let species = vec![
            IonSpecies::new("h", &SpeciesConfig::new(8e-5, 1.2e-4, 1.0)),
            IonSpecies::new("na", &SpeciesConfig::new(0.15, 0.01, 1.0)),
        ];
        let channel = IonChannel::new("nhe", &ChannelConfig::exchanger("na", "h", 1e-3)).unwrap();
        (species, channel)
    }

    #[test]
    fn test_exchanger_connects_in_either_role_order() {
        let (mut species, mut channel) = setup();
        species[1].connect_channel(1, 0, &mut channel, Some((0, "h"))).unwrap();
        assert_eq!(channel.primary(), Some(1));
        assert_eq!(channel.secondary(), Some(0));
        assert_eq!(species[1].channels(), &[0]);

        let (mut species, mut channel) = setup();
        species[0].connect_channel(0, 0, &mut channel, Some((1, "na"))).unwrap();
        assert_eq!(channel.primary(), Some(1), "primary stays the allowed primary ion");
        assert_eq!(channel.secondary(), Some(0));
        assert_eq!(species[0].channels(), &[0], "flux is attributed to the linking species");
    }

    #[test]
    fn test_wiring_errors() {
        let (mut species, mut channel) = setup();
        assert!(matches!(
            species[1].connect_channel(1, 0, &mut channel, None),
            Err(ConfigError::MissingSecondarySpecies { .. })
        ));
        assert!(matches!(
            species[1].connect_channel(1, 0, &mut channel, Some((1, "na"))),
            Err(ConfigError::IncompatibleChannel { .. })
        ));
        assert!(species[1].channels().is_empty());

        let mut single = IonChannel::new("tpc", &ChannelConfig::single("na", 1e-3)).unwrap();
        assert!(matches!(
            species[0].connect_channel(0, 1, &mut single, None),
            Err(ConfigError::IncompatibleChannel { .. })
        ));
        assert!(matches!(
            species[1].connect_channel(1, 1, &mut single, Some((0, "h"))),
            Err(ConfigError::UnexpectedSecondarySpecies { .. })
        ));
        assert!(!single.is_connected());
    }

    #[test]
    fn test_setters_clamp() {
        let (mut species, _) = setup();
        let na = &mut species[1];

        na.set_vesicle_amount(-1e-18);
        assert_eq!(na.vesicle_amount(), 0.0);
        na.set_vesicle_amount(2e-18);
        assert_eq!(na.vesicle_amount(), 2e-18);

        na.set_vesicle_conc(0.0);
        assert_eq!(na.vesicle_conc(), MIN_VESICLE_CONCENTRATION);
        na.set_vesicle_conc(-3.0);
        assert_eq!(na.vesicle_conc(), MIN_VESICLE_CONCENTRATION);
    }

    #[test]
    fn test_empty_vesicle_starts_at_concentration_floor() {
        let species = IonSpecies::new("k", &SpeciesConfig::new(0.0, 0.14, 1.0));
        assert_eq!(species.init_vesicle_conc(), MIN_VESICLE_CONCENTRATION);
        assert_eq!(species.vesicle_conc(), MIN_VESICLE_CONCENTRATION);
        assert_eq!(species.exterior_conc(), 0.14);
    }

    #[test]
    fn test_total_flux_sums_linked_channels() {
        let mut species = vec![IonSpecies::new("na", &SpeciesConfig::new(0.15, 0.01, 1.0))];
        let mut channels = vec![
            IonChannel::new("a", &ChannelConfig::single("na", 1e-3)).unwrap(),
            IonChannel::new("b", &ChannelConfig::single("na", 2e-3)).unwrap(),
        ];
        for (index, channel) in channels.iter_mut().enumerate() {
            species[0].connect_channel(0, index, channel, None).unwrap();
        }
        let params = FluxCalculationParameters {
            voltage: 0.04,
            area: 2e-11,
            nernst_constant: 0.0267,
            ..FluxCalculationParameters::default()
        };

        let total = species[0].compute_total_flux(&mut channels, &species, &params).unwrap();
        assert_eq!(total, channels[0].flux() + channels[1].flux());
        assert!(((channels[1].flux() / channels[0].flux()) - 2.0).abs() < 1e-12);
    }
}
