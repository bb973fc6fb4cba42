use log::{debug, info, trace, warn};

use crate::error::{HistoryError, SimulationError};
use crate::exterior::Exterior;
use crate::flux_params::FluxCalculationParameters;
use crate::histories::{history_key, HistoriesStorage};
use crate::ion_channel::IonChannel;
use crate::ion_species::IonSpecies;
use crate::trackable::Trackable;
use crate::vesicle::Vesicle;
use vesicle_common::{
    ConfigError, HistoriesSnapshot, SimulationConfig, FARADAY_CONSTANT, HYDROGEN_SPECIES,
    LITERS_PER_CUBIC_METER,
};

/// Key of the exported time axis.
pub const TIME_AXIS_KEY: &str = "simulation_time";

/// Iterations between progress reports.
const PROGRESS_INTERVAL: u64 = 1000;

/// Owns the compartment, its ion species and channels, and advances them in time.
pub struct Simulation {
    config: SimulationConfig,
    display_name: String,
    time_step: f64,  // s
    total_time: f64, // s
    time: f64,
    step_count: u64,
    temperature: f64, // K
    nernst_constant: f64,
    init_buffer_capacity: f64,
    buffer_capacity: f64,
    /// Charge carried by everything not modelled as a species (mol), fixed at load.
    unaccounted_ion_amount: f64,

    vesicle: Vesicle,
    exterior: Exterior,
    species: Vec<IonSpecies>,
    channels: Vec<IonChannel>,
    hydrogen: Option<usize>,

    histories: HistoriesStorage,
    time_key: String,
    buffer_key: String,
}

// Registration and recording order: vesicle, exterior, species, channels
fn tracked_objects<'a>(
    vesicle: &'a Vesicle,
    exterior: &'a Exterior,
    species: &'a [IonSpecies],
    channels: &'a [IonChannel],
) -> Vec<&'a dyn Trackable> {
    let mut objects: Vec<&dyn Trackable> = Vec::with_capacity(2 + species.len() + channels.len());
    objects.push(vesicle);
    objects.push(exterior);
    objects.extend(species.iter().map(|s| s as &dyn Trackable));
    objects.extend(channels.iter().map(|c| c as &dyn Trackable));
    objects
}

fn species_index(species: &[IonSpecies], name: &str) -> Option<usize> {
    species.iter().position(|s| s.display_name() == name)
}

impl Simulation {
    /// Builds and wires a simulation from a configuration.
    ///
    /// Fails without handing out anything if the configuration is invalid or the
    /// species/channel graph is inconsistent.
    pub fn load(config: SimulationConfig) -> Result<Self, ConfigError> {
        let timing = config.validate()?;

        let vesicle = Vesicle::new(&config.vesicle_params);
        let exterior = Exterior::new(&config.exterior_params);

        let mut species: Vec<IonSpecies> = config
            .species
            .iter()
            .map(|(name, species_config)| IonSpecies::new(name, species_config))
            .collect();
        let mut channels = config
            .channels
            .iter()
            .map(|(name, channel_config)| IonChannel::new(name, channel_config))
            .collect::<Result<Vec<_>, _>>()?;

        for (species_name, links) in &config.ion_channel_links {
            let own_index = species_index(&species, species_name).ok_or_else(|| ConfigError::UnknownSpecies {
                species: species_name.clone(),
                context: "ion_channel_links".to_string(),
            })?;
            for link in links {
                let channel_index = channels
                    .iter()
                    .position(|c| c.display_name() == link.channel)
                    .ok_or_else(|| ConfigError::UnknownChannel {
                        species: species_name.clone(),
                        channel: link.channel.clone(),
                    })?;
                let secondary = match &link.secondary {
                    Some(name) => {
                        let index = species_index(&species, name).ok_or_else(|| ConfigError::UnknownSpecies {
                            species: name.clone(),
                            context: format!("link '{}' of species '{}'", link.channel, species_name),
                        })?;
                        Some((index, name.as_str()))
                    }
                    None => None,
                };
                species[own_index].connect_channel(own_index, channel_index, &mut channels[channel_index], secondary)?;
            }
        }

        for channel in &channels {
            let Some(primary) = channel.primary() else {
                return Err(ConfigError::UnconnectedChannel {
                    channel: channel.display_name().to_string(),
                });
            };
            debug!(
                "Channel '{}' [{}]: primary '{}', secondary '{}', conductance {:e}",
                channel.display_name(),
                channel.channel_type().unwrap_or("untyped"),
                species[primary].display_name(),
                channel.secondary().map_or("none", |index| species[index].display_name()),
                channel.conductance()
            );
        }

        let mut histories = HistoriesStorage::new();
        for object in tracked_objects(&vesicle, &exterior, &species, &channels) {
            histories.register_object(object).map_err(|e| match e {
                HistoryError::DuplicateObject { name } => ConfigError::DuplicateName { name },
                other => ConfigError::InvalidParameter {
                    field: object.display_name().to_string(),
                    reason: other.to_string(),
                },
            })?;
        }
        if histories.is_registered(&config.display_name) {
            return Err(ConfigError::DuplicateName {
                name: config.display_name.clone(),
            });
        }

        for s in species.iter_mut() {
            let amount = s.amount_for_volume(vesicle.volume());
            s.set_vesicle_amount(amount);
        }

        let mut charge_density = 0.0;
        for s in &species {
            charge_density += s.elementary_charge() * s.init_vesicle_conc();
        }
        let unaccounted_ion_amount =
            vesicle.init_charge() / FARADAY_CONSTANT - charge_density * LITERS_PER_CUBIC_METER * vesicle.init_volume();
        info!("Unaccounted ion amount: {:e} mol", unaccounted_ion_amount);

        let hydrogen = species_index(&species, HYDROGEN_SPECIES);
        if hydrogen.is_none() {
            debug!("No '{}' species configured, vesicle pH stays constant", HYDROGEN_SPECIES);
        }

        info!(
            "Loaded simulation '{}': {} species, {} channels, dt = {} s, total = {} s",
            config.display_name,
            species.len(),
            channels.len(),
            timing.time_step,
            timing.total_time
        );

        Ok(Simulation {
            display_name: config.display_name.clone(),
            time_step: timing.time_step,
            total_time: timing.total_time,
            time: 0.0,
            step_count: 0,
            temperature: config.temperature,
            nernst_constant: config.nernst_constant(),
            init_buffer_capacity: config.init_buffer_capacity,
            buffer_capacity: config.init_buffer_capacity,
            unaccounted_ion_amount,
            vesicle,
            exterior,
            species,
            channels,
            hydrogen,
            histories,
            time_key: history_key(&config.display_name, "time"),
            buffer_key: history_key(&config.display_name, "buffer_capacity"),
            config,
        })
    }

    /// Number of iterations `run` performs: `floor(total_time / time_step)`.
    pub fn iteration_count(&self) -> u64 {
        (self.total_time / self.time_step).floor() as u64
    }

    /// Runs every iteration, then records the final state.
    ///
    /// `progress` receives the completed percentage on the first iteration, every
    /// thousandth one and the last one.
    pub fn run<F: FnMut(u32)>(&mut self, mut progress: F) -> Result<(), SimulationError> {
        let iterations = self.iteration_count();
        info!("Running {} iterations...", iterations);

        for i in 0..iterations {
            self.run_one_iteration()?;
            if i % PROGRESS_INTERVAL == 0 || i == iterations - 1 {
                progress(((i + 1) as f64 / iterations as f64 * 100.0) as u32);
            }
        }

        self.update_simulation_state();
        self.record_histories()?;
        info!("Simulation '{}' finished at t = {} s", self.display_name, self.time);
        Ok(())
    }

    /// One time step: flux from the current state, record, integrate, update.
    pub fn run_one_iteration(&mut self) -> Result<(), SimulationError> {
        let params = self.flux_parameters();
        let fluxes = self.compute_fluxes(&params)?;
        self.record_histories()?;
        self.update_ion_amounts(&fluxes);
        self.update_simulation_state();

        self.step_count += 1;
        self.time = self.step_count as f64 * self.time_step;
        trace!(
            "Step {} done (t = {} s, V = {} V, pH = {})",
            self.step_count,
            self.time,
            self.vesicle.voltage(),
            self.vesicle.ph()
        );
        Ok(())
    }

    /// State handed to every channel for the next flux computation.
    pub fn flux_parameters(&self) -> FluxCalculationParameters {
        let (vesicle_hydrogen_free, exterior_hydrogen_free) = match self.hydrogen_species() {
            Some(h) => (
                h.vesicle_conc() * self.buffer_capacity,
                h.exterior_conc() * self.init_buffer_capacity,
            ),
            None => (0.0, 0.0),
        };
        FluxCalculationParameters {
            voltage: self.vesicle.voltage(),
            ph: self.vesicle.ph(),
            time: self.time,
            area: self.vesicle.area(),
            nernst_constant: self.nernst_constant,
            vesicle_hydrogen_free,
            exterior_hydrogen_free,
        }
    }

    /// Net flux of every species, in species order.
    fn compute_fluxes(&mut self, params: &FluxCalculationParameters) -> Result<Vec<f64>, ConfigError> {
        let mut fluxes = Vec::with_capacity(self.species.len());
        for species in &self.species {
            fluxes.push(species.compute_total_flux(&mut self.channels, &self.species, params)?);
        }
        Ok(fluxes)
    }

    fn update_ion_amounts(&mut self, fluxes: &[f64]) {
        for (species, flux) in self.species.iter_mut().zip(fluxes) {
            let amount = species.vesicle_amount() + flux * self.time_step;
            species.set_vesicle_amount(amount);
        }
    }

    fn record_histories(&mut self) -> Result<(), HistoryError> {
        let objects = tracked_objects(&self.vesicle, &self.exterior, &self.species, &self.channels);
        self.histories.update_histories(objects)?;
        self.histories.add_history(&self.time_key, self.time);
        self.histories.add_history(&self.buffer_key, self.buffer_capacity);
        Ok(())
    }

    /// Recomputes every derived quantity from the current ion amounts.
    pub fn update_simulation_state(&mut self) {
        self.update_volume();
        self.update_vesicle_concentrations();
        self.update_buffer();
        self.vesicle.update_area();
        self.vesicle.update_capacitance();
        self.update_charge();
        self.update_voltage();
        self.update_ph();
    }

    /// Osmotic volume change relative to the initial state; hydrogen is excluded.
    pub fn update_volume(&mut self) {
        let mut current = 0.0;
        let mut initial = 0.0;
        for species in self.species.iter().filter(|s| s.display_name() != HYDROGEN_SPECIES) {
            current += species.vesicle_conc().abs();
            initial += species.init_vesicle_conc().abs();
        }
        let unaccounted = self.unaccounted_ion_amount.abs();
        let numerator = current + unaccounted;
        let denominator = initial + unaccounted;

        if denominator <= 0.0 {
            warn!("Volume ratio denominator is {}, keeping volume unchanged", denominator);
            return;
        }
        let volume = self.vesicle.init_volume() * (numerator / denominator);
        self.vesicle.set_volume(volume);
    }

    pub fn update_vesicle_concentrations(&mut self) {
        let liters = LITERS_PER_CUBIC_METER * self.vesicle.volume();
        for species in &mut self.species {
            let conc = species.vesicle_amount() / liters;
            species.set_vesicle_conc(conc);
        }
    }

    pub fn update_buffer(&mut self) {
        self.buffer_capacity = self.init_buffer_capacity * (self.vesicle.volume() / self.vesicle.init_volume());
    }

    pub fn update_charge(&mut self) {
        let mut amount = 0.0;
        for species in &self.species {
            amount += species.elementary_charge() * species.vesicle_amount();
        }
        self.vesicle
            .set_charge(FARADAY_CONSTANT * (amount + self.unaccounted_ion_amount));
    }

    pub fn update_voltage(&mut self) {
        let voltage = self.vesicle.charge() / self.vesicle.capacitance();
        self.vesicle.set_voltage(voltage);
    }

    pub fn update_ph(&mut self) {
        let Some(free_hydrogen) = self
            .hydrogen_species()
            .map(|h| h.vesicle_conc() * self.buffer_capacity)
        else {
            return;
        };

        if free_hydrogen <= 0.0 {
            warn!(
                "Free hydrogen concentration is {}, falling back to pH {}",
                free_hydrogen,
                self.vesicle.init_ph()
            );
            let ph = self.vesicle.init_ph();
            self.vesicle.set_ph(ph);
        } else {
            self.vesicle.set_ph(-free_hydrogen.log10());
        }
    }

    /// Recorded histories, with the time axis added as `index * time_step` when it
    /// was not recorded under its own key.
    pub fn export_histories(&self) -> HistoriesSnapshot {
        let mut snapshot = self.histories.snapshot();
        if !snapshot.contains_key(TIME_AXIS_KEY) {
            let points = snapshot.point_count();
            let axis = (0..points).map(|i| i as f64 * self.time_step).collect();
            snapshot.insert(TIME_AXIS_KEY.to_string(), axis);
        }
        snapshot
    }

    pub fn log_final_values(&self) {
        info!("Final values of '{}' at t = {} s:", self.display_name, self.time);
        info!("  Volume: {:e} m^3", self.vesicle.volume());
        info!("  Area: {:e} m^2", self.vesicle.area());
        info!("  Capacitance: {:e} F", self.vesicle.capacitance());
        info!("  Charge: {:e} C", self.vesicle.charge());
        info!("  Voltage: {} V", self.vesicle.voltage());
        info!("  pH: {}", self.vesicle.ph());
        info!("  Buffer capacity: {:e}", self.buffer_capacity);
        for species in &self.species {
            info!(
                "  {}: {:e} mol/L ({:e} mol)",
                species.display_name(),
                species.vesicle_conc(),
                species.vesicle_amount()
            );
        }
        debug!("  Unaccounted ion amount: {:e} mol", self.unaccounted_ion_amount);
    }

    fn hydrogen_species(&self) -> Option<&IonSpecies> {
        self.hydrogen.map(|index| &self.species[index])
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn nernst_constant(&self) -> f64 {
        self.nernst_constant
    }

    pub fn buffer_capacity(&self) -> f64 {
        self.buffer_capacity
    }

    pub fn init_buffer_capacity(&self) -> f64 {
        self.init_buffer_capacity
    }

    pub fn unaccounted_ion_amount(&self) -> f64 {
        self.unaccounted_ion_amount
    }

    pub fn vesicle(&self) -> &Vesicle {
        &self.vesicle
    }

    pub fn exterior(&self) -> &Exterior {
        &self.exterior
    }

    pub fn species(&self) -> &[IonSpecies] {
        &self.species
    }

    pub fn species_by_name(&self, name: &str) -> Option<&IonSpecies> {
        self.species.iter().find(|s| s.display_name() == name)
    }

    pub fn channels(&self) -> &[IonChannel] {
        &self.channels
    }

    pub fn channel_by_name(&self, name: &str) -> Option<&IonChannel> {
        self.channels.iter().find(|c| c.display_name() == name)
    }

    pub fn histories(&self) -> &HistoriesStorage {
        &self.histories
    }
}
