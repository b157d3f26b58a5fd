//! Top-level simulation parameters, loadable from a JSON file.
//!
//! Validation is fail-fast: a rejected configuration never builds a network
//! or starts a run. Every field has a default recovered from the reference
//! shipboard outbreak (a Diamond Princess-class vessel), so a partial JSON
//! file overrides only what it names.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builder::{NetworkConfig, QuarantineConfig};
use crate::error::ShipnetError;
use crate::scenario::{InterventionConfig, Rates, ScenarioConfig};

/// Human-level disease parameters; the engine's rates derive from these.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiseaseParameters {
    /// Transmission rate per weighted contact per day.
    pub transmission_rate: f64,
    pub incubation_days: f64,
    pub infectious_days: f64,
    /// Fraction of the infected who die.
    pub mortality_rate: f64,
    pub initial_exposed: usize,
    pub initial_infectious: usize,
}

impl Default for DiseaseParameters {
    fn default() -> Self {
        DiseaseParameters {
            transmission_rate: 0.8,
            incubation_days: 5.0,
            infectious_days: 7.0,
            mortality_rate: 0.013,
            initial_exposed: 20,
            initial_infectious: 100,
        }
    }
}

impl DiseaseParameters {
    /// Derived hazard rates: sigma = 1/incubation, gamma = 1/infectious
    /// period, mu_i = mortality * gamma.
    #[must_use]
    pub fn rates(&self) -> Rates {
        let sigma = 1.0 / self.incubation_days;
        let gamma = 1.0 / self.infectious_days;
        Rates {
            beta: self.transmission_rate,
            sigma,
            gamma,
            mu_i: self.mortality_rate * gamma,
        }
    }

    pub fn validate(&self) -> Result<(), ShipnetError> {
        if !(self.transmission_rate.is_finite() && self.transmission_rate > 0.0) {
            return Err(ShipnetError::Config(format!(
                "transmission rate {} must be positive and finite",
                self.transmission_rate
            )));
        }
        for (label, days) in [
            ("incubation period", self.incubation_days),
            ("infectious period", self.infectious_days),
        ] {
            if !(days.is_finite() && days > 0.0) {
                return Err(ShipnetError::Config(format!(
                    "{label} {days} must be positive and finite"
                )));
            }
        }
        if !(self.mortality_rate > 0.0 && self.mortality_rate < 1.0) {
            return Err(ShipnetError::Config(format!(
                "mortality rate {} outside (0, 1)",
                self.mortality_rate
            )));
        }
        Ok(())
    }
}

/// Everything one simulation needs: population, disease, network structure,
/// intervention strengths, horizon, and the base random seed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub n_passengers: usize,
    pub n_crew: usize,
    pub seed: u64,
    pub horizon_days: f64,
    pub disease: DiseaseParameters,
    pub network: NetworkConfig,
    pub quarantine: QuarantineConfig,
    pub interventions: InterventionConfig,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            n_passengers: 2666,
            n_crew: 1045,
            seed: 42,
            horizon_days: 60.0,
            disease: DiseaseParameters::default(),
            network: NetworkConfig::default(),
            quarantine: QuarantineConfig::default(),
            interventions: InterventionConfig::default(),
        }
    }
}

impl SimulationParameters {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ShipnetError> {
        let contents = fs::read_to_string(path)?;
        let parameters: SimulationParameters = serde_json::from_str(&contents)?;
        parameters.validate()?;
        Ok(parameters)
    }

    #[must_use]
    pub fn n_total(&self) -> usize {
        self.n_passengers + self.n_crew
    }

    /// The un-intervened scenario configuration; strategies derive their
    /// variants from this.
    #[must_use]
    pub fn base_scenario(&self) -> ScenarioConfig {
        ScenarioConfig {
            rates: self.disease.rates(),
            init_exposed: self.disease.initial_exposed,
            init_infectious: self.disease.initial_infectious,
            horizon: self.horizon_days,
            checkpoints: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ShipnetError> {
        if self.n_total() == 0 {
            return Err(ShipnetError::Config(String::from(
                "population size must be positive",
            )));
        }
        if !(self.horizon_days.is_finite() && self.horizon_days > 0.0) {
            return Err(ShipnetError::Config(format!(
                "horizon {} must be positive and finite",
                self.horizon_days
            )));
        }
        self.disease.validate()?;
        if self.disease.initial_exposed + self.disease.initial_infectious > self.n_total() {
            return Err(ShipnetError::Config(String::from(
                "initial seeding exceeds population",
            )));
        }
        self.network.validate(self.n_total())?;
        self.quarantine.validate()?;
        self.interventions.validate()?;
        Ok(())
    }
}
