//! Scenario parameterization: mapping an intervention strategy to the
//! effective transmission rate, the network the engine starts on, and any
//! mid-run checkpoint.
//!
//! Vaccination scenarios deliberately leave the network untouched and apply a
//! population-average efficacy discount to the scalar transmission rate; they
//! do not model per-individual immunity.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ShipnetError;
use crate::network::ContactNetwork;

/// The per-hazard rates driving the continuous-time process: transmission
/// (per weighted contact per day), incubation progression, removal, and
/// infection mortality.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub beta: f64,
    pub sigma: f64,
    pub gamma: f64,
    pub mu_i: f64,
}

impl Rates {
    pub fn validate(&self) -> Result<(), ShipnetError> {
        for (label, rate) in [
            ("beta", self.beta),
            ("sigma", self.sigma),
            ("gamma", self.gamma),
        ] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(ShipnetError::Config(format!(
                    "{label} = {rate} must be positive and finite"
                )));
            }
        }
        if !(self.mu_i.is_finite() && self.mu_i >= 0.0) {
            return Err(ShipnetError::Config(format!(
                "mu_i = {} must be non-negative and finite",
                self.mu_i
            )));
        }
        Ok(())
    }
}

/// A scheduled mid-run intervention onset: at `time`, the engine swaps in the
/// replacement network and/or rates without resetting disease state.
#[derive(Clone)]
pub struct Checkpoint {
    pub time: f64,
    pub network: Option<Arc<ContactNetwork>>,
    pub rates: Option<Rates>,
}

/// Immutable description of one scenario run.
#[derive(Clone)]
pub struct ScenarioConfig {
    pub rates: Rates,
    pub init_exposed: usize,
    pub init_infectious: usize,
    /// Simulation horizon in days. Reaching it with events still pending is a
    /// truncated epidemic, not an error.
    pub horizon: f64,
    /// Checkpoints in non-decreasing time order.
    pub checkpoints: Vec<Checkpoint>,
}

impl ScenarioConfig {
    pub fn validate(&self, population: usize) -> Result<(), ShipnetError> {
        self.rates.validate()?;
        if self.init_exposed + self.init_infectious > population {
            return Err(ShipnetError::Config(format!(
                "{} initial exposed + {} initial infectious exceeds population {population}",
                self.init_exposed, self.init_infectious
            )));
        }
        if !(self.horizon.is_finite() && self.horizon > 0.0) {
            return Err(ShipnetError::Config(format!(
                "horizon {} must be positive and finite",
                self.horizon
            )));
        }
        let mut last = 0.0_f64;
        for checkpoint in &self.checkpoints {
            if !(checkpoint.time.is_finite() && checkpoint.time >= last) {
                return Err(ShipnetError::Config(String::from(
                    "checkpoint times must be finite and non-decreasing",
                )));
            }
            last = checkpoint.time;
            if let Some(rates) = checkpoint.rates {
                rates.validate()?;
            }
            if let Some(network) = &checkpoint.network {
                if network.size() != population {
                    return Err(ShipnetError::InvariantViolation(format!(
                        "checkpoint network has {} nodes, active network has {population}",
                        network.size()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Intervention strategies recognized by the parameterizer.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InterventionStrategy {
    Baseline,
    /// Cabin quarantine starting on the given day: the active network is
    /// swapped for the quarantine network and transmission is reduced.
    Quarantine { start_day: f64 },
    /// Single dose for the whole population.
    VaccinationOneDoseAll,
    /// Two doses for a covered fraction of the population, nothing for the
    /// rest.
    VaccinationTwoDoseHalf,
}

impl InterventionStrategy {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            InterventionStrategy::Baseline => "baseline",
            InterventionStrategy::Quarantine { .. } => "quarantine",
            InterventionStrategy::VaccinationOneDoseAll => "vaccination_one_dose_all",
            InterventionStrategy::VaccinationTwoDoseHalf => "vaccination_two_dose_half",
        }
    }
}

/// Intervention-strength parameters with the observed defaults.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionConfig {
    pub quarantine_start_day: f64,
    /// Transmission reduction once quarantine is in force.
    pub quarantine_effectiveness: f64,
    pub vaccine_efficacy_one_dose: f64,
    pub vaccine_efficacy_two_dose: f64,
    /// Fraction of the population covered by the two-dose strategy.
    pub vaccine_coverage_two_dose: f64,
}

impl Default for InterventionConfig {
    fn default() -> Self {
        InterventionConfig {
            quarantine_start_day: 10.0,
            quarantine_effectiveness: 0.8,
            vaccine_efficacy_one_dose: 0.70,
            vaccine_efficacy_two_dose: 0.95,
            vaccine_coverage_two_dose: 0.5,
        }
    }
}

impl InterventionConfig {
    pub fn validate(&self) -> Result<(), ShipnetError> {
        if !(self.quarantine_start_day.is_finite() && self.quarantine_start_day >= 0.0) {
            return Err(ShipnetError::Config(format!(
                "quarantine start day {} must be non-negative",
                self.quarantine_start_day
            )));
        }
        for (label, value) in [
            ("quarantine effectiveness", self.quarantine_effectiveness),
            ("one-dose efficacy", self.vaccine_efficacy_one_dose),
            ("two-dose efficacy", self.vaccine_efficacy_two_dose),
            ("two-dose coverage", self.vaccine_coverage_two_dose),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ShipnetError::Config(format!(
                    "{label} {value} outside (0, 1)"
                )));
            }
        }
        Ok(())
    }
}

/// One named, fully parameterized scenario, ready to run.
#[derive(Clone)]
pub struct ScenarioPlan {
    pub name: String,
    pub network: Arc<ContactNetwork>,
    pub config: ScenarioConfig,
}

/// Maps a strategy to a runnable plan. `base` carries the un-intervened
/// rates, initial seeding, and horizon; the strategy decides the starting
/// network, the effective transmission rate, and any checkpoint.
pub fn parameterize(
    strategy: InterventionStrategy,
    normal: &Arc<ContactNetwork>,
    quarantine: Option<&Arc<ContactNetwork>>,
    base: &ScenarioConfig,
    interventions: &InterventionConfig,
) -> Result<ScenarioPlan, ShipnetError> {
    interventions.validate()?;
    base.validate(normal.size())?;

    let mut config = base.clone();
    config.checkpoints.clear();

    match strategy {
        InterventionStrategy::Baseline => {}
        InterventionStrategy::Quarantine { start_day } => {
            let quarantine = quarantine.ok_or_else(|| {
                ShipnetError::Config(String::from(
                    "quarantine scenario requires a quarantine network",
                ))
            })?;
            let reduced = Rates {
                beta: base.rates.beta * (1.0 - interventions.quarantine_effectiveness),
                ..base.rates
            };
            config.checkpoints.push(Checkpoint {
                time: start_day,
                network: Some(Arc::clone(quarantine)),
                rates: Some(reduced),
            });
        }
        InterventionStrategy::VaccinationOneDoseAll => {
            config.rates.beta *= 1.0 - interventions.vaccine_efficacy_one_dose;
        }
        InterventionStrategy::VaccinationTwoDoseHalf => {
            let covered = interventions.vaccine_coverage_two_dose;
            config.rates.beta *=
                covered * (1.0 - interventions.vaccine_efficacy_two_dose) + (1.0 - covered);
        }
    }

    config.validate(normal.size())?;
    Ok(ScenarioPlan {
        name: strategy.name().to_string(),
        network: Arc::clone(normal),
        config,
    })
}

/// The standard four-way intervention comparison: baseline, cabin quarantine,
/// one dose for all, two doses for half.
pub fn standard_plans(
    normal: &Arc<ContactNetwork>,
    quarantine: &Arc<ContactNetwork>,
    base: &ScenarioConfig,
    interventions: &InterventionConfig,
) -> Result<Vec<ScenarioPlan>, ShipnetError> {
    let strategies = [
        InterventionStrategy::Baseline,
        InterventionStrategy::Quarantine {
            start_day: interventions.quarantine_start_day,
        },
        InterventionStrategy::VaccinationOneDoseAll,
        InterventionStrategy::VaccinationTwoDoseHalf,
    ];
    strategies
        .iter()
        .map(|&strategy| parameterize(strategy, normal, Some(quarantine), base, interventions))
        .collect()
}
