//! Scenario execution: one run, or a batch of independent runs.
//!
//! Scenario runs are embarrassingly parallel. Networks are shared read-only
//! behind `Arc`; every run owns its mutable state and its own seeded
//! generator, so batches execute on scoped worker threads with no locking
//! and no cross-run nondeterminism. Per-scenario seeds are derived from the
//! base seed plus a stable hash of the scenario name, so adding or removing
//! scenarios from a batch never perturbs the others.

use std::sync::Arc;
use std::thread;

use crate::engine::EpidemicEngine;
use crate::error::ShipnetError;
use crate::hashing::hash_str;
use crate::log::info;
use crate::network::ContactNetwork;
use crate::outcome::{aggregate, ScenarioResult};
use crate::scenario::{ScenarioConfig, ScenarioPlan};
use crate::HashMap;

/// Runs one scenario to absorption or horizon and reduces the trajectory to
/// a result record. Scenario-agnostic: baseline, quarantine, and vaccination
/// differ only in the configuration and network supplied.
pub fn run_scenario(
    network: Arc<ContactNetwork>,
    config: &ScenarioConfig,
    seed: u64,
) -> Result<ScenarioResult, ShipnetError> {
    let base_rates = config.rates;
    let engine = EpidemicEngine::new(network, config, seed)?;
    let trajectory = engine.run()?;
    Ok(aggregate(&trajectory, &base_rates))
}

/// Runs a batch of named scenario plans on independent worker threads and
/// returns their results keyed by scenario name.
pub fn run_scenarios(
    plans: &[ScenarioPlan],
    base_seed: u64,
) -> Result<HashMap<String, ScenarioResult>, ShipnetError> {
    thread::scope(|scope| {
        let workers: Vec<_> = plans
            .iter()
            .map(|plan| {
                let seed = base_seed.wrapping_add(hash_str(&plan.name));
                scope.spawn(move || -> Result<(String, ScenarioResult), ShipnetError> {
                    info!("running scenario '{}' with seed {seed}", plan.name);
                    let result = run_scenario(Arc::clone(&plan.network), &plan.config, seed)?;
                    Ok((plan.name.clone(), result))
                })
            })
            .collect();

        let mut results = HashMap::default();
        for worker in workers {
            let (name, result) = worker.join().map_err(|_| {
                ShipnetError::InvariantViolation(String::from("scenario worker panicked"))
            })??;
            results.insert(name, result);
        }
        Ok(results)
    })
}
