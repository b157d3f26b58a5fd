//! Derivation of recovered/deceased totals and summary metrics from a
//! recorded trajectory.
//!
//! The engine tracks S/E/I exactly and removes infectious individuals at the
//! combined hazard `gamma + mu_i`. The recovered/deceased disposition is
//! derived here by a first-order (left-Riemann) integration of the I-outflow
//! over the trajectory's own event-time grid:
//! `dR = I(t_{k-1}) * gamma * dt`, `dF = I(t_{k-1}) * mu_i * dt`. This is an
//! approximation of the hazard the engine already sampled, not a second
//! stochastic process; simulating R/F as extra CTMC states would double-count
//! removals.

use serde::Serialize;

use crate::engine::Trajectory;
use crate::scenario::Rates;

/// The per-scenario result record consumed by external reporting/plotting.
#[derive(Clone, Debug, Serialize)]
pub struct ScenarioResult {
    pub time: Vec<f64>,
    pub s: Vec<f64>,
    pub e: Vec<f64>,
    pub i: Vec<f64>,
    pub r: Vec<f64>,
    pub f: Vec<f64>,
    /// Percent of the population ever infected.
    pub attack_rate: f64,
    /// Percent of the ever-infected who died; 0 if no one was infected.
    pub cfr: f64,
    pub peak_infections: f64,
    pub peak_day: f64,
    pub final_deaths: f64,
    pub final_recovered: f64,
}

/// Reduces a trajectory to the full result record. `rates` supplies the
/// recovery and mortality hazards used for the R/F split; for checkpointed
/// runs these are the scenario's base rates, matching the fixed-rate
/// integration the record is defined by.
#[must_use]
pub fn aggregate(trajectory: &Trajectory, rates: &Rates) -> ScenarioResult {
    let len = trajectory.len();
    let time = trajectory.time.clone();
    let s: Vec<f64> = trajectory.susceptible.iter().map(|&v| f64::from(v)).collect();
    let e: Vec<f64> = trajectory.exposed.iter().map(|&v| f64::from(v)).collect();
    let i: Vec<f64> = trajectory.infectious.iter().map(|&v| f64::from(v)).collect();

    let mut r = vec![0.0; len];
    let mut f = vec![0.0; len];
    for k in 1..len {
        let dt = time[k] - time[k - 1];
        r[k] = r[k - 1] + i[k - 1] * rates.gamma * dt;
        f[k] = f[k - 1] + i[k - 1] * rates.mu_i * dt;
    }

    // Truncated runs use the last available sample as the final state.
    let final_recovered = r.last().copied().unwrap_or(0.0);
    let final_deaths = f.last().copied().unwrap_or(0.0);
    let final_infectious = i.last().copied().unwrap_or(0.0);
    let total_infected = final_recovered + final_deaths + final_infectious;

    let n = trajectory.population as f64;
    let attack_rate = if n > 0.0 {
        total_infected / n * 100.0
    } else {
        0.0
    };
    let cfr = if total_infected > 0.0 {
        final_deaths / total_infected * 100.0
    } else {
        0.0
    };

    let (peak_index, peak_infections) = i
        .iter()
        .enumerate()
        .fold((0, 0.0_f64), |(best_k, best), (k, &value)| {
            if value > best {
                (k, value)
            } else {
                (best_k, best)
            }
        });
    let peak_day = time.get(peak_index).copied().unwrap_or(0.0);

    ScenarioResult {
        time,
        s,
        e,
        i,
        r,
        f,
        attack_rate,
        cfr,
        peak_infections,
        peak_day,
        final_deaths,
        final_recovered,
    }
}
