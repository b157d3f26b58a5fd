//! The stochastic epidemic engine: a continuous-time Markov chain driven by
//! the contact network.
//!
//! Transmission is network-localized: a susceptible person's infection hazard
//! is `beta * sum of edge weights to infectious neighbors`, so two people in
//! the same compartment can face very different risk. Exposed people progress
//! at rate sigma; infectious people leave the process at rate
//! `gamma + mu_i` (the recovered/deceased split is derived afterwards by the
//! outcome aggregator, never simulated as extra states).
//!
//! The event loop is the Gillespie stochastic simulation algorithm: draw the
//! waiting time to the next event from Exp(total hazard), pick the firing
//! person proportionally to their hazard share, apply the transition, and
//! recompute only the hazards the transition touched. Checkpoints share the
//! same time line: when one comes due before the next transition, the active
//! network and/or rates are swapped and every hazard is refreshed against the
//! new topology.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_distr::Exp1;

use crate::error::ShipnetError;
use crate::log::{debug, trace};
use crate::network::ContactNetwork;
use crate::people::PersonId;
use crate::scenario::{Rates, ScenarioConfig};

/// Below this total hazard the process is treated as absorbed. Guards against
/// residue from incremental floating-point updates.
const TOTAL_HAZARD_EPS: f64 = 1e-12;

/// Incremental hazard-total updates are resynced against a full sum this
/// often to bound floating-point drift.
const RESYNC_INTERVAL: usize = 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiseaseState {
    Susceptible,
    Exposed,
    Infectious,
    /// Recovered or deceased; absorbing. The disposition is computed post hoc.
    Removed,
}

/// The recorded time series of compartment counts, one sample per
/// compartment-changing event. Owned by the caller once the run returns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    pub time: Vec<f64>,
    pub susceptible: Vec<u32>,
    pub exposed: Vec<u32>,
    pub infectious: Vec<u32>,
    pub population: usize,
}

impl Trajectory {
    fn record(&mut self, time: f64, s: u32, e: u32, i: u32) {
        self.time.push(time);
        self.susceptible.push(s);
        self.exposed.push(e);
        self.infectious.push(i);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// One scenario's private simulation state. Networks are shared read-only;
/// everything mutable (disease states, the hazard table, the trajectory
/// buffer, the generator) is owned here, so independent engines can run on
/// independent workers without locking.
pub struct EpidemicEngine {
    network: Arc<ContactNetwork>,
    config: ScenarioConfig,
    rates: Rates,
    rng: StdRng,
    states: Vec<DiseaseState>,
    hazards: Vec<f64>,
    total_hazard: f64,
    s_count: u32,
    e_count: u32,
    i_count: u32,
    time: f64,
    next_checkpoint: usize,
    events_since_resync: usize,
    trajectory: Trajectory,
    stop: Option<Arc<AtomicBool>>,
}

impl EpidemicEngine {
    /// Validates the configuration against the network, seeds the initial
    /// exposed/infectious individuals, and computes the starting hazard
    /// table. Deterministic for a fixed seed.
    pub fn new(
        network: Arc<ContactNetwork>,
        config: &ScenarioConfig,
        seed: u64,
    ) -> Result<Self, ShipnetError> {
        config.validate(network.size())?;

        let n = network.size();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut states = vec![DiseaseState::Susceptible; n];

        let n_seeded = config.init_infectious + config.init_exposed;
        if n_seeded > 0 {
            for (k, person) in index::sample(&mut rng, n, n_seeded).into_iter().enumerate() {
                states[person] = if k < config.init_infectious {
                    DiseaseState::Infectious
                } else {
                    DiseaseState::Exposed
                };
            }
        }

        let mut engine = EpidemicEngine {
            network,
            config: config.clone(),
            rates: config.rates,
            rng,
            states,
            hazards: vec![0.0; n],
            total_hazard: 0.0,
            s_count: (n - n_seeded) as u32,
            e_count: config.init_exposed as u32,
            i_count: config.init_infectious as u32,
            time: 0.0,
            next_checkpoint: 0,
            events_since_resync: 0,
            trajectory: Trajectory {
                population: n,
                ..Trajectory::default()
            },
            stop: None,
        };
        engine.refresh_all_hazards();
        Ok(engine)
    }

    /// Installs a cooperative stop flag, checked between events. Setting the
    /// flag terminates the run at the current snapshot, like a truncation.
    pub fn set_stop_flag(&mut self, stop: Arc<AtomicBool>) {
        self.stop = Some(stop);
    }

    /// Runs to absorption (total hazard zero) or to the horizon, whichever
    /// comes first, and yields the recorded trajectory.
    pub fn run(mut self) -> Result<Trajectory, ShipnetError> {
        self.trajectory
            .record(0.0, self.s_count, self.e_count, self.i_count);

        loop {
            if let Some(stop) = &self.stop {
                if stop.load(Ordering::Relaxed) {
                    debug!("engine stopped cooperatively at t = {:.3}", self.time);
                    break;
                }
            }

            if self.total_hazard <= TOTAL_HAZARD_EPS {
                // No exposed or infectious individuals remain; nothing a
                // pending checkpoint could revive.
                debug!("absorbed at t = {:.3} after {} samples", self.time, self.trajectory.len());
                break;
            }

            let waiting: f64 = self.rng.sample::<f64, _>(Exp1) / self.total_hazard;
            let proposed = self.time + waiting;

            // A checkpoint due before the next transition fires first; the
            // exponential clock is memoryless, so the waiting time is simply
            // redrawn against the refreshed hazards.
            if let Some(checkpoint_time) = self.due_checkpoint(proposed) {
                self.time = checkpoint_time;
                self.apply_checkpoint();
                continue;
            }

            if proposed > self.config.horizon {
                // Truncated epidemic: finish with the current counts as the
                // final state.
                self.time = self.config.horizon;
                self.trajectory
                    .record(self.time, self.s_count, self.e_count, self.i_count);
                debug!("horizon reached with total hazard {:.3e}", self.total_hazard);
                break;
            }

            self.time = proposed;
            let person = self.select_firing_person();
            self.apply_transition(person);
            self.trajectory
                .record(self.time, self.s_count, self.e_count, self.i_count);
        }

        Ok(self.trajectory)
    }

    fn due_checkpoint(&self, proposed: f64) -> Option<f64> {
        let checkpoint = self.config.checkpoints.get(self.next_checkpoint)?;
        let cutoff = f64::min(proposed, self.config.horizon);
        (checkpoint.time <= cutoff).then_some(checkpoint.time)
    }

    fn apply_checkpoint(&mut self) {
        let checkpoint = &self.config.checkpoints[self.next_checkpoint];
        if let Some(network) = &checkpoint.network {
            self.network = Arc::clone(network);
        }
        if let Some(rates) = checkpoint.rates {
            self.rates = rates;
        }
        self.next_checkpoint += 1;
        debug!(
            "checkpoint applied at t = {:.3}, beta = {}",
            self.time, self.rates.beta
        );
        // Topology and rates changed under every standing hazard; the
        // incremental neighbor update is insufficient here.
        self.refresh_all_hazards();
    }

    /// Recomputes every individual's hazard against the active network and
    /// rates. Used at startup and after checkpoints.
    fn refresh_all_hazards(&mut self) {
        let mut total = 0.0;
        for person in 0..self.states.len() {
            let hazard = match self.states[person] {
                DiseaseState::Susceptible => self.infection_hazard(person),
                DiseaseState::Exposed => self.rates.sigma,
                DiseaseState::Infectious => self.rates.gamma + self.rates.mu_i,
                DiseaseState::Removed => 0.0,
            };
            self.hazards[person] = hazard;
            total += hazard;
        }
        self.total_hazard = total;
        self.events_since_resync = 0;
    }

    /// Network-localized force of infection on a susceptible person.
    fn infection_hazard(&self, person: usize) -> f64 {
        let mut pressure = 0.0;
        for edge in self.network.neighbors(PersonId(person)) {
            if self.states[edge.neighbor.0] == DiseaseState::Infectious {
                pressure += f64::from(edge.weight);
            }
        }
        self.rates.beta * pressure
    }

    /// Samples the firing person proportionally to hazard share.
    fn select_firing_person(&mut self) -> usize {
        let mark = self.rng.random_range(0.0..self.total_hazard);
        let mut cumulative = 0.0;
        let mut fallback = 0;
        for (person, &hazard) in self.hazards.iter().enumerate() {
            if hazard <= 0.0 {
                continue;
            }
            cumulative += hazard;
            fallback = person;
            if cumulative > mark {
                return person;
            }
        }
        // Floating-point residue can leave `mark` above the true cumulative
        // total; the last person with positive hazard fires.
        fallback
    }

    fn set_hazard(&mut self, person: usize, hazard: f64) {
        self.total_hazard += hazard - self.hazards[person];
        self.hazards[person] = hazard;
    }

    fn apply_transition(&mut self, person: usize) {
        match self.states[person] {
            DiseaseState::Susceptible => {
                trace!("t = {:.3}: person {person} exposed", self.time);
                self.states[person] = DiseaseState::Exposed;
                self.s_count -= 1;
                self.e_count += 1;
                self.set_hazard(person, self.rates.sigma);
            }
            DiseaseState::Exposed => {
                trace!("t = {:.3}: person {person} infectious", self.time);
                self.states[person] = DiseaseState::Infectious;
                self.e_count -= 1;
                self.i_count += 1;
                self.set_hazard(person, self.rates.gamma + self.rates.mu_i);
                self.update_susceptible_neighbors(person, 1.0);
            }
            DiseaseState::Infectious => {
                trace!("t = {:.3}: person {person} removed", self.time);
                self.states[person] = DiseaseState::Removed;
                self.i_count -= 1;
                self.set_hazard(person, 0.0);
                self.update_susceptible_neighbors(person, -1.0);
            }
            DiseaseState::Removed => {
                // Removed individuals hold zero hazard and can never fire.
                unreachable!("removed person selected for a transition")
            }
        }

        self.events_since_resync += 1;
        if self.events_since_resync >= RESYNC_INTERVAL {
            self.total_hazard = self.hazards.iter().sum();
            self.events_since_resync = 0;
        }
    }

    /// Adds (`sign` = +1) or removes (`sign` = -1) this person's infectious
    /// pressure from each susceptible neighbor's hazard.
    fn update_susceptible_neighbors(&mut self, person: usize, sign: f64) {
        let network = Arc::clone(&self.network);
        for edge in network.neighbors(PersonId(person)) {
            let neighbor = edge.neighbor.0;
            if self.states[neighbor] == DiseaseState::Susceptible {
                let mut hazard =
                    self.hazards[neighbor] + sign * self.rates.beta * f64::from(edge.weight);
                if hazard < 0.0 {
                    // Subtraction residue only; a susceptible neighbor of no
                    // infectious person has exactly zero hazard.
                    hazard = 0.0;
                }
                self.set_hazard(neighbor, hazard);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_network, derive_quarantine, NetworkConfig, QuarantineConfig};
    use crate::network::ContactNetwork;
    use crate::people::{Person, Role};
    use crate::scenario::Checkpoint;

    fn rates() -> Rates {
        Rates {
            beta: 0.8,
            sigma: 1.0 / 5.0,
            gamma: 1.0 / 7.0,
            mu_i: 0.013 / 7.0,
        }
    }

    fn config(init_exposed: usize, init_infectious: usize) -> ScenarioConfig {
        ScenarioConfig {
            rates: rates(),
            init_exposed,
            init_infectious,
            horizon: 60.0,
            checkpoints: Vec::new(),
        }
    }

    fn ship(seed: u64) -> Arc<ContactNetwork> {
        Arc::new(build_network(70, 30, &NetworkConfig::default(), seed).unwrap())
    }

    fn edgeless(n: usize) -> Arc<ContactNetwork> {
        let people = (0..n)
            .map(|i| Person {
                role: Role::Passenger,
                cabin_id: i / 2,
                deck: Some(1),
                service_type: None,
            })
            .collect();
        Arc::new(ContactNetwork::new(people))
    }

    #[test]
    fn zero_seed_trajectory_is_flat() {
        let engine = EpidemicEngine::new(ship(42), &config(0, 0), 1).unwrap();
        let trajectory = engine.run().unwrap();

        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory.time[0], 0.0);
        assert_eq!(trajectory.susceptible[0], 100);
        assert_eq!(trajectory.exposed[0], 0);
        assert_eq!(trajectory.infectious[0], 0);
    }

    #[test]
    fn susceptible_count_never_increases() {
        let engine = EpidemicEngine::new(ship(42), &config(5, 5), 1).unwrap();
        let trajectory = engine.run().unwrap();

        for pair in trajectory.susceptible.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn compartments_conserve_population() {
        let engine = EpidemicEngine::new(ship(42), &config(5, 5), 1).unwrap();
        let trajectory = engine.run().unwrap();

        // S + E + I + removed is exactly N at every sample; removed is the
        // complement by construction.
        for k in 0..trajectory.len() {
            let seen =
                trajectory.susceptible[k] + trajectory.exposed[k] + trajectory.infectious[k];
            assert!(seen <= 100);
        }
        // Times are strictly ordered.
        for pair in trajectory.time.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn runs_are_deterministic_for_a_fixed_seed() {
        let a = EpidemicEngine::new(ship(42), &config(2, 5), 7)
            .unwrap()
            .run()
            .unwrap();
        let b = EpidemicEngine::new(ship(42), &config(2, 5), 7)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn isolated_nodes_are_never_exposed() {
        // No edges at all: the seeded individuals progress and are removed,
        // but transmission is impossible.
        let engine = EpidemicEngine::new(edgeless(50), &config(0, 3), 11).unwrap();
        let trajectory = engine.run().unwrap();

        assert!(trajectory.susceptible.iter().all(|&s| s == 47));
        assert_eq!(*trajectory.infectious.last().unwrap(), 0);
    }

    #[test]
    fn horizon_truncates_with_final_snapshot() {
        let mut cfg = config(0, 5);
        cfg.horizon = 0.05;
        let engine = EpidemicEngine::new(ship(42), &cfg, 3).unwrap();
        let trajectory = engine.run().unwrap();

        let last = *trajectory.time.last().unwrap();
        assert!(last <= 0.05 + f64::EPSILON);
        // Either absorbed early (unlikely with 5 infectious) or truncated
        // exactly at the horizon.
        assert_eq!(last, 0.05);
    }

    #[test]
    fn stop_flag_halts_the_run() {
        let stop = Arc::new(AtomicBool::new(true));
        let mut engine = EpidemicEngine::new(ship(42), &config(0, 5), 3).unwrap();
        engine.set_stop_flag(Arc::clone(&stop));
        let trajectory = engine.run().unwrap();

        // Stopped before the first event; only the initial snapshot exists.
        assert_eq!(trajectory.len(), 1);
    }

    #[test]
    fn checkpoint_swaps_network_and_rates() {
        let normal = ship(42);
        let quarantine = Arc::new(
            derive_quarantine(&normal, &QuarantineConfig::default(), 43).unwrap(),
        );

        let mut cfg = config(0, 5);
        cfg.checkpoints.push(Checkpoint {
            time: 5.0,
            network: Some(quarantine),
            rates: Some(Rates {
                beta: 0.8 * 0.2,
                ..rates()
            }),
        });

        let trajectory = EpidemicEngine::new(normal, &cfg, 7).unwrap().run().unwrap();
        // The run must get past the checkpoint and remain well-formed.
        assert!(*trajectory.time.last().unwrap() >= 5.0 || *trajectory.infectious.last().unwrap() == 0);
        for pair in trajectory.susceptible.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn checkpoint_fires_even_when_process_is_quiet() {
        // A single infectious person on an edgeless network is removed
        // quickly; the checkpoint after that must not wedge the loop.
        let mut cfg = config(0, 1);
        cfg.checkpoints.push(Checkpoint {
            time: 50.0,
            network: Some(edgeless(50)),
            rates: None,
        });
        let trajectory = EpidemicEngine::new(edgeless(50), &cfg, 5).unwrap().run().unwrap();
        assert_eq!(*trajectory.infectious.last().unwrap(), 0);
    }

    #[test]
    fn seeding_more_than_population_is_rejected() {
        let result = EpidemicEngine::new(edgeless(3), &config(2, 2), 1);
        assert!(matches!(result, Err(ShipnetError::Config(_))));
    }
}
