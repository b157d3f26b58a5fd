//! Stochastic network epidemic simulation for closed shipboard populations.
//!
//! Shipnet estimates how interventions (cabin quarantine, single- and
//! two-dose vaccination) change the trajectory of a contagious outbreak in a
//! closed population with heterogeneous, structured contact: a cruise ship.
//! Transmission runs over an explicit weighted contact network rather than a
//! homogeneous-mixing compartment, so cabin mates, dining cohorts, work
//! teams, and passing strangers all exert different forces of infection.
//!
//! A simulation consists of:
//! * A network builder that lays down the shipboard contact structure and
//!   derives the cabin-quarantine variant from it.
//! * A scenario parameterizer that maps each intervention strategy to an
//!   effective transmission rate and, for quarantine, a mid-run checkpoint
//!   that swaps the active network.
//! * A continuous-time stochastic engine (Gillespie simulation) advancing
//!   individuals through S -> E -> I -> removed over the active network.
//! * An outcome aggregator that derives recovered/deceased totals and the
//!   summary metrics (attack rate, CFR, peak) from the recorded trajectory.
//!
//! Reporting, plotting, and file output consume the result records and live
//! outside this crate.

pub mod builder;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod log;
pub mod network;
pub mod outcome;
pub mod params;
pub mod people;
pub mod runner;
pub mod scenario;

pub use hashing::{HashMap, HashSet};

pub mod prelude {
    pub use crate::builder::{
        build_network, derive_quarantine, NetworkConfig, QuarantineConfig,
    };
    pub use crate::engine::{DiseaseState, EpidemicEngine, Trajectory};
    pub use crate::error::ShipnetError;
    pub use crate::log::{debug, error, info, trace, warn};
    pub use crate::network::{contact_weight, ContactNetwork, ContactType, Edge};
    pub use crate::outcome::{aggregate, ScenarioResult};
    pub use crate::params::{DiseaseParameters, SimulationParameters};
    pub use crate::people::{Person, PersonId, Role, ServiceType};
    pub use crate::runner::{run_scenario, run_scenarios};
    pub use crate::scenario::{
        parameterize, standard_plans, Checkpoint, InterventionConfig, InterventionStrategy,
        Rates, ScenarioConfig, ScenarioPlan,
    };
}
