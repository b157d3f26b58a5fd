//! The individuals aboard: passengers and crew.
//!
//! People are created once when the contact network is built and are
//! immutable afterwards. A `PersonId` is a dense index into the network's
//! roster, which keeps the engine's per-person hazard and disease-state
//! tables simple arrays.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A dense, opaque identifier for one individual.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(pub usize);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Passenger,
    Crew,
}

/// Whether a crew member works in passenger-facing service. Only
/// passenger-service crew acquire service edges to passengers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    PassengerService,
    NonPassengerService,
}

/// Immutable attributes of one individual, fixed at network-build time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub role: Role,
    pub cabin_id: usize,
    /// Deck assignment; passengers only.
    pub deck: Option<u8>,
    /// Service assignment; crew only.
    pub service_type: Option<ServiceType>,
}

impl Person {
    pub fn is_passenger(&self) -> bool {
        self.role == Role::Passenger
    }

    pub fn is_service_crew(&self) -> bool {
        self.service_type == Some(ServiceType::PassengerService)
    }
}
