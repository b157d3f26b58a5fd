//! The weighted contact network.
//!
//! Edge lookup, weight access, and edge insertion use an explicit
//! adjacency-list structure with O(1) neighbor iteration, since the engine's
//! hot path (recomputing hazards over a node's neighbors) runs once per
//! transmission event at population scale.
//!
//! Networks are undirected with no self-loops and at most one edge per pair;
//! disconnected components and isolated nodes are valid. Once built, a
//! network is read-only and can be shared across concurrently running
//! scenarios.

use serde::{Deserialize, Serialize};

use crate::error::ShipnetError;
use crate::people::{Person, PersonId};
use crate::HashSet;

/// The kind of contact an edge models, in descending build priority. When the
/// builder produces multiple raw contacts for the same pair, the first one
/// inserted wins, so earlier (higher-risk) types dominate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactType {
    Cabin,
    Dining,
    Deck,
    Facility,
    Work,
    Service,
    Transient,
}

/// One directed half of an undirected contact edge, as stored in the
/// adjacency list of the node at the other end.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    pub neighbor: PersonId,
    pub weight: f32,
    pub contact_type: ContactType,
}

/// Converts a modeled contact duration in hours to an edge weight in (0, 1)
/// via the saturating transform `1 - exp(-d / scale)`. Brief contacts
/// contribute near-zero force of infection; sustained contacts (cabin mates)
/// approach a ceiling near 1.
#[must_use]
pub fn contact_weight(duration_hours: f64, saturation_hours: f64) -> f32 {
    (1.0 - (-duration_hours / saturation_hours).exp()) as f32
}

pub struct ContactNetwork {
    people: Vec<Person>,
    adjacency: Vec<Vec<Edge>>,
    // Normalized (low, high) pairs for O(1) duplicate suppression.
    pairs: HashSet<(usize, usize)>,
    edge_count: usize,
}

impl ContactNetwork {
    #[must_use]
    pub fn new(people: Vec<Person>) -> Self {
        let n = people.len();
        ContactNetwork {
            people,
            adjacency: vec![Vec::new(); n],
            pairs: HashSet::default(),
            edge_count: 0,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.people.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn person(&self, id: PersonId) -> &Person {
        &self.people[id.0]
    }

    #[must_use]
    pub fn roster(&self) -> &[Person] {
        &self.people
    }

    pub fn people(&self) -> impl Iterator<Item = (PersonId, &Person)> {
        self.people.iter().enumerate().map(|(i, p)| (PersonId(i), p))
    }

    /// Adds an undirected edge. Fails on self-loops, out-of-roster ids,
    /// weights outside (0, 1), and duplicate pairs.
    pub fn add_edge(
        &mut self,
        person: PersonId,
        neighbor: PersonId,
        weight: f32,
        contact_type: ContactType,
    ) -> Result<(), ShipnetError> {
        if person == neighbor {
            return Err(ShipnetError::InvariantViolation(String::from(
                "cannot make edge to self",
            )));
        }
        if person.0 >= self.people.len() || neighbor.0 >= self.people.len() {
            return Err(ShipnetError::InvariantViolation(String::from(
                "edge endpoint outside roster",
            )));
        }
        if !weight.is_finite() || weight <= 0.0 || weight >= 1.0 {
            return Err(ShipnetError::InvariantViolation(format!(
                "edge weight {weight} outside (0, 1)"
            )));
        }
        if !self.pairs.insert(normalize(person, neighbor)) {
            return Err(ShipnetError::InvariantViolation(format!(
                "edge {person}-{neighbor} already exists"
            )));
        }

        self.adjacency[person.0].push(Edge {
            neighbor,
            weight,
            contact_type,
        });
        self.adjacency[neighbor.0].push(Edge {
            neighbor: person,
            weight,
            contact_type,
        });
        self.edge_count += 1;
        Ok(())
    }

    #[must_use]
    pub fn has_edge(&self, person: PersonId, neighbor: PersonId) -> bool {
        self.pairs.contains(&normalize(person, neighbor))
    }

    #[must_use]
    pub fn get_edge(&self, person: PersonId, neighbor: PersonId) -> Option<&Edge> {
        self.adjacency
            .get(person.0)?
            .iter()
            .find(|e| e.neighbor == neighbor)
    }

    /// All edges incident to `person`. O(1) access to the underlying slice.
    #[must_use]
    pub fn neighbors(&self, person: PersonId) -> &[Edge] {
        &self.adjacency[person.0]
    }

    /// Iterates every undirected edge exactly once, as `(low endpoint, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (PersonId, &Edge)> {
        self.adjacency.iter().enumerate().flat_map(|(i, edges)| {
            edges
                .iter()
                .filter(move |e| i < e.neighbor.0)
                .map(move |e| (PersonId(i), e))
        })
    }
}

fn normalize(a: PersonId, b: PersonId) -> (usize, usize) {
    if a.0 < b.0 {
        (a.0, b.0)
    } else {
        (b.0, a.0)
    }
}
