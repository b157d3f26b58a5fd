//! Construction of the shipboard contact network and its quarantine variant.
//!
//! The build layers contact types in descending risk order: cabin pairings,
//! dining cohorts, deck-level encounters, shared facilities, crew work teams,
//! passenger-service interactions, and transient random encounters. Each
//! pair keeps only its first edge, so higher-risk contact types dominate the
//! effective transmission weight.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ShipnetError;
use crate::log::{debug, info};
use crate::network::{contact_weight, ContactNetwork, ContactType};
use crate::people::{Person, PersonId, Role, ServiceType};

/// A bounded uniform range of contact durations, in hours.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    pub lo: f64,
    pub hi: f64,
}

impl DurationRange {
    #[must_use]
    pub fn new(lo: f64, hi: f64) -> Self {
        DurationRange { lo, hi }
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        rng.random_range(self.lo..=self.hi)
    }

    fn validate(&self, label: &str) -> Result<(), ShipnetError> {
        if !(self.lo > 0.0 && self.lo <= self.hi && self.hi <= 24.0) {
            return Err(ShipnetError::Config(format!(
                "{label} duration range ({}, {}) must satisfy 0 < lo <= hi <= 24",
                self.lo, self.hi
            )));
        }
        Ok(())
    }
}

/// Sampled contact durations per contact type. Passenger and crew cabins
/// differ because crew spend part of the day on shift.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactDurations {
    pub cabin_passenger: DurationRange,
    pub cabin_crew: DurationRange,
    pub dining: DurationRange,
    pub deck: DurationRange,
    pub facility: DurationRange,
    pub work: DurationRange,
    pub service: DurationRange,
    pub transient: DurationRange,
}

impl Default for ContactDurations {
    fn default() -> Self {
        ContactDurations {
            cabin_passenger: DurationRange::new(16.0, 20.0),
            cabin_crew: DurationRange::new(12.0, 16.0),
            dining: DurationRange::new(1.5, 3.0),
            deck: DurationRange::new(0.5, 2.0),
            facility: DurationRange::new(0.5, 1.5),
            work: DurationRange::new(6.0, 10.0),
            service: DurationRange::new(0.1, 0.5),
            transient: DurationRange::new(0.05, 0.2),
        }
    }
}

/// Structural parameters of the contact network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Dining cohort and crew work team size.
    pub cohort_size: usize,
    /// Number of decks passengers are distributed over.
    pub decks: u8,
    /// Number of shared facilities (pool, lounge, gym, ...).
    pub facilities: usize,
    /// Users drawn per facility, clamped to the passenger count.
    pub facility_users: (usize, usize),
    /// Facility users are linked within a sliding window of this size.
    pub facility_window: usize,
    /// Sampled deck-edge attempts per deck resident.
    pub deck_contacts_per_person: usize,
    /// Hard cap on deck-edge attempts per deck.
    pub deck_contact_cap: usize,
    /// Fraction of crew assigned to passenger-facing service.
    pub service_crew_fraction: f64,
    /// Passengers served per service crew member, clamped to the
    /// passenger count.
    pub served_passengers: (usize, usize),
    /// Transient random-encounter attempts per person.
    pub transient_contacts_per_person: usize,
    /// Saturation scale of the duration-to-weight transform, in hours.
    pub saturation_hours: f64,
    pub durations: ContactDurations,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            cohort_size: 8,
            decks: 17,
            facilities: 6,
            facility_users: (200, 500),
            facility_window: 12,
            deck_contacts_per_person: 5,
            deck_contact_cap: 100,
            service_crew_fraction: 0.5,
            served_passengers: (10, 25),
            transient_contacts_per_person: 5,
            saturation_hours: 3.0,
            durations: ContactDurations::default(),
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self, n_total: usize) -> Result<(), ShipnetError> {
        if n_total == 0 {
            return Err(ShipnetError::Config(String::from(
                "population size must be positive",
            )));
        }
        if self.cohort_size < 2 {
            return Err(ShipnetError::Config(String::from(
                "cohort size must be at least 2",
            )));
        }
        if self.cohort_size > n_total {
            return Err(ShipnetError::Config(format!(
                "cohort size {} exceeds population {n_total}",
                self.cohort_size
            )));
        }
        if self.decks == 0 {
            return Err(ShipnetError::Config(String::from(
                "at least one deck is required",
            )));
        }
        if !(0.0..=1.0).contains(&self.service_crew_fraction) {
            return Err(ShipnetError::Config(format!(
                "service crew fraction {} outside [0, 1]",
                self.service_crew_fraction
            )));
        }
        if self.facility_users.0 > self.facility_users.1 {
            return Err(ShipnetError::Config(String::from(
                "facility user range is inverted",
            )));
        }
        if self.served_passengers.0 > self.served_passengers.1 {
            return Err(ShipnetError::Config(String::from(
                "served passenger range is inverted",
            )));
        }
        if !(self.saturation_hours > 0.0) {
            return Err(ShipnetError::Config(String::from(
                "saturation scale must be positive",
            )));
        }
        let d = &self.durations;
        d.cabin_passenger.validate("passenger cabin")?;
        d.cabin_crew.validate("crew cabin")?;
        d.dining.validate("dining")?;
        d.deck.validate("deck")?;
        d.facility.validate("facility")?;
        d.work.validate("work")?;
        d.service.validate("service")?;
        d.transient.validate("transient")?;
        Ok(())
    }
}

/// Parameters of the quarantine transform. The observed defaults keep 20% of
/// work edges at 30% of their weight; both are scenario knobs rather than
/// hard-coded constants.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarantineConfig {
    pub work_edge_retention: f64,
    pub work_weight_multiplier: f64,
}

impl Default for QuarantineConfig {
    fn default() -> Self {
        QuarantineConfig {
            work_edge_retention: 0.2,
            work_weight_multiplier: 0.3,
        }
    }
}

impl QuarantineConfig {
    pub fn validate(&self) -> Result<(), ShipnetError> {
        if !(0.0..=1.0).contains(&self.work_edge_retention) {
            return Err(ShipnetError::Config(format!(
                "work edge retention {} outside [0, 1]",
                self.work_edge_retention
            )));
        }
        if !(self.work_weight_multiplier > 0.0 && self.work_weight_multiplier < 1.0) {
            return Err(ShipnetError::Config(format!(
                "work weight multiplier {} outside (0, 1)",
                self.work_weight_multiplier
            )));
        }
        Ok(())
    }
}

/// Builds the normal-operations contact network for the given passenger and
/// crew counts. Deterministic for a fixed seed.
pub fn build_network(
    n_passengers: usize,
    n_crew: usize,
    config: &NetworkConfig,
    seed: u64,
) -> Result<ContactNetwork, ShipnetError> {
    let n_total = n_passengers + n_crew;
    config.validate(n_total)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut net = ContactNetwork::new(make_roster(n_passengers, n_crew, config, &mut rng));

    add_cabin_edges(&mut net, n_passengers, n_total, config, &mut rng)?;
    add_dining_edges(&mut net, n_passengers, config, &mut rng)?;
    add_deck_edges(&mut net, n_passengers, config, &mut rng)?;
    add_facility_edges(&mut net, n_passengers, config, &mut rng)?;
    add_work_edges(&mut net, n_passengers, n_total, config, &mut rng)?;
    add_service_edges(&mut net, n_passengers, n_total, config, &mut rng)?;
    add_transient_edges(&mut net, n_total, config, &mut rng)?;

    info!(
        "built contact network: {} nodes, {} edges, mean degree {:.1}",
        net.size(),
        net.edge_count(),
        2.0 * net.edge_count() as f64 / net.size() as f64
    );
    Ok(net)
}

/// Derives the quarantine network: every cabin edge unchanged, a seeded
/// Bernoulli sample of work edges at reduced weight, nothing else. The input
/// network is not mutated and the node set is preserved.
pub fn derive_quarantine(
    network: &ContactNetwork,
    config: &QuarantineConfig,
    seed: u64,
) -> Result<ContactNetwork, ShipnetError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut quarantined = ContactNetwork::new(network.roster().to_vec());

    for (person, edge) in network.edges() {
        match edge.contact_type {
            ContactType::Cabin => {
                quarantined.add_edge(person, edge.neighbor, edge.weight, ContactType::Cabin)?;
            }
            ContactType::Work => {
                if rng.random_bool(config.work_edge_retention) {
                    let weight = edge.weight * config.work_weight_multiplier as f32;
                    quarantined.add_edge(person, edge.neighbor, weight, ContactType::Work)?;
                }
            }
            _ => {}
        }
    }

    info!(
        "derived quarantine network: {} of {} edges retained",
        quarantined.edge_count(),
        network.edge_count()
    );
    Ok(quarantined)
}

fn make_roster(
    n_passengers: usize,
    n_crew: usize,
    config: &NetworkConfig,
    rng: &mut StdRng,
) -> Vec<Person> {
    let mut people = Vec::with_capacity(n_passengers + n_crew);
    for i in 0..n_passengers {
        people.push(Person {
            role: Role::Passenger,
            cabin_id: i / 2,
            deck: Some(rng.random_range(1..=config.decks)),
            service_type: None,
        });
    }
    for j in 0..n_crew {
        let service_type = if rng.random_bool(config.service_crew_fraction) {
            ServiceType::PassengerService
        } else {
            ServiceType::NonPassengerService
        };
        people.push(Person {
            role: Role::Crew,
            cabin_id: n_passengers.div_ceil(2) + j / 2,
            deck: None,
            service_type: Some(service_type),
        });
    }
    people
}

/// Pairs consecutive ids into two-person cabins. An odd leftover individual
/// gets no cabin edge.
fn add_cabin_edges(
    net: &mut ContactNetwork,
    n_passengers: usize,
    n_total: usize,
    config: &NetworkConfig,
    rng: &mut StdRng,
) -> Result<(), ShipnetError> {
    for i in (0..n_passengers).step_by(2) {
        if i + 1 < n_passengers {
            let duration = config.durations.cabin_passenger.sample(rng);
            let weight = contact_weight(duration, config.saturation_hours);
            net.add_edge(PersonId(i), PersonId(i + 1), weight, ContactType::Cabin)?;
        }
    }
    for i in (n_passengers..n_total).step_by(2) {
        if i + 1 < n_total {
            let duration = config.durations.cabin_crew.sample(rng);
            let weight = contact_weight(duration, config.saturation_hours);
            net.add_edge(PersonId(i), PersonId(i + 1), weight, ContactType::Cabin)?;
        }
    }
    Ok(())
}

/// Shuffles passengers into dining cohorts and links each cohort completely.
/// The final cohort may be smaller than the configured size.
fn add_dining_edges(
    net: &mut ContactNetwork,
    n_passengers: usize,
    config: &NetworkConfig,
    rng: &mut StdRng,
) -> Result<(), ShipnetError> {
    let mut passengers: Vec<usize> = (0..n_passengers).collect();
    passengers.shuffle(rng);

    for cohort in passengers.chunks(config.cohort_size) {
        add_clique(net, cohort, ContactType::Dining, config.durations.dining, config, rng)?;
    }
    Ok(())
}

/// Random encounters between passengers sharing a deck, bounded per deck.
fn add_deck_edges(
    net: &mut ContactNetwork,
    n_passengers: usize,
    config: &NetworkConfig,
    rng: &mut StdRng,
) -> Result<(), ShipnetError> {
    let mut deck_groups: Vec<Vec<usize>> = vec![Vec::new(); config.decks as usize + 1];
    for i in 0..n_passengers {
        if let Some(deck) = net.person(PersonId(i)).deck {
            deck_groups[deck as usize].push(i);
        }
    }

    for residents in &deck_groups {
        if residents.len() < 2 {
            continue;
        }
        let attempts = usize::min(
            residents.len() * config.deck_contacts_per_person,
            config.deck_contact_cap,
        );
        for _ in 0..attempts {
            let pair = index::sample(rng, residents.len(), 2);
            let (u, v) = (PersonId(residents[pair.index(0)]), PersonId(residents[pair.index(1)]));
            if !net.has_edge(u, v) {
                let duration = config.durations.deck.sample(rng);
                let weight = contact_weight(duration, config.saturation_hours);
                net.add_edge(u, v, weight, ContactType::Deck)?;
            }
        }
    }
    Ok(())
}

/// Shared facilities (pool, lounge, gym, ...): each draws a random set of
/// passenger users and links users within a sliding window, modeling
/// overlapping visit times.
fn add_facility_edges(
    net: &mut ContactNetwork,
    n_passengers: usize,
    config: &NetworkConfig,
    rng: &mut StdRng,
) -> Result<(), ShipnetError> {
    if n_passengers < 2 {
        return Ok(());
    }
    for _ in 0..config.facilities {
        let drawn = rng.random_range(config.facility_users.0..=config.facility_users.1);
        let n_users = usize::min(drawn, n_passengers);
        if n_users < 2 {
            continue;
        }
        let users = index::sample(rng, n_passengers, n_users);
        for i in 0..n_users {
            for j in (i + 1)..usize::min(i + config.facility_window, n_users) {
                let (u, v) = (PersonId(users.index(i)), PersonId(users.index(j)));
                if !net.has_edge(u, v) {
                    let duration = config.durations.facility.sample(rng);
                    let weight = contact_weight(duration, config.saturation_hours);
                    net.add_edge(u, v, weight, ContactType::Facility)?;
                }
            }
        }
    }
    Ok(())
}

/// Shuffles crew into work teams and links each team completely.
fn add_work_edges(
    net: &mut ContactNetwork,
    n_passengers: usize,
    n_total: usize,
    config: &NetworkConfig,
    rng: &mut StdRng,
) -> Result<(), ShipnetError> {
    let mut crew: Vec<usize> = (n_passengers..n_total).collect();
    crew.shuffle(rng);

    for team in crew.chunks(config.cohort_size) {
        add_clique(net, team, ContactType::Work, config.durations.work, config, rng)?;
    }
    Ok(())
}

/// Bipartite service edges from passenger-service crew to a random subset of
/// passengers.
fn add_service_edges(
    net: &mut ContactNetwork,
    n_passengers: usize,
    n_total: usize,
    config: &NetworkConfig,
    rng: &mut StdRng,
) -> Result<(), ShipnetError> {
    if n_passengers == 0 {
        return Ok(());
    }
    for c in n_passengers..n_total {
        if !net.person(PersonId(c)).is_service_crew() {
            continue;
        }
        let drawn = rng.random_range(config.served_passengers.0..=config.served_passengers.1);
        let n_served = usize::min(drawn, n_passengers);
        if n_served == 0 {
            continue;
        }
        let served = index::sample(rng, n_passengers, n_served);
        for p in served {
            let (u, v) = (PersonId(c), PersonId(p));
            if !net.has_edge(u, v) {
                let duration = config.durations.service.sample(rng);
                let weight = contact_weight(duration, config.saturation_hours);
                net.add_edge(u, v, weight, ContactType::Service)?;
            }
        }
    }
    Ok(())
}

/// Very brief random encounters anywhere on the ship.
fn add_transient_edges(
    net: &mut ContactNetwork,
    n_total: usize,
    config: &NetworkConfig,
    rng: &mut StdRng,
) -> Result<(), ShipnetError> {
    if n_total < 2 {
        return Ok(());
    }
    let attempts = n_total * config.transient_contacts_per_person;
    for _ in 0..attempts {
        let pair = index::sample(rng, n_total, 2);
        let (u, v) = (PersonId(pair.index(0)), PersonId(pair.index(1)));
        if !net.has_edge(u, v) {
            let duration = config.durations.transient.sample(rng);
            let weight = contact_weight(duration, config.saturation_hours);
            net.add_edge(u, v, weight, ContactType::Transient)?;
        }
    }
    debug!("transient pass: {} attempts, {} total edges", attempts, net.edge_count());
    Ok(())
}

/// Links every pair within a group, skipping pairs that already have an edge
/// from an earlier (higher-priority) pass.
fn add_clique(
    net: &mut ContactNetwork,
    members: &[usize],
    contact_type: ContactType,
    durations: DurationRange,
    config: &NetworkConfig,
    rng: &mut StdRng,
) -> Result<(), ShipnetError> {
    for (i, &u) in members.iter().enumerate() {
        for &v in &members[i + 1..] {
            let (u, v) = (PersonId(u), PersonId(v));
            if !net.has_edge(u, v) {
                let duration = durations.sample(rng);
                let weight = contact_weight(duration, config.saturation_hours);
                net.add_edge(u, v, weight, contact_type)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Edge;

    fn small_network() -> ContactNetwork {
        build_network(70, 30, &NetworkConfig::default(), 42).unwrap()
    }

    #[test]
    fn build_rejects_empty_population() {
        let result = build_network(0, 0, &NetworkConfig::default(), 42);
        assert!(matches!(result, Err(ShipnetError::Config(_))));
    }

    #[test]
    fn build_rejects_oversized_cohort() {
        let config = NetworkConfig {
            cohort_size: 500,
            ..NetworkConfig::default()
        };
        assert!(matches!(
            build_network(70, 30, &config, 42),
            Err(ShipnetError::Config(_))
        ));
    }

    #[test]
    fn build_rejects_bad_durations() {
        let mut config = NetworkConfig::default();
        config.durations.dining = DurationRange::new(3.0, 1.5);
        assert!(matches!(
            build_network(70, 30, &config, 42),
            Err(ShipnetError::Config(_))
        ));

        let mut config = NetworkConfig::default();
        config.durations.transient = DurationRange::new(0.0, 0.2);
        assert!(matches!(
            build_network(70, 30, &config, 42),
            Err(ShipnetError::Config(_))
        ));
    }

    #[test]
    fn roster_has_expected_structure() {
        let net = small_network();
        assert_eq!(net.size(), 100);
        let n_passengers = net.people().filter(|(_, p)| p.is_passenger()).count();
        assert_eq!(n_passengers, 70);

        for (id, person) in net.people() {
            match person.role {
                Role::Passenger => {
                    assert_eq!(person.cabin_id, id.0 / 2);
                    assert!(person.deck.is_some());
                    assert!(person.service_type.is_none());
                }
                Role::Crew => {
                    assert!(person.deck.is_none());
                    assert!(person.service_type.is_some());
                }
            }
        }
    }

    #[test]
    fn every_person_has_at_most_one_cabin_edge() {
        let net = small_network();
        for (id, _) in net.people() {
            let cabin_edges = net
                .neighbors(id)
                .iter()
                .filter(|e| e.contact_type == ContactType::Cabin)
                .count();
            assert!(cabin_edges <= 1, "person {id} has {cabin_edges} cabin edges");
        }
    }

    #[test]
    fn odd_crew_leftover_has_no_cabin_edge() {
        // 5 crew: the last one has no cabin mate.
        let net = build_network(4, 5, &NetworkConfig::default(), 7).unwrap();
        let last = PersonId(8);
        assert!(net
            .neighbors(last)
            .iter()
            .all(|e| e.contact_type != ContactType::Cabin));
    }

    #[test]
    fn weights_lie_in_open_unit_interval() {
        let net = small_network();
        for (_, edge) in net.edges() {
            assert!(edge.weight > 0.0 && edge.weight < 1.0);
        }
    }

    #[test]
    fn service_edges_are_bipartite() {
        let net = small_network();
        for (u, edge) in net.edges() {
            if edge.contact_type == ContactType::Service {
                let a = net.person(u);
                let b = net.person(edge.neighbor);
                assert!(a.is_passenger() != b.is_passenger());
                assert!(a.is_service_crew() || b.is_service_crew());
            }
        }
    }

    #[test]
    fn build_is_deterministic() {
        let a = small_network();
        let b = small_network();
        assert_eq!(a.edge_count(), b.edge_count());
        for ((ua, ea), (ub, eb)) in a.edges().zip(b.edges()) {
            assert_eq!(ua, ub);
            assert_eq!(ea, eb);
        }
    }

    #[test]
    fn passengerless_ship_has_no_passenger_edge_types() {
        // No passengers: dining, deck, facility, and service passes find no
        // candidates and silently contribute zero edges.
        let net = build_network(0, 10, &NetworkConfig::default(), 42).unwrap();
        for (_, edge) in net.edges() {
            assert!(matches!(
                edge.contact_type,
                ContactType::Cabin | ContactType::Work | ContactType::Transient
            ));
        }
        assert!(net.edge_count() > 0);
    }

    #[test]
    fn crewless_ship_has_no_crew_edge_types() {
        let config = NetworkConfig {
            cohort_size: 2,
            ..NetworkConfig::default()
        };
        let net = build_network(4, 0, &config, 42).unwrap();
        for (_, edge) in net.edges() {
            assert!(
                edge.contact_type != ContactType::Work
                    && edge.contact_type != ContactType::Service
            );
        }
    }

    #[test]
    fn quarantine_preserves_nodes_and_restricts_edges() {
        let net = small_network();
        let quarantined = derive_quarantine(&net, &QuarantineConfig::default(), 43).unwrap();

        assert_eq!(quarantined.size(), net.size());
        assert_eq!(quarantined.roster(), net.roster());
        assert!(quarantined.edge_count() < net.edge_count());

        let multiplier = QuarantineConfig::default().work_weight_multiplier as f32;
        for (u, edge) in quarantined.edges() {
            let original: &Edge = net.get_edge(u, edge.neighbor).unwrap();
            match edge.contact_type {
                ContactType::Cabin => assert_eq!(edge.weight, original.weight),
                ContactType::Work => {
                    assert_eq!(edge.weight, original.weight * multiplier);
                }
                other => panic!("unexpected contact type {other:?} in quarantine network"),
            }
        }
    }

    #[test]
    fn quarantine_keeps_every_cabin_edge() {
        let net = small_network();
        let quarantined = derive_quarantine(&net, &QuarantineConfig::default(), 43).unwrap();
        for (u, edge) in net.edges() {
            if edge.contact_type == ContactType::Cabin {
                assert!(quarantined.has_edge(u, edge.neighbor));
            }
        }
    }

    #[test]
    fn quarantine_is_deterministic_and_pure() {
        let net = small_network();
        let edges_before = net.edge_count();
        let a = derive_quarantine(&net, &QuarantineConfig::default(), 9).unwrap();
        let b = derive_quarantine(&net, &QuarantineConfig::default(), 9).unwrap();
        assert_eq!(net.edge_count(), edges_before);
        assert_eq!(a.edge_count(), b.edge_count());
        for ((ua, ea), (ub, eb)) in a.edges().zip(b.edges()) {
            assert_eq!(ua, ub);
            assert_eq!(ea, eb);
        }
    }

    #[test]
    fn quarantine_rejects_bad_config() {
        let net = build_network(10, 4, &NetworkConfig::default(), 1).unwrap();
        let config = QuarantineConfig {
            work_edge_retention: 1.5,
            ..QuarantineConfig::default()
        };
        assert!(matches!(
            derive_quarantine(&net, &config, 1),
            Err(ShipnetError::Config(_))
        ));
    }
}
