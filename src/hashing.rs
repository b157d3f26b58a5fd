//! Deterministic hashing data structures and helpers.
//!
//! The hashing data structures in the standard library are not deterministic:
//! the default hasher is randomly seeded per process. Simulation results must
//! be reproducible given a seed, so hash-ordered iteration anywhere in the
//! build or run path has to be stable. This module re-exports `FxHashMap` /
//! `FxHashSet` under the plain names, and provides `hash_str` (a stable xxh3)
//! for deriving per-scenario seed offsets from scenario names.

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use xxhash_rust::xxh3::xxh3_64;

/// A stable 64-bit hash of a `&str`, identical across runs and platforms.
#[must_use]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}
