//! A globally time-ordered node registry for ancestral recombination
//! graphs (ARGs).
//!
//! Populations simulate their lineages independently and hand out
//! population-local node indices. The [`Registry`] merges the resulting
//! events into one arena whose [`GlobalId`]s increase with node time,
//! translates local references into global ones, and keeps
//! parent/son edges reciprocal. The query methods on [`Registry`]
//! traverse the finished (or partially finished) graph.

use nohash::BuildNoHashHasher;
use std::collections::HashSet;

mod config;
mod error;
mod event;
mod flags;
mod index_map;
mod merge;
mod node;
mod query;
mod registry;
mod shared;

pub use config::RegistryConfig;
pub use error::{RegistryError, Relation, Result};
pub use event::NodeEvent;
pub use flags::RegistryOptions;
pub use index_map::LocalIndexMap;
pub use merge::EventMerge;
pub use node::{NodeRecord, ParentSlot, Relatives, MAX_RELATIVES};
pub use query::{Ancestors, Descendants};
pub use registry::Registry;
pub use shared::SharedRegistry;

/// Permanent identifier of a finalized node.
///
/// Identifiers are handed out as `0, 1, 2, ...` and double as the
/// node's position in the registry.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct GlobalId(usize);

impl GlobalId {
    pub fn new(value: usize) -> Self {
        Self(value)
    }

    pub fn as_index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for GlobalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index a node held inside its population's own simulation loop.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct LocalIndex(usize);

impl LocalIndex {
    pub fn new(value: usize) -> Self {
        Self(value)
    }

    pub fn as_index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for LocalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct PopulationId(usize);

impl PopulationId {
    pub fn new(value: usize) -> Self {
        Self(value)
    }

    pub fn as_index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PopulationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A population-local node reference.
///
/// Local indices are only unique within a population, so a reference
/// that may cross populations (migration, population splits) always
/// carries both halves.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct LocalRef {
    pub population: PopulationId,
    pub index: LocalIndex,
}

impl LocalRef {
    pub fn new(population: usize, index: usize) -> Self {
        Self {
            population: PopulationId(population),
            index: LocalIndex(index),
        }
    }
}

impl std::fmt::Display for LocalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.population, self.index)
    }
}

type NodeHash = HashSet<GlobalId, BuildNoHashHasher<usize>>;
