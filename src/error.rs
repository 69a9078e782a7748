use thiserror::Error;

use crate::GlobalId;
use crate::LocalIndex;
use crate::LocalRef;
use crate::PopulationId;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Which side of an edge ran out of room.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Relation {
    Parents,
    Sons,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Parents => write!(f, "parents"),
            Relation::Sons => write!(f, "sons"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("local index {local} of population {population} was already recorded")]
    DuplicateLocalIndex {
        population: PopulationId,
        local: LocalIndex,
    },
    #[error("local index {local} of population {population} has not been finalized")]
    UnresolvedReference {
        population: PopulationId,
        local: LocalIndex,
    },
    #[error("node at time {time} arrived after a node at time {last_time} (tolerance {tolerance})")]
    OutOfOrderInsertion {
        time: f64,
        last_time: f64,
        tolerance: f64,
    },
    #[error("{relation} of node {origin} would exceed their maximum arity")]
    ArityExceeded { origin: LocalRef, relation: Relation },
    #[error("global id {0} is not present in the registry")]
    UnknownGlobalId(GlobalId),
    #[error("node {0} is not a recombination node")]
    NotARecombinationNode(GlobalId),
    #[error("node time {0} is negative or not finite")]
    InvalidTime(f64),
    #[error("recombination split point {0} is not finite")]
    InvalidSplitPoint(f64),
    #[error("registry invariant violated: {0}")]
    InvariantViolation(String),
}

impl RegistryError {
    /// The driver may re-sequence its merge order and retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RegistryError::UnresolvedReference { .. } | RegistryError::OutOfOrderInsertion { .. }
        )
    }

    /// The graph can no longer be trusted and the run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RegistryError::InvariantViolation(_))
    }
}
