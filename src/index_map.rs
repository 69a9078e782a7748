use std::collections::HashMap;

use nohash::BuildNoHashHasher;

use crate::error::{RegistryError, Result};
use crate::GlobalId;
use crate::LocalIndex;
use crate::PopulationId;

type PopulationIndex = HashMap<LocalIndex, GlobalId, BuildNoHashHasher<usize>>;

/// Per-population translation of local node indices into global ids.
///
/// Populations are numbered densely from zero, so the outer level is
/// a `Vec` that grows the first time a population is seen.
#[derive(Debug, Default)]
pub struct LocalIndexMap {
    populations: Vec<PopulationIndex>,
}

impl LocalIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        population: PopulationId,
        local: LocalIndex,
        global: GlobalId,
    ) -> Result<()> {
        if self.contains(population, local) {
            return Err(RegistryError::DuplicateLocalIndex { population, local });
        }
        let p = population.as_index();
        if p >= self.populations.len() {
            self.populations
                .resize_with(p + 1, || PopulationIndex::with_hasher(Default::default()));
        }
        let _ = self.populations[p].insert(local, global);
        Ok(())
    }

    pub fn resolve(&self, population: PopulationId, local: LocalIndex) -> Result<GlobalId> {
        self.populations
            .get(population.as_index())
            .and_then(|index| index.get(&local))
            .copied()
            .ok_or(RegistryError::UnresolvedReference { population, local })
    }

    pub fn contains(&self, population: PopulationId, local: LocalIndex) -> bool {
        self.populations
            .get(population.as_index())
            .map_or(false, |index| index.contains_key(&local))
    }

    /// Number of populations seen so far, including empty ones
    /// below the largest population id.
    pub fn num_populations(&self) -> usize {
        self.populations.len()
    }

    /// Total number of recorded associations.
    pub fn len(&self) -> usize {
        self.populations.iter().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
