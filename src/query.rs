use std::collections::VecDeque;

use crate::error::{RegistryError, Result};
use crate::node::{NodeRecord, Relatives};
use crate::registry::Registry;
use crate::GlobalId;
use crate::NodeHash;

#[derive(Debug, Default)]
struct Frontier {
    queued: NodeHash,
    queue: VecDeque<GlobalId>,
}

impl Frontier {
    fn push(&mut self, node: GlobalId) {
        if self.queued.insert(node) {
            self.queue.push_back(node);
        }
    }

    fn pop(&mut self) -> Option<GlobalId> {
        self.queue.pop_front()
    }
}

fn traversed_node(registry: &Registry, node: GlobalId) -> &NodeRecord {
    match registry.get(node) {
        Some(record) => record,
        None => panic!(
            "{}",
            RegistryError::InvariantViolation(format!("traversal reached unknown node {node}"))
        ),
    }
}

/// Breadth-first walk over `parents` edges.
///
/// Created by [`Registry::ancestors_of`]. Each ancestor is yielded once,
/// even when two recombining lineages meet again further back.
///
/// # Panics
///
/// If a parent edge does not lead to a strictly newer node. Such an
/// edge is the only way a cycle can exist, and the registry refuses to
/// create one, so this indicates corrupted state.
pub struct Ancestors<'registry> {
    registry: &'registry Registry,
    frontier: Frontier,
}

impl<'registry> Iterator for Ancestors<'registry> {
    type Item = GlobalId;
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.frontier.pop()?;
        for parent in traversed_node(self.registry, node).parents().iter() {
            assert!(
                parent > node,
                "{}",
                RegistryError::InvariantViolation(format!(
                    "cycle: {node} has parent {parent} that is not newer"
                ))
            );
            self.frontier.push(parent);
        }
        Some(node)
    }
}

/// Breadth-first walk over `sons` edges.
///
/// Created by [`Registry::descendants_of`].
///
/// # Panics
///
/// If a son edge does not lead to a strictly older node.
pub struct Descendants<'registry> {
    registry: &'registry Registry,
    frontier: Frontier,
}

impl<'registry> Iterator for Descendants<'registry> {
    type Item = GlobalId;
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.frontier.pop()?;
        for son in traversed_node(self.registry, node).sons().iter() {
            assert!(
                son < node,
                "{}",
                RegistryError::InvariantViolation(format!(
                    "cycle: {node} has son {son} that is not older"
                ))
            );
            self.frontier.push(son);
        }
        Some(node)
    }
}

// Read-only queries
impl Registry {
    pub fn parents_of(&self, id: GlobalId) -> Result<&Relatives<GlobalId>> {
        Ok(self.node(id)?.parents())
    }

    pub fn sons_of(&self, id: GlobalId) -> Result<&Relatives<GlobalId>> {
        Ok(self.node(id)?.sons())
    }

    pub fn is_recombination(&self, id: GlobalId) -> Result<bool> {
        Ok(self.node(id)?.is_recombination())
    }

    pub fn split_point_of(&self, id: GlobalId) -> Result<f64> {
        self.node(id)?
            .split_point()
            .ok_or(RegistryError::NotARecombinationNode(id))
    }

    /// The parent that carries genomic `position` of node `id`.
    ///
    /// For a recombination node, positions left of the split point
    /// map to the left parent and all others to the right parent.
    /// Returns `None` if that parent has not been linked yet.
    pub fn parent_at(&self, id: GlobalId, position: f64) -> Result<Option<GlobalId>> {
        let node = self.node(id)?;
        let slot = match node.split_point() {
            Some(split_point) if position >= split_point => 1,
            _ => 0,
        };
        Ok(node.parents().get(slot))
    }

    /// All ancestors of `id`, nearest first. `id` itself is not included.
    pub fn ancestors_of(&self, id: GlobalId) -> Result<Ancestors<'_>> {
        let mut frontier = Frontier::default();
        for parent in self.node(id)?.parents().iter() {
            frontier.push(parent);
        }
        Ok(Ancestors {
            registry: self,
            frontier,
        })
    }

    /// All descendants of `id`, nearest first. `id` itself is not included.
    pub fn descendants_of(&self, id: GlobalId) -> Result<Descendants<'_>> {
        let mut frontier = Frontier::default();
        for son in self.node(id)?.sons().iter() {
            frontier.push(son);
        }
        Ok(Descendants {
            registry: self,
            frontier,
        })
    }

    /// Nodes without parents.
    ///
    /// # Complexity
    ///
    /// `O(N)` where `N` is the number of nodes.
    pub fn founders(&self) -> impl Iterator<Item = GlobalId> + '_ {
        self.iter()
            .filter(|n| n.is_founder())
            .map(|n| n.global_id())
    }

    /// Nodes without sons, i.e. the sampled lineages.
    pub fn leaves(&self) -> impl Iterator<Item = GlobalId> + '_ {
        self.iter().filter(|n| n.is_leaf()).map(|n| n.global_id())
    }
}
