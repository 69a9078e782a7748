use std::collections::HashMap;

use nohash::BuildNoHashHasher;

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Relation, Result};
use crate::event::NodeEvent;
use crate::index_map::LocalIndexMap;
use crate::node::{NodeRecord, ParentSlot, MAX_RELATIVES};
use crate::GlobalId;
use crate::LocalIndex;
use crate::LocalRef;
use crate::PopulationId;

/// The append-only, time-ordered arena of ARG nodes.
///
/// # Invariants
///
/// * `nodes[i].global_id() == i` for all `i`.
/// * Node times never decrease by more than the configured
///   tolerance when read in id order.
/// * Every edge is stored on both of its ends and points from
///   a node to one with a strictly larger global id.
#[derive(Debug)]
pub struct Registry {
    config: RegistryConfig,
    nodes: Vec<NodeRecord>,
    index: LocalIndexMap,
    next_id: usize,
    // Children that named a parent which has not been finalized yet,
    // keyed by that parent's local reference.
    pending_parents: HashMap<LocalRef, Vec<(GlobalId, ParentSlot)>>,
    // The same promises seen from the child: parent slots that only
    // the named parent may fill.
    reserved_slots: HashMap<GlobalId, [bool; MAX_RELATIVES], BuildNoHashHasher<usize>>,
}

// Everything finalize needs after validation has passed.
struct FinalizationPlan {
    sons: Vec<GlobalId>,
}

fn violation(message: String) -> RegistryError {
    tracing::error!("{message}");
    RegistryError::InvariantViolation(message)
}

fn validate_time(time: f64) -> Result<()> {
    if time.is_finite() && time >= 0.0 {
        Ok(())
    } else {
        Err(RegistryError::InvalidTime(time))
    }
}

fn validate_split_point(split_point: Option<f64>) -> Result<()> {
    match split_point {
        Some(x) if !x.is_finite() => Err(RegistryError::InvalidSplitPoint(x)),
        _ => Ok(()),
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// Constructors and accessors
impl Registry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            nodes: Vec::with_capacity(config.capacity()),
            index: LocalIndexMap::new(),
            next_id: 0,
            pending_parents: HashMap::new(),
            reserved_slots: HashMap::default(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: GlobalId) -> Option<&NodeRecord> {
        self.nodes.get(id.as_index())
    }

    pub fn node(&self, id: GlobalId) -> Result<&NodeRecord> {
        self.get(id).ok_or(RegistryError::UnknownGlobalId(id))
    }

    /// All finalized nodes in ascending id (and time) order.
    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> + '_ {
        self.nodes.iter()
    }

    pub fn last_time(&self) -> Option<f64> {
        self.nodes.last().map(|n| n.time())
    }

    pub fn num_populations(&self) -> usize {
        self.index.num_populations()
    }

    pub fn index_map(&self) -> &LocalIndexMap {
        &self.index
    }

    /// Local references named as parents by finalized nodes
    /// whose own events have not arrived yet.
    pub fn pending_parent_refs(&self) -> Vec<LocalRef> {
        let mut refs = self.pending_parents.keys().copied().collect::<Vec<_>>();
        refs.sort_unstable();
        refs
    }
}

// Allocation and insertion
impl Registry {
    /// Hand out the next global id.
    ///
    /// The id must be used by the next [`Registry::insert`]. A failed
    /// insert does not consume it, so the driver can retry with a
    /// re-sequenced node under the same id.
    pub fn allocate_global_id(&mut self) -> GlobalId {
        let id = GlobalId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn check_no_outstanding_allocation(&self) -> Result<()> {
        if self.next_id != self.nodes.len() {
            return Err(violation(format!(
                "global id {} was allocated but never inserted",
                self.nodes.len()
            )));
        }
        Ok(())
    }

    fn check_insertion(
        &self,
        id: GlobalId,
        origin: LocalRef,
        time: f64,
        split_point: Option<f64>,
    ) -> Result<()> {
        validate_time(time)?;
        validate_split_point(split_point)?;
        if id.as_index() != self.nodes.len() {
            return Err(violation(format!(
                "node {origin} carries global id {id} but the next free position is {}",
                self.nodes.len()
            )));
        }
        if let Some(last_time) = self.last_time() {
            let tolerance = self.config.time_tolerance();
            if time < last_time - tolerance {
                tracing::warn!(
                    "rejecting node {origin} at time {time}: last inserted time is {last_time}"
                );
                return Err(RegistryError::OutOfOrderInsertion {
                    time,
                    last_time,
                    tolerance,
                });
            }
        }
        if self.index.contains(origin.population, origin.index) {
            return Err(RegistryError::DuplicateLocalIndex {
                population: origin.population,
                local: origin.index,
            });
        }
        Ok(())
    }

    /// Append `node` at the position given by its global id and
    /// record its local index.
    ///
    /// Earlier nodes that named `node` as a parent are linked to it.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::InvalidTime`]
    /// * [`RegistryError::InvalidSplitPoint`]
    /// * [`RegistryError::OutOfOrderInsertion`]
    /// * [`RegistryError::DuplicateLocalIndex`]
    /// * [`RegistryError::ArityExceeded`] if more than two nodes are
    ///   waiting for `node` as their parent.
    /// * [`RegistryError::InvariantViolation`] if the id is not the
    ///   next contiguous position.
    ///
    /// The registry is unchanged when an error is returned.
    pub fn insert(&mut self, node: NodeRecord) -> Result<GlobalId> {
        let id = node.global_id();
        let origin = node.origin();
        self.check_insertion(id, origin, node.time(), node.split_point())?;
        let waiting_children = self.check_waiting_children(origin)?;
        debug_assert!(node.parents().is_empty() && node.sons().is_empty());
        self.index
            .record(node.population(), node.local_index(), id)?;
        self.next_id = std::cmp::max(self.next_id, id.as_index() + 1);
        self.nodes.push(node);
        let _ = self.pending_parents.remove(&origin);
        for (child, slot) in waiting_children {
            self.release_parent_slot(child, slot);
            self.link(id, child, Some(slot))?;
        }
        Ok(id)
    }

    /// Allocate the next global id and insert the record `make` builds
    /// for it as a single step.
    ///
    /// Unlike a separate [`Registry::allocate_global_id`] and
    /// [`Registry::insert`], a failed insert leaves no id allocated.
    pub fn insert_next<F: FnOnce(GlobalId) -> NodeRecord>(&mut self, make: F) -> Result<GlobalId> {
        self.check_no_outstanding_allocation()?;
        self.insert(make(GlobalId::new(self.nodes.len())))
    }

    pub fn resolve_local(&self, population: PopulationId, local: LocalIndex) -> Result<GlobalId> {
        self.index.resolve(population, local)
    }
}

// Edges
impl Registry {
    /// Record that `child` descends from `parent`.
    ///
    /// A recombination child fills its first free parent slot, so the
    /// first parent linked becomes the left one. Slots promised to a
    /// parent named by the child's event are skipped. Use
    /// [`Registry::link_child_at`] to choose the slot explicitly.
    /// Linking an existing edge again is a no-op.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::UnknownGlobalId`] if either node is absent.
    /// * [`RegistryError::ArityExceeded`] if every parent slot of the
    ///   child is filled or promised, or the parent already has two
    ///   sons. Neither node is modified.
    /// * [`RegistryError::InvariantViolation`] if `parent` is not
    ///   strictly newer than `child`, which could close a cycle.
    pub fn link_child(&mut self, parent: GlobalId, child: GlobalId) -> Result<()> {
        self.link(parent, child, None)
    }

    /// Like [`Registry::link_child`] but places `parent` in a given slot
    /// of the child's parents.
    pub fn link_child_at(
        &mut self,
        parent: GlobalId,
        child: GlobalId,
        slot: ParentSlot,
    ) -> Result<()> {
        self.link(parent, child, Some(slot))
    }

    fn slot_is_reserved(&self, child: GlobalId, slot: usize) -> bool {
        self.reserved_slots
            .get(&child)
            .map_or(false, |reserved| reserved.get(slot).copied().unwrap_or(false))
    }

    // First parent slot of `child` that is neither filled nor promised.
    fn open_parent_slot(&self, child: &NodeRecord) -> Option<usize> {
        (0..child.max_parents()).find(|&s| {
            child.parents().slot_is_free(s) && !self.slot_is_reserved(child.global_id(), s)
        })
    }

    fn reserve_parent_slot(&mut self, child: GlobalId, slot: ParentSlot) {
        self.reserved_slots.entry(child).or_default()[slot.as_index()] = true;
    }

    fn release_parent_slot(&mut self, child: GlobalId, slot: ParentSlot) {
        if let Some(reserved) = self.reserved_slots.get_mut(&child) {
            reserved[slot.as_index()] = false;
            if reserved.iter().all(|r| !r) {
                let _ = self.reserved_slots.remove(&child);
            }
        }
    }

    // Returns the child's parent slot to fill, or None if the
    // edge already exists.
    fn check_link(
        &self,
        parent: GlobalId,
        child: GlobalId,
        slot: Option<ParentSlot>,
    ) -> Result<Option<usize>> {
        let p = self.node(parent)?;
        let c = self.node(child)?;
        if parent <= child {
            return Err(violation(format!(
                "edge from {child} to {parent} does not point to a newer node"
            )));
        }
        if c.parents().contains(&parent) {
            debug_assert!(p.sons().contains(&child));
            return Ok(None);
        }
        let arity_exceeded = RegistryError::ArityExceeded {
            origin: c.origin(),
            relation: Relation::Parents,
        };
        let child_slot = match slot {
            Some(slot) => {
                let s = slot.as_index();
                if s >= c.max_parents()
                    || !c.parents().slot_is_free(s)
                    || self.slot_is_reserved(child, s)
                {
                    return Err(arity_exceeded);
                }
                s
            }
            None => self.open_parent_slot(c).ok_or(arity_exceeded)?,
        };
        if p.sons().is_full() {
            return Err(RegistryError::ArityExceeded {
                origin: p.origin(),
                relation: Relation::Sons,
            });
        }
        Ok(Some(child_slot))
    }

    fn link(&mut self, parent: GlobalId, child: GlobalId, slot: Option<ParentSlot>) -> Result<()> {
        let child_slot = match self.check_link(parent, child, slot)? {
            Some(s) => s,
            None => return Ok(()),
        };
        self.nodes[child.as_index()]
            .parents_mut()
            .insert_at(child_slot, parent)
            .map_err(|_| violation(format!("parent slot {child_slot} of {child} was taken")))?;
        self.nodes[parent.as_index()]
            .sons_mut()
            .push(child)
            .map_err(|_| violation(format!("sons of {parent} filled during linking")))?;
        tracing::trace!("linked {child} -> {parent} in slot {child_slot}");
        Ok(())
    }
}

// Merge steps
impl Registry {
    // Nodes that named `origin` as a parent, checked to fit under it.
    fn check_waiting_children(&self, origin: LocalRef) -> Result<Vec<(GlobalId, ParentSlot)>> {
        let waiting_children = self
            .pending_parents
            .get(&origin)
            .cloned()
            .unwrap_or_default();
        if waiting_children.len() > MAX_RELATIVES {
            return Err(RegistryError::ArityExceeded {
                origin,
                relation: Relation::Sons,
            });
        }
        for &(child, slot) in &waiting_children {
            let c = self.node(child)?;
            if !c.parents().slot_is_free(slot.as_index()) {
                return Err(RegistryError::ArityExceeded {
                    origin: c.origin(),
                    relation: Relation::Parents,
                });
            }
        }
        Ok(waiting_children)
    }

    fn plan_finalization(&self, event: &NodeEvent) -> Result<FinalizationPlan> {
        let origin = event.origin;
        self.check_no_outstanding_allocation()?;
        self.check_insertion(
            GlobalId::new(self.nodes.len()),
            origin,
            event.time,
            event.split_point,
        )?;

        let max_parents = if event.is_recombination() {
            MAX_RELATIVES
        } else {
            1
        };
        if event.parents.len() > max_parents {
            return Err(RegistryError::ArityExceeded {
                origin,
                relation: Relation::Parents,
            });
        }
        if event.sons.len() > MAX_RELATIVES {
            return Err(RegistryError::ArityExceeded {
                origin,
                relation: Relation::Sons,
            });
        }
        for (i, &(parent, slot)) in event.parents.iter().enumerate() {
            let earlier = &event.parents[..i];
            if slot.as_index() >= max_parents || earlier.iter().any(|&(_, s)| s == slot) {
                return Err(RegistryError::ArityExceeded {
                    origin,
                    relation: Relation::Parents,
                });
            }
            if self.index.contains(parent.population, parent.index) {
                return Err(violation(format!(
                    "parent {parent} of {origin} was finalized before its child"
                )));
            }
            if earlier.iter().any(|&(p, _)| p == parent) || parent == origin {
                return Err(violation(format!(
                    "{origin} names {parent} as a parent more than once"
                )));
            }
        }

        let waiting_children = self.check_waiting_children(origin)?;

        let mut sons = Vec::with_capacity(event.sons.len());
        for son in &event.sons {
            let id = self.index.resolve(son.population, son.index)?;
            if sons.contains(&id) {
                return Err(violation(format!("{origin} names {son} as a son more than once")));
            }
            sons.push(id);
        }
        sons.retain(|son| !waiting_children.iter().any(|(child, _)| child == son));
        for &son in &sons {
            let s = self.node(son)?;
            if self.open_parent_slot(s).is_none() {
                return Err(RegistryError::ArityExceeded {
                    origin: s.origin(),
                    relation: Relation::Parents,
                });
            }
        }
        if sons.len() + waiting_children.len() > MAX_RELATIVES {
            return Err(RegistryError::ArityExceeded {
                origin,
                relation: Relation::Sons,
            });
        }
        Ok(FinalizationPlan { sons })
    }

    /// Finalize one event: allocate its global id, insert it, link
    /// its sons, and link every earlier node that named it as a parent.
    ///
    /// Parents named by `event` are remembered, their slots are kept
    /// free, and they are linked when they are finalized themselves.
    ///
    /// Every check runs before the registry is touched, so an error
    /// leaves it unchanged. The one exception is the neighbourhood check
    /// of [`RegistryOptions::with_validate_on_finalize`](crate::RegistryOptions::with_validate_on_finalize),
    /// which runs after the node and its edges are committed; its
    /// `InvariantViolation` means the graph was already inconsistent.
    pub fn finalize(&mut self, event: NodeEvent) -> Result<GlobalId> {
        let plan = self.plan_finalization(&event)?;
        let id = self.insert_next(|id| {
            let record = NodeRecord::new(id, event.origin, event.time);
            match event.split_point {
                Some(split_point) => record.with_split_point(split_point),
                None => record,
            }
        })?;

        for son in plan.sons {
            self.link(id, son, None)?;
        }
        for &(parent, slot) in &event.parents {
            self.pending_parents
                .entry(parent)
                .or_default()
                .push((id, slot));
            self.reserve_parent_slot(id, slot);
        }
        tracing::debug!(
            "finalized {} at time {} as global id {id}",
            event.origin,
            event.time
        );
        if self.config.options().validate_on_finalize() {
            self.validate_neighbourhood(id)?;
        }
        Ok(id)
    }

    /// Finalize events in the order given, stopping at the first error.
    ///
    /// Returns the number of events finalized. On error, every event
    /// before the failing one stays finalized.
    pub fn ingest<I: IntoIterator<Item = NodeEvent>>(&mut self, events: I) -> Result<usize> {
        let mut count = 0;
        for event in events {
            let _ = self.finalize(event)?;
            count += 1;
        }
        Ok(count)
    }
}

// Validation
impl Registry {
    fn validate_node(&self, node: &NodeRecord, strict: bool) -> Result<()> {
        let id = node.global_id();
        validate_time(node.time())
            .map_err(|_| violation(format!("node {id} has invalid time {}", node.time())))?;
        validate_split_point(node.split_point())
            .map_err(|_| violation(format!("node {id} has an invalid split point")))?;
        if node.parents().len() > node.max_parents()
            || (!node.is_recombination() && node.parents().get(1).is_some())
        {
            return Err(violation(format!("node {id} has too many parents")));
        }
        if strict && node.is_recombination() && node.parents().len() != MAX_RELATIVES {
            return Err(violation(format!(
                "recombination node {id} has {} parents",
                node.parents().len()
            )));
        }
        for parent in node.parents().iter() {
            if parent <= id {
                return Err(violation(format!(
                    "node {id} has parent {parent} that is not newer"
                )));
            }
            match self.get(parent) {
                Some(p) if p.sons().contains(&id) => (),
                Some(_) => {
                    return Err(violation(format!(
                        "{parent} is a parent of {id} but {id} is not its son"
                    )))
                }
                None => return Err(violation(format!("node {id} has unknown parent {parent}"))),
            }
        }
        for son in node.sons().iter() {
            if son >= id {
                return Err(violation(format!("node {id} has son {son} that is not older")));
            }
            match self.get(son) {
                Some(s) if s.parents().contains(&id) => (),
                Some(_) => {
                    return Err(violation(format!(
                        "{son} is a son of {id} but {id} is not its parent"
                    )))
                }
                None => return Err(violation(format!("node {id} has unknown son {son}"))),
            }
        }
        Ok(())
    }

    fn validate_neighbourhood(&self, id: GlobalId) -> Result<()> {
        let node = self.node(id)?;
        self.validate_node(node, false)?;
        for relative in node.parents().iter().chain(node.sons().iter()) {
            self.validate_node(self.node(relative)?, false)?;
        }
        Ok(())
    }

    /// Check every registry invariant.
    ///
    /// With [`RegistryOptions::with_strict_validation`](crate::RegistryOptions::with_strict_validation)
    /// recombination nodes must also have both parents, so strict
    /// validation is meant for a completed graph.
    ///
    /// # Complexity
    ///
    /// `O(N)` in the number of nodes.
    pub fn validate(&self) -> Result<()> {
        let strict = self.config.options().strict_validation();
        let tolerance = self.config.time_tolerance();
        if self.next_id < self.nodes.len() {
            return Err(violation(format!(
                "next global id {} is below the number of nodes {}",
                self.next_id,
                self.nodes.len()
            )));
        }
        if self.index.len() != self.nodes.len() {
            return Err(violation(format!(
                "{} local indices recorded for {} nodes",
                self.index.len(),
                self.nodes.len()
            )));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let id = node.global_id();
            if id.as_index() != i {
                return Err(violation(format!("global id {id} stored at position {i}")));
            }
            if i > 0 && node.time() < self.nodes[i - 1].time() - tolerance {
                return Err(violation(format!(
                    "node {id} at time {} precedes node {} at time {}",
                    node.time(),
                    i - 1,
                    self.nodes[i - 1].time()
                )));
            }
            let origin = node.origin();
            if self.index.resolve(origin.population, origin.index) != Ok(id) {
                return Err(violation(format!(
                    "local reference {origin} does not resolve to {id}"
                )));
            }
            self.validate_node(node, strict)?;
        }
        self.validate_pending_parents()
    }

    // Every promised parent is still missing and its slot still open.
    fn validate_pending_parents(&self) -> Result<()> {
        for (parent, waiting) in &self.pending_parents {
            if self.index.contains(parent.population, parent.index) {
                return Err(violation(format!(
                    "{parent} is finalized but nodes are still waiting for it as a parent"
                )));
            }
            for &(child, slot) in waiting {
                let c = self.node(child)?;
                if !c.parents().slot_is_free(slot.as_index())
                    || !self.slot_is_reserved(child, slot.as_index())
                {
                    return Err(violation(format!(
                        "parent slot {} of {child} promised to {parent} is not held open",
                        slot.as_index()
                    )));
                }
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod allocation_tests {
    use super::*;

    #[test]
    fn test_allocate_is_strictly_increasing() {
        let mut registry = Registry::new();
        let ids = (0..5)
            .map(|_| registry.allocate_global_id())
            .collect::<Vec<_>>();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids[0], GlobalId::new(0));
        // allocation alone inserts nothing
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_in_order() {
        let mut registry = Registry::new();
        for (i, t) in [0.0, 0.0, 0.5, 1.25].into_iter().enumerate() {
            let id = registry.allocate_global_id();
            let inserted = registry
                .insert(NodeRecord::new(id, LocalRef::new(0, i), t))
                .unwrap();
            assert_eq!(inserted, id);
            assert_eq!(registry.resolve_local(PopulationId::new(0), LocalIndex::new(i)), Ok(id));
        }
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.last_time(), Some(1.25));
        registry.validate().unwrap();
    }

    #[test]
    fn test_out_of_order_insert_can_be_retried() {
        let mut registry = Registry::new();
        let id = registry.allocate_global_id();
        registry
            .insert(NodeRecord::new(id, LocalRef::new(0, 0), 2.0))
            .unwrap();
        let id = registry.allocate_global_id();
        assert_eq!(
            registry.insert(NodeRecord::new(id, LocalRef::new(1, 0), 1.0)),
            Err(RegistryError::OutOfOrderInsertion {
                time: 1.0,
                last_time: 2.0,
                tolerance: 0.0
            })
        );
        assert_eq!(registry.len(), 1);
        assert!(registry
            .resolve_local(PopulationId::new(1), LocalIndex::new(0))
            .is_err());
        // The driver re-sequences and reuses the id
        registry
            .insert(NodeRecord::new(id, LocalRef::new(1, 0), 2.5))
            .unwrap();
        registry.validate().unwrap();
    }

    #[test]
    fn test_time_tolerance() {
        let config = RegistryConfig::new(1e-9).unwrap();
        let mut registry = Registry::with_config(config);
        registry
            .finalize(NodeEvent::new(LocalRef::new(0, 0), 1.0))
            .unwrap();
        registry
            .finalize(NodeEvent::new(LocalRef::new(1, 0), 1.0 - 1e-10))
            .unwrap();
        assert!(matches!(
            registry.finalize(NodeEvent::new(LocalRef::new(2, 0), 0.9)),
            Err(RegistryError::OutOfOrderInsertion { .. })
        ));
        registry.validate().unwrap();
    }

    #[test]
    fn test_invalid_time() {
        let mut registry = Registry::new();
        for t in [-1.0, f64::NAN, f64::INFINITY] {
            let id = GlobalId::new(0);
            assert!(matches!(
                registry.insert(NodeRecord::new(id, LocalRef::new(0, 0), t)),
                Err(RegistryError::InvalidTime(_))
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_with_gap_is_an_invariant_violation() {
        let mut registry = Registry::new();
        let _ = registry.allocate_global_id();
        let skipped = registry.allocate_global_id();
        let e = registry
            .insert(NodeRecord::new(skipped, LocalRef::new(0, 0), 0.0))
            .unwrap_err();
        assert!(e.is_fatal());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_local_index() {
        let mut registry = Registry::new();
        registry
            .finalize(NodeEvent::new(LocalRef::new(0, 0), 0.0))
            .unwrap();
        assert_eq!(
            registry.finalize(NodeEvent::new(LocalRef::new(0, 0), 1.0)),
            Err(RegistryError::DuplicateLocalIndex {
                population: PopulationId::new(0),
                local: LocalIndex::new(0)
            })
        );
        assert_eq!(registry.len(), 1);
        // no id was burned by the failed event
        registry
            .finalize(NodeEvent::new(LocalRef::new(0, 1), 1.0))
            .unwrap();
        registry.validate().unwrap();
    }

    #[test]
    fn test_invalid_split_point() {
        let mut registry = Registry::new();
        for x in [f64::NAN, f64::NEG_INFINITY] {
            let record = NodeRecord::new(GlobalId::new(0), LocalRef::new(0, 0), 0.0)
                .with_split_point(x);
            assert!(matches!(
                registry.insert(record),
                Err(RegistryError::InvalidSplitPoint(_))
            ));
            assert!(matches!(
                registry.finalize(NodeEvent::new(LocalRef::new(0, 0), 0.0).with_split_point(x)),
                Err(RegistryError::InvalidSplitPoint(_))
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_links_waiting_children() {
        let mut registry = Registry::new();
        let child = registry
            .finalize(NodeEvent::new(LocalRef::new(0, 0), 0.0).with_parent(LocalRef::new(0, 1)))
            .unwrap();
        let parent = registry
            .insert_next(|id| NodeRecord::new(id, LocalRef::new(0, 1), 1.0))
            .unwrap();
        assert_eq!(registry.node(child).unwrap().parents().to_vec(), vec![parent]);
        assert_eq!(registry.node(parent).unwrap().sons().to_vec(), vec![child]);
        assert!(registry.pending_parent_refs().is_empty());
        registry.validate().unwrap();
    }

    #[test]
    fn test_stale_pending_parent_fails_validation() {
        let mut registry = Registry::new();
        let id = registry
            .finalize(NodeEvent::new(LocalRef::new(0, 0), 0.0))
            .unwrap();
        registry.validate().unwrap();
        let _ = registry
            .pending_parents
            .insert(LocalRef::new(0, 0), vec![(id, ParentSlot::Left)]);
        assert!(registry.validate().unwrap_err().is_fatal());
    }

    #[test]
    fn test_insert_next_does_not_leak_an_id() {
        let mut registry = Registry::new();
        registry
            .insert_next(|id| NodeRecord::new(id, LocalRef::new(0, 0), 2.0))
            .unwrap();
        assert!(matches!(
            registry.insert_next(|id| NodeRecord::new(id, LocalRef::new(0, 1), 1.0)),
            Err(RegistryError::OutOfOrderInsertion { .. })
        ));
        // nothing is left allocated, so finalize still works
        let id = registry
            .finalize(NodeEvent::new(LocalRef::new(0, 1), 2.0))
            .unwrap();
        assert_eq!(id, GlobalId::new(1));
        registry.validate().unwrap();
    }

    #[test]
    fn test_finalize_after_dangling_allocation() {
        let mut registry = Registry::new();
        let _ = registry.allocate_global_id();
        assert!(registry
            .finalize(NodeEvent::new(LocalRef::new(0, 0), 0.0))
            .unwrap_err()
            .is_fatal());
    }
}
