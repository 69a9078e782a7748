use crate::GlobalId;
use crate::LocalIndex;
use crate::LocalRef;
use crate::PopulationId;

/// No ARG node has more than two parents or two sons.
pub const MAX_RELATIVES: usize = 2;

/// Which parent of a recombination node an edge fills.
///
/// The left parent carries the segment strictly left of the split
/// point. The right parent carries the split point itself and
/// everything to its right. Ordinary nodes only use the left slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParentSlot {
    Left,
    Right,
}

impl ParentSlot {
    pub(crate) fn as_index(&self) -> usize {
        match self {
            ParentSlot::Left => 0,
            ParentSlot::Right => 1,
        }
    }
}

/// A slotted sequence of at most [`MAX_RELATIVES`] entries.
///
/// Slots keep their position once filled, so the two parents of a
/// recombination node stay distinguishable even when they are linked
/// out of order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Relatives<T> {
    slots: [Option<T>; MAX_RELATIVES],
}

impl<T> Default for Relatives<T> {
    fn default() -> Self {
        Self { slots: [None, None] }
    }
}

impl<T: Copy + PartialEq> Relatives<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    pub fn contains(&self, value: &T) -> bool {
        self.slots.iter().any(|s| s.as_ref() == Some(value))
    }

    pub fn get(&self, slot: usize) -> Option<T> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slot_is_free(&self, slot: usize) -> bool {
        matches!(self.slots.get(slot), Some(None))
    }

    /// Filled entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Fill the first free slot, returning its position.
    /// Hands `value` back if every slot is taken.
    pub(crate) fn push(&mut self, value: T) -> Result<usize, T> {
        match self.slots.iter().position(|s| s.is_none()) {
            Some(slot) => {
                self.slots[slot] = Some(value);
                Ok(slot)
            }
            None => Err(value),
        }
    }

    pub(crate) fn insert_at(&mut self, slot: usize, value: T) -> Result<(), T> {
        if self.slot_is_free(slot) {
            self.slots[slot] = Some(value);
            Ok(())
        } else {
            Err(value)
        }
    }
}

/// One vertex of the ARG.
///
/// Records are passive: the registry is the only thing that adds
/// edges, which keeps `parents` and `sons` reciprocal.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    global_id: GlobalId,
    origin: LocalRef,
    time: f64,
    split_point: Option<f64>,
    parents: Relatives<GlobalId>,
    sons: Relatives<GlobalId>,
}

impl NodeRecord {
    pub fn new(global_id: GlobalId, origin: LocalRef, time: f64) -> Self {
        Self {
            global_id,
            origin,
            time,
            split_point: None,
            parents: Relatives::default(),
            sons: Relatives::default(),
        }
    }

    /// Mark the node as a recombination splitting its segment at `split_point`.
    pub fn with_split_point(self, split_point: f64) -> Self {
        Self {
            split_point: Some(split_point),
            ..self
        }
    }

    pub fn global_id(&self) -> GlobalId {
        self.global_id
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn origin(&self) -> LocalRef {
        self.origin
    }

    pub fn population(&self) -> PopulationId {
        self.origin.population
    }

    pub fn local_index(&self) -> LocalIndex {
        self.origin.index
    }

    pub fn is_recombination(&self) -> bool {
        self.split_point.is_some()
    }

    pub fn split_point(&self) -> Option<f64> {
        self.split_point
    }

    pub fn parents(&self) -> &Relatives<GlobalId> {
        &self.parents
    }

    pub fn sons(&self) -> &Relatives<GlobalId> {
        &self.sons
    }

    pub fn is_founder(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.sons.is_empty()
    }

    /// Recombination nodes take two parents, everything else one.
    pub fn max_parents(&self) -> usize {
        if self.is_recombination() {
            MAX_RELATIVES
        } else {
            1
        }
    }

    pub(crate) fn parents_mut(&mut self) -> &mut Relatives<GlobalId> {
        &mut self.parents
    }

    pub(crate) fn sons_mut(&mut self) -> &mut Relatives<GlobalId> {
        &mut self.sons
    }
}
