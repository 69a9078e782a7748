use crate::node::ParentSlot;
use crate::LocalRef;

/// A resolved simulation event that has not yet received a global id.
///
/// `sons` must already be finalized when the event is handed to
/// [`Registry::finalize`](crate::Registry::finalize). `parents` are
/// usually older nodes that do not exist yet; the registry links them
/// once they are finalized, each into the slot it was named for.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvent {
    pub origin: LocalRef,
    pub time: f64,
    pub split_point: Option<f64>,
    pub sons: Vec<LocalRef>,
    pub parents: Vec<(LocalRef, ParentSlot)>,
}

impl NodeEvent {
    pub fn new(origin: LocalRef, time: f64) -> Self {
        Self {
            origin,
            time,
            split_point: None,
            sons: vec![],
            parents: vec![],
        }
    }

    pub fn with_split_point(self, split_point: f64) -> Self {
        Self {
            split_point: Some(split_point),
            ..self
        }
    }

    pub fn with_son(mut self, son: LocalRef) -> Self {
        self.sons.push(son);
        self
    }

    /// Name a parent for the left slot, or for the right one
    /// if the left slot is already named.
    pub fn with_parent(self, parent: LocalRef) -> Self {
        let slot = if self.parents.iter().any(|(_, s)| *s == ParentSlot::Left) {
            ParentSlot::Right
        } else {
            ParentSlot::Left
        };
        self.with_parent_at(parent, slot)
    }

    /// Name the parent that fills `slot`, e.g. the right ancestor of a
    /// recombination whose left ancestor is not known to this event.
    pub fn with_parent_at(mut self, parent: LocalRef, slot: ParentSlot) -> Self {
        self.parents.push((parent, slot));
        self
    }

    pub fn is_recombination(&self) -> bool {
        self.split_point.is_some()
    }
}

#[cfg(test)]
mod test_node_event {
    use super::*;

    #[test]
    fn test_parent_slots() {
        let e = NodeEvent::new(LocalRef::new(0, 0), 1.0)
            .with_split_point(0.5)
            .with_parent(LocalRef::new(0, 1))
            .with_parent(LocalRef::new(1, 0));
        assert_eq!(
            e.parents,
            vec![
                (LocalRef::new(0, 1), ParentSlot::Left),
                (LocalRef::new(1, 0), ParentSlot::Right)
            ]
        );

        let e = NodeEvent::new(LocalRef::new(0, 0), 1.0)
            .with_split_point(0.5)
            .with_parent_at(LocalRef::new(1, 0), ParentSlot::Right)
            .with_parent(LocalRef::new(0, 1));
        assert_eq!(e.parents[1], (LocalRef::new(0, 1), ParentSlot::Left));
    }
}
