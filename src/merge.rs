use std::collections::BinaryHeap;

use crate::event::NodeEvent;

//BOILER PLATE ALERT
#[derive(Debug)]
struct QueuedEvent {
    event: NodeEvent,
    source: usize,
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so that the max-heap pops the earliest event,
// with the lower population winning ties.
impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .event
            .time
            .total_cmp(&self.event.time)
            .then_with(|| {
                other
                    .event
                    .origin
                    .population
                    .cmp(&self.event.origin.population)
            })
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// K-way merge of per-population event streams into one
/// chronological stream.
///
/// Each source must yield its events in non-decreasing time order.
/// Only the head of each source is buffered, so a source is advanced
/// only after its previous event has been handed out. Feed the output
/// to [`Registry::ingest`](crate::Registry::ingest).
#[derive(Debug)]
pub struct EventMerge<I> {
    sources: Vec<I>,
    heads: BinaryHeap<QueuedEvent>,
}

impl<I: Iterator<Item = NodeEvent>> EventMerge<I> {
    pub fn new(sources: Vec<I>) -> Self {
        let mut merge = Self {
            heads: BinaryHeap::with_capacity(sources.len()),
            sources,
        };
        for source in 0..merge.sources.len() {
            merge.advance(source);
        }
        merge
    }

    fn advance(&mut self, source: usize) {
        if let Some(event) = self.sources[source].next() {
            self.heads.push(QueuedEvent { event, source });
        }
    }

    /// Time of the next event, if any.
    pub fn peek_time(&self) -> Option<f64> {
        self.heads.peek().map(|q| q.event.time)
    }
}

impl<I: Iterator<Item = NodeEvent>> Iterator for EventMerge<I> {
    type Item = NodeEvent;
    fn next(&mut self) -> Option<Self::Item> {
        let QueuedEvent { event, source } = self.heads.pop()?;
        self.advance(source);
        Some(event)
    }
}
