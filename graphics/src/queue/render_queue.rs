//! A sortable list of render elements.

use std::cmp::Ordering;

use super::SortKey;
use super::sort_key::depth_prepass_order;

/// An element and the key it is ordered by.
#[derive(Debug, Clone)]
pub struct QueueEntry<T> {
    pub key: SortKey,
    pub element: T,
}

/// Ordered collection of elements for one pass of one viewer.
///
/// Every mutation bumps a generation counter, which lets a
/// [`RenderQueueRegistry`](super::RenderQueueRegistry) tell whether its
/// batches still describe this queue.
#[derive(Debug)]
pub struct RenderQueue<T> {
    entries: Vec<QueueEntry<T>>,
    generation: u64,
}

impl<T> RenderQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            generation: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            generation: 0,
        }
    }

    pub fn insert(&mut self, key: SortKey, element: T) {
        self.entries.push(QueueEntry { key, element });
        self.generation += 1;
    }

    /// Stable sort with a custom ordering: equal keys keep insertion order.
    pub fn sort_by(&mut self, mut compare: impl FnMut(&SortKey, &SortKey) -> Ordering) {
        self.entries.sort_by(|a, b| compare(&a.key, &b.key));
        self.generation += 1;
    }

    /// Stable sort by pipeline, material, then front to back.
    pub fn sort(&mut self) {
        self.sort_by(depth_prepass_order);
    }

    /// Remove all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entries(&self) -> &[QueueEntry<T>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.element)
    }
}

impl<T> Default for RenderQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
