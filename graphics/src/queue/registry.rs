//! Batch bookkeeping for sorted queues.

use std::collections::HashSet;
use std::ops::Range;

use crate::materials::PipelineHandle;
use crate::types::MaterialId;

use super::RenderQueue;

/// A run of adjacent queue entries sharing pipeline and material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBatch {
    pub pipeline: PipelineHandle,
    pub material: MaterialId,
    /// Entry indices in the queue.
    pub range: Range<usize>,
}

/// Distinct (pipeline, material) combinations of one queue, grouped into
/// contiguous batches.
///
/// [`finalize`](Self::finalize) must run after the queue is sorted and
/// before it is iterated. It is idempotent: finalizing the same queue
/// generation twice does no work.
#[derive(Debug, Default)]
pub struct RenderQueueRegistry {
    batches: Vec<RenderBatch>,
    combinations: HashSet<(PipelineHandle, MaterialId)>,
    finalized_generation: Option<u64>,
}

impl RenderQueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild batches for `queue`. Returns `false` if they were already
    /// current.
    pub fn finalize<T>(&mut self, queue: &RenderQueue<T>) -> bool {
        if self.finalized_generation == Some(queue.generation()) {
            return false;
        }

        self.batches.clear();
        self.combinations.clear();
        for (index, entry) in queue.entries().iter().enumerate() {
            let (pipeline, material) = entry.key.batch_key();
            self.combinations.insert((pipeline, material));
            match self.batches.last_mut() {
                Some(batch) if batch.pipeline == pipeline && batch.material == material => {
                    batch.range.end = index + 1;
                }
                _ => self.batches.push(RenderBatch {
                    pipeline,
                    material,
                    range: index..index + 1,
                }),
            }
        }
        self.finalized_generation = Some(queue.generation());
        true
    }

    /// Batches of the queue this registry was last finalized for, or `None`
    /// if `queue` changed since.
    pub fn batches_for<T>(&self, queue: &RenderQueue<T>) -> Option<&[RenderBatch]> {
        (self.finalized_generation == Some(queue.generation())).then_some(self.batches.as_slice())
    }

    pub fn batches(&self) -> &[RenderBatch] {
        &self.batches
    }

    pub fn is_finalized_for<T>(&self, queue: &RenderQueue<T>) -> bool {
        self.finalized_generation == Some(queue.generation())
    }

    /// Number of distinct (pipeline, material) pairs.
    pub fn distinct_combinations(&self) -> usize {
        self.combinations.len()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
        self.combinations.clear();
        self.finalized_generation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::SortKey;

    #[test]
    fn groups_adjacent_entries() {
        let m1 = MaterialId::next();
        let m2 = MaterialId::next();
        let p = PipelineHandle::new(1);
        let mut queue = RenderQueue::new();
        queue.insert(SortKey::opaque(p, m1, 1.0), ());
        queue.insert(SortKey::opaque(p, m1, 2.0), ());
        queue.insert(SortKey::opaque(p, m2, 1.0), ());
        queue.sort();

        let mut registry = RenderQueueRegistry::new();
        assert!(registry.finalize(&queue));
        let batches = registry.batches_for(&queue).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].range, 0..2);
        assert_eq!(batches[1].range, 2..3);
        assert_eq!(registry.distinct_combinations(), 2);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut queue = RenderQueue::new();
        queue.insert(SortKey::opaque(PipelineHandle::new(1), MaterialId::next(), 0.0), ());
        let mut registry = RenderQueueRegistry::new();
        assert!(registry.finalize(&queue));
        assert!(!registry.finalize(&queue));
        assert_eq!(registry.batches().len(), 1);
    }

    #[test]
    fn mutation_invalidates_batches() {
        let mut queue = RenderQueue::new();
        let key = SortKey::opaque(PipelineHandle::new(1), MaterialId::next(), 0.0);
        queue.insert(key, ());
        let mut registry = RenderQueueRegistry::new();
        registry.finalize(&queue);

        queue.insert(key, ());
        assert!(registry.batches_for(&queue).is_none());
        assert!(registry.finalize(&queue));
        assert_eq!(registry.batches_for(&queue).unwrap()[0].range, 0..2);
    }

    #[test]
    fn interleaved_transparent_entries_split_batches() {
        let m = MaterialId::next();
        let mut queue = RenderQueue::new();
        queue.insert(SortKey::transparent(PipelineHandle::new(1), m, 3.0), ());
        queue.insert(SortKey::transparent(PipelineHandle::new(2), m, 2.0), ());
        queue.insert(SortKey::transparent(PipelineHandle::new(1), m, 1.0), ());

        let mut registry = RenderQueueRegistry::new();
        registry.finalize(&queue);
        assert_eq!(registry.batches().len(), 3);
        assert_eq!(registry.distinct_combinations(), 2);
    }
}
