//! Bounded min-heap of a player's best lifetime scores.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::math::Wad;

/// Keeps the `capacity` largest values ever offered. The smallest retained
/// value sits at the root so it can be evicted in O(log k).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundedScoreHeap {
    #[serde(with = "protocol::serde_big::vec")]
    heap: Vec<Wad>,
}

impl BoundedScoreHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt values already stored in heap order (as the chain keeps them).
    pub fn from_heap_ordered(values: Vec<Wad>, capacity: usize) -> Result<Self, EngineError> {
        if capacity == 0 {
            return Err(EngineError::InvalidHeapCapacity(capacity));
        }
        if values.len() > capacity {
            return Err(EngineError::HeapOverCapacity {
                len: values.len(),
                capacity,
            });
        }
        Ok(Self { heap: values })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Smallest retained score.
    pub fn min(&self) -> Option<&Wad> {
        self.heap.first()
    }

    /// Values in internal heap order.
    pub fn values(&self) -> &[Wad] {
        &self.heap
    }

    /// Values from largest to smallest.
    pub fn sorted_desc(&self) -> Vec<Wad> {
        let mut values = self.heap.clone();
        values.sort_unstable_by(|a, b| b.cmp(a));
        values
    }

    pub fn sum(&self) -> Wad {
        self.heap.iter().sum()
    }

    /// Offer a score. Below capacity it is always kept; at capacity it
    /// replaces the current minimum only if strictly larger.
    pub fn enqueue(&mut self, score: Wad, capacity: usize) -> Result<(), EngineError> {
        if capacity == 0 {
            return Err(EngineError::InvalidHeapCapacity(capacity));
        }

        if self.heap.len() < capacity {
            self.heap.push(score);
            self.sift_up(self.heap.len() - 1);
            return Ok(());
        }

        if score <= self.heap[0] {
            return Ok(());
        }

        self.heap[0] = score;
        self.sift_down(0);
        Ok(())
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index] >= self.heap[parent] {
                break;
            }
            self.heap.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let mut smallest = index;
            let left = 2 * index + 1;
            let right = left + 1;

            if left < len && self.heap[left] < self.heap[smallest] {
                smallest = left;
            }
            if right < len && self.heap[right] < self.heap[smallest] {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.heap.swap(index, smallest);
            index = smallest;
        }
    }
}
