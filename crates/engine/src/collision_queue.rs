//! Per-line priority queue of predicted collisions.
//!
//! A binary min-heap keyed on collision time. The sift order reproduces the
//! contract's queue library exactly, since the order in which equal-time
//! entries pop decides which collision resolves first.

use num_bigint::BigUint;
use protocol::{EntityId, PackedEntry, ProtocolError};
use serde::{Deserialize, Serialize};

use crate::math::Wad;

/// One scheduled collision: at `time`, `entity_id` hits its left neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(with = "protocol::serde_big")]
    pub time: Wad,
    pub entity_id: EntityId,
}

impl QueueEntry {
    pub fn new(time: Wad, entity_id: EntityId) -> Self {
        Self { time, entity_id }
    }
}

impl From<PackedEntry> for QueueEntry {
    fn from(entry: PackedEntry) -> Self {
        Self::new(entry.time, entry.entity_id)
    }
}

/// Min-heap of [`QueueEntry`]. Only heap-safe operations are exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionQueue {
    heap: Vec<QueueEntry>,
}

impl CollisionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from packed words, keeping their stored (already heap) order.
    pub fn from_packed(words: &[BigUint]) -> Self {
        Self {
            heap: words
                .iter()
                .map(|word| PackedEntry::unpack(word).into())
                .collect(),
        }
    }

    /// Pack back into words in heap order.
    pub fn to_packed(&self) -> Result<Vec<BigUint>, ProtocolError> {
        self.heap
            .iter()
            .map(|entry| PackedEntry::new(entry.time.clone(), entry.entity_id.clone()).pack())
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entries in internal heap order.
    pub fn entries(&self) -> &[QueueEntry] {
        &self.heap
    }

    pub fn peek(&self) -> Option<&QueueEntry> {
        self.heap.first()
    }

    pub fn push(&mut self, entry: QueueEntry) {
        self.heap.push(entry);
        self.sift_up(self.heap.len() - 1);
    }

    pub fn pop(&mut self) -> Option<QueueEntry> {
        let last = self.heap.pop()?;
        if self.heap.is_empty() {
            return Some(last);
        }
        Some(self.replace(last))
    }

    /// Swap `entry` in at the root and return the old root.
    ///
    /// Callers must only use this on a non-empty queue; on an empty one the
    /// entry is simply pushed and returned back.
    pub fn replace(&mut self, entry: QueueEntry) -> QueueEntry {
        if self.heap.is_empty() {
            self.heap.push(entry.clone());
            return entry;
        }
        let root = std::mem::replace(&mut self.heap[0], entry);
        self.sift_down(0);
        root
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.heap[parent].time > self.heap[i].time {
                self.heap.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        if i + 1 >= len {
            return;
        }
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            if left >= len {
                break;
            }
            // The right child only wins on a strictly smaller time.
            let best = if right < len && self.heap[right].time < self.heap[left].time {
                right
            } else {
                left
            };
            if self.heap[i].time > self.heap[best].time {
                self.heap.swap(i, best);
                i = best;
            } else {
                break;
            }
        }
    }
}
