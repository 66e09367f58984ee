//! Breadth-first frontier with visited-set dedup and lossy truncation.
//!
//! Uses a `BTreeSet` visited set (not `HashSet`) so iteration order never
//! depends on hasher state.

use std::collections::{BTreeSet, VecDeque};

use crate::key::DedupKey;
use crate::node::RankKey;

#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    node_id: u64,
    depth: u32,
}

/// FIFO frontier manager.
///
/// Maintains:
/// - A `VecDeque` of node ids in creation order
/// - A `BTreeSet<DedupKey>` of every key ever admitted
///
/// Keys stay in the visited set after their node is popped or pruned
/// (first-seen wins, pruning is irreversible).
#[derive(Debug, Default)]
pub struct BreadthFirstFrontier {
    queue: VecDeque<FrontierEntry>,
    visited: BTreeSet<DedupKey>,
    high_water: usize,
}

impl BreadthFirstFrontier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a node: mark its key visited and enqueue it.
    ///
    /// Returns `false` (and enqueues nothing) if the key was already visited.
    pub fn push(&mut self, node_id: u64, depth: u32, key: DedupKey) -> bool {
        if !self.visited.insert(key) {
            return false;
        }
        self.queue.push_back(FrontierEntry { node_id, depth });
        self.high_water = self.high_water.max(self.queue.len());
        true
    }

    /// Pop the oldest node id.
    pub fn pop(&mut self) -> Option<u64> {
        self.queue.pop_front().map(|e| e.node_id)
    }

    #[must_use]
    pub fn is_visited(&self, key: &DedupKey) -> bool {
        self.visited.contains(key)
    }

    #[must_use]
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Truncate to at most `max_size` entries.
    ///
    /// Survivors are chosen by [`RankKey`] (heuristic from `heuristic_of`,
    /// then depth, then node id) and then restored to creation order, so the
    /// queue stays breadth-first. Returns the pruned node ids in ascending
    /// order.
    pub fn prune_to<F>(&mut self, max_size: usize, mut heuristic_of: F) -> Vec<u64>
    where
        F: FnMut(u64) -> u64,
    {
        if self.queue.len() <= max_size {
            return Vec::new();
        }

        let mut ranked: Vec<(RankKey, FrontierEntry)> = self
            .queue
            .drain(..)
            .map(|e| {
                let key = RankKey {
                    heuristic: heuristic_of(e.node_id),
                    depth: e.depth,
                    node_id: e.node_id,
                };
                (key, e)
            })
            .collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let mut pruned: Vec<u64> = ranked[max_size..].iter().map(|(_, e)| e.node_id).collect();
        pruned.sort_unstable();

        ranked.truncate(max_size);
        let mut survivors: Vec<FrontierEntry> = ranked.into_iter().map(|(_, e)| e).collect();
        survivors.sort_by_key(|e| e.node_id);
        self.queue = survivors.into();

        pruned
    }
}
