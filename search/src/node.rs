//! Search nodes and the truncation ranking key.

/// A node in the search arena.
///
/// `node_id` is assigned monotonically at creation and doubles as the
/// creation order, which is also breadth-first queue order.
#[derive(Debug, Clone)]
pub struct SearchNode<S, A> {
    pub node_id: u64,
    /// Parent node ID (`None` for root).
    pub parent_id: Option<u64>,
    pub state: S,
    /// Number of transitions from the root.
    pub depth: u32,
    /// Sum of transition costs from the root.
    pub cost: u64,
    /// The action that produced this node from its parent.
    pub producing_action: Option<A>,
}

/// Ranking used when the frontier must be truncated: `(heuristic, depth, node_id)`.
///
/// Lower is kept first: closer to goal, then shallower, then older.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    pub heuristic: u64,
    pub depth: u32,
    pub node_id: u64,
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.heuristic
            .cmp(&other.heuristic)
            .then(self.depth.cmp(&other.depth))
            .then(self.node_id.cmp(&other.node_id))
    }
}
