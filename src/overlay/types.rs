use crate::overlay::FINGER_BITS;
use std::fmt;

/// NodeId is a position in the identifier space `[0, N)`. Node identifiers
/// and keys share this type: both are hashed/reduced into the same space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u16);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NodeId {
    /// Start of the `i`-th finger interval: `(self + 2^i) mod N`.
    pub fn finger_start(&self, i: usize, node_count: u16) -> NodeId {
        let start = (u32::from(self.0) + (1u32 << i)) % u32::from(node_count);
        NodeId(start as u16)
    }

    pub fn in_space(&self, node_count: u16) -> bool {
        self.0 < node_count
    }
}

/// One routing shortcut: `owner` is the peer currently believed responsible
/// for the point `start` in the identifier space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerEntry {
    pub start: NodeId,
    pub owner: NodeId,
}

/// The per-node routing table: exactly `FINGER_BITS` exponentially spaced
/// entries, recomputed in place and never grown or shrunk.
pub struct FingerTable {
    self_id: NodeId,
    node_count: u16,
    cyclic: bool,
    entries: Vec<FingerEntry>,
}

impl FingerTable {
    /// Builds the table with every owner pointing at `self_id`. Owners are
    /// refined by `rebuild` and `apply_join` once peers announce themselves.
    pub fn new(self_id: NodeId, node_count: u16, cyclic: bool) -> Self {
        let entries = (0..FINGER_BITS)
            .map(|i| FingerEntry {
                start: self_id.finger_start(i, node_count),
                owner: self_id,
            })
            .collect();
        Self { self_id, node_count, cyclic, entries }
    }

    pub fn entries(&self) -> &[FingerEntry] {
        &self.entries
    }

    /// Full O(B) recompute: every `start` is re-derived from `self_id` and
    /// every `owner` re-resolved through `resolve`, which sees the table as
    /// rebuilt so far. No incremental path.
    pub fn rebuild(&mut self, mut resolve: impl FnMut(&FingerTable, NodeId) -> NodeId) {
        for i in 0..FINGER_BITS {
            let start = self.self_id.finger_start(i, self.node_count);
            let owner = resolve(&*self, start);
            self.entries[i] = FingerEntry { start, owner };
        }
    }

    /// Reacts to a `JOIN:<id>` announcement: an entry adopts `new_id` as its
    /// owner when `new_id` is exactly its start, or when the current owner
    /// sits strictly between us and the joiner.
    ///
    /// The default comparison is plain linear ordering, so entries near the
    /// top of the identifier space never match across the wrap boundary.
    /// That matches the deployed firmware; `cyclic` switches to modular
    /// interval arithmetic for deployments that opt in.
    pub fn apply_join(&mut self, new_id: NodeId) {
        let (self_id, cyclic) = (self.self_id, self.cyclic);
        for entry in &mut self.entries {
            if entry.start == new_id
                || Self::strictly_between(cyclic, self_id, entry.owner, new_id)
            {
                entry.owner = new_id;
            }
        }
    }

    /// Single-hop approximation of Chord's closest-preceding-finger: scan
    /// from the widest shortcut down, return the first live owner strictly
    /// between us and `key`, or `self_id` when none qualifies. The query is
    /// never forwarded further.
    pub fn closest_preceding_peer(
        &self,
        key: NodeId,
        is_alive: impl Fn(NodeId) -> bool,
    ) -> NodeId {
        for entry in self.entries.iter().rev() {
            if Self::strictly_between(self.cyclic, self.self_id, entry.owner, key)
                && is_alive(entry.owner)
            {
                return entry.owner;
            }
        }
        self.self_id
    }

    fn strictly_between(cyclic: bool, low: NodeId, x: NodeId, high: NodeId) -> bool {
        if cyclic && low >= high {
            x > low || x < high
        } else {
            x > low && x < high
        }
    }
}
