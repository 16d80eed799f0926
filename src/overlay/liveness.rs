use crate::overlay::types::NodeId;

/// Tracks which peers are presumed reachable. Every identifier in the
/// deployment roster starts alive; heartbeats refresh an entry and a global
/// sweep ages silent peers out. The local node is exempt from eviction.
pub struct LivenessTracker {
    self_id: NodeId,
    timeout_ms: u64,
    alive: Vec<bool>,
    last_seen_ms: Vec<u64>,
}

impl LivenessTracker {
    pub fn new(self_id: NodeId, node_count: u16, timeout_ms: u64, now_ms: u64) -> Self {
        let n = usize::from(node_count);
        Self {
            self_id,
            timeout_ms,
            alive: vec![true; n],
            last_seen_ms: vec![now_ms; n],
        }
    }

    /// Records a heartbeat from `id`. Idempotent.
    pub fn mark_alive(&mut self, id: NodeId, now_ms: u64) {
        debug_assert!(self.in_roster(id), "id {id} outside the roster");
        self.alive[usize::from(id.0)] = true;
        self.last_seen_ms[usize::from(id.0)] = now_ms;
    }

    /// Calling this with an id outside `[0, N)` is a caller error.
    pub fn is_alive(&self, id: NodeId) -> bool {
        debug_assert!(self.in_roster(id), "id {id} outside the roster");
        if id == self.self_id {
            return true;
        }
        self.alive[usize::from(id.0)]
    }

    /// Global aging pass, run once per poll iteration. A slow tick delays
    /// detection for all peers uniformly.
    pub fn sweep(&mut self, now_ms: u64) {
        for idx in 0..self.alive.len() {
            if NodeId(idx as u16) == self.self_id {
                continue;
            }
            if now_ms.saturating_sub(self.last_seen_ms[idx]) > self.timeout_ms {
                self.alive[idx] = false;
            }
        }
    }

    /// Read-only snapshot for collaborators annotating sensor records.
    pub fn alive_peers(&self) -> Vec<NodeId> {
        (0..self.alive.len())
            .map(|idx| NodeId(idx as u16))
            .filter(|&id| self.is_alive(id))
            .collect()
    }

    fn in_roster(&self, id: NodeId) -> bool {
        usize::from(id.0) < self.alive.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: u64 = 30_000;

    fn tracker() -> LivenessTracker {
        LivenessTracker::new(NodeId(1), 4, TIMEOUT, 0)
    }

    #[test]
    fn everyone_starts_alive() {
        let t = tracker();
        for id in 0..4 {
            assert!(t.is_alive(NodeId(id)));
        }
    }

    #[test]
    fn fresh_heartbeat_survives_sweep() {
        let mut t = tracker();
        t.mark_alive(NodeId(2), 5_000);
        t.sweep(5_000 + TIMEOUT - 1);
        assert!(t.is_alive(NodeId(2)));
    }

    #[test]
    fn silence_past_timeout_evicts() {
        let mut t = tracker();
        t.mark_alive(NodeId(2), 5_000);
        t.sweep(5_000 + TIMEOUT + 1);
        assert!(!t.is_alive(NodeId(2)));
    }

    #[test]
    fn heartbeat_revives_an_evicted_peer() {
        let mut t = tracker();
        t.sweep(TIMEOUT + 1);
        assert!(!t.is_alive(NodeId(2)));
        t.mark_alive(NodeId(2), TIMEOUT + 2);
        assert!(t.is_alive(NodeId(2)));
    }

    #[test]
    fn self_is_never_evicted() {
        let mut t = tracker();
        t.sweep(u64::MAX);
        assert!(t.is_alive(NodeId(1)));
        assert!(!t.is_alive(NodeId(0)));
    }

    #[test]
    fn alive_peers_reflects_the_sweep() {
        let mut t = tracker();
        t.mark_alive(NodeId(3), TIMEOUT);
        t.sweep(TIMEOUT + 1);
        assert_eq!(t.alive_peers(), vec![NodeId(1), NodeId(3)]);
    }
}
