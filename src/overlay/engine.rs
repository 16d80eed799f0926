use crate::identity::derive_id;
use crate::overlay::liveness::LivenessTracker;
use crate::overlay::types::{FingerEntry, FingerTable, NodeId};
use crate::overlay::wire::Message;
use crate::overlay::NodeConfig;
use crate::transport::Transport;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// The overlay engine: one instance per node, owning the identity, finger
/// table, liveness set, and active transport. All mutation happens inside
/// the poll iteration that observed the triggering event — there is no
/// other thread of control and no shutdown protocol.
pub struct OverlayNode {
    cfg: NodeConfig,
    self_id: NodeId,
    transport: Box<dyn Transport>,
    fingers: FingerTable,
    liveness: LivenessTracker,
    booted_at: Instant,
    next_heartbeat_ms: u64,
    next_stabilize_ms: u64,
}

impl OverlayNode {
    /// Boot sequence. The carrier is already selected by the capability
    /// probe; from here: derive the identity, initialize the table, announce
    /// ourselves, and the node is ready for its steady-state loop.
    pub async fn boot(cfg: NodeConfig, transport: Box<dyn Transport>) -> Self {
        info!(carrier = %transport.carrier(), "transport selected");

        let self_id = derive_id(&cfg.seed, cfg.node_count);
        info!(%self_id, node_count = cfg.node_count, "identity derived");

        let fingers = FingerTable::new(self_id, cfg.node_count, cfg.cyclic_intervals);
        let liveness = LivenessTracker::new(self_id, cfg.node_count, cfg.liveness_timeout_ms, 0);
        let mut node = Self {
            next_heartbeat_ms: 0,
            next_stabilize_ms: cfg.stabilize_interval_ms,
            cfg,
            self_id,
            transport,
            fingers,
            liveness,
            booted_at: Instant::now(),
        };
        node.rebuild_fingers();
        info!("finger table initialized");

        node.broadcast(Message::Join(node.self_id)).await;
        info!("join announced, entering steady state");
        node
    }

    /// Steady state: loops until process restart. Each iteration services
    /// at most one inbound frame, then the liveness sweep, then whichever
    /// timers are due — messages before timers, nothing ever blocks.
    pub async fn run(mut self) {
        loop {
            self.tick().await;
            tokio::time::sleep(Duration::from_millis(self.cfg.tick_ms)).await;
        }
    }

    /// One cooperative poll iteration.
    pub async fn tick(&mut self) {
        let now = self.now_ms();
        self.poll_inbound(now);
        self.liveness.sweep(now);

        if now >= self.next_heartbeat_ms {
            self.next_heartbeat_ms = now + self.cfg.heartbeat_interval_ms;
            self.broadcast(Message::Heartbeat(self.self_id)).await;
        }
        if now >= self.next_stabilize_ms {
            self.next_stabilize_ms = now + self.cfg.stabilize_interval_ms;
            self.stabilize().await;
        }
    }

    /// Re-resolves every finger against the current liveness set, then emits
    /// a `CHECK` probe. The probe is fire-and-forget telemetry; nothing
    /// handles a response because none is defined.
    pub async fn stabilize(&mut self) {
        debug!("stabilizing finger table");
        self.rebuild_fingers();
        self.broadcast(Message::Check(self.self_id)).await;
    }

    /// A node is responsible for exactly the point `[self, self+1)` of the
    /// identifier space — its own identifier value, nothing wrapped.
    pub fn is_responsible_for(&self, key: NodeId) -> bool {
        key == self.self_id
    }

    /// Single-hop successor resolution: ourselves when responsible,
    /// otherwise the closest preceding live finger. Never forwarded.
    pub fn find_successor(&self, key: NodeId) -> NodeId {
        if self.is_responsible_for(key) {
            self.self_id
        } else {
            self.fingers
                .closest_preceding_peer(key, |id| self.liveness.is_alive(id))
        }
    }

    pub fn self_id(&self) -> NodeId {
        self.self_id
    }

    /// Read-only view for sensor/logging collaborators annotating records.
    pub fn alive_peers(&self) -> Vec<NodeId> {
        self.liveness.alive_peers()
    }

    pub fn finger_entries(&self) -> &[FingerEntry] {
        self.fingers.entries()
    }

    fn rebuild_fingers(&mut self) {
        let self_id = self.self_id;
        let liveness = &self.liveness;
        self.fingers.rebuild(|table, key| {
            if key == self_id {
                self_id
            } else {
                table.closest_preceding_peer(key, |id| liveness.is_alive(id))
            }
        });
    }

    /// Services at most one pending frame. Transport errors and protocol
    /// anomalies both resolve to "nothing received this tick".
    fn poll_inbound(&mut self, now_ms: u64) {
        let inbound = match self.transport.try_recv() {
            Ok(Some(inbound)) => inbound,
            Ok(None) => return,
            Err(err) => {
                warn!(%err, "receive failed, treating as idle tick");
                return;
            }
        };

        let msg = match Message::parse(&inbound.frame, self.cfg.node_count) {
            Ok(msg) => msg,
            Err(err) => {
                debug!(
                    %err,
                    sender = inbound.sender_hint.as_deref().unwrap_or("unknown"),
                    "dropping anomalous frame"
                );
                return;
            }
        };

        // Broadcast carriers can echo our own frames back.
        if msg.sender() == self.self_id {
            trace!(?msg, "own frame echoed back, ignoring");
            return;
        }

        match msg {
            Message::Join(id) => {
                debug!(%id, "peer announced itself");
                self.fingers.apply_join(id);
            }
            Message::Heartbeat(id) => {
                trace!(%id, "heartbeat");
                self.liveness.mark_alive(id, now_ms);
            }
            Message::Check(id) => {
                trace!(%id, "stabilization probe, no receiver behavior defined");
            }
        }
    }

    async fn broadcast(&mut self, msg: Message) {
        if let Err(err) = self.transport.send(&msg.encode()).await {
            warn!(%err, ?msg, "broadcast failed, relying on periodic retry");
        }
    }

    fn now_ms(&self) -> u64 {
        self.booted_at.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::memory::{MemoryBus, MemoryTransport};
    use crate::transport::{Carrier, Inbound};
    use async_trait::async_trait;

    fn test_config() -> NodeConfig {
        NodeConfig {
            node_count: 8,
            seed: "engine-test-node".to_string(),
            ..NodeConfig::default()
        }
    }

    async fn node_on_bus(bus: &MemoryBus) -> (OverlayNode, MemoryTransport) {
        let peer = bus.endpoint("peer");
        let node = OverlayNode::boot(test_config(), Box::new(bus.endpoint("node"))).await;
        (node, peer)
    }

    /// Transport that refuses every operation, for the absorption paths.
    struct DeadTransport;

    #[async_trait]
    impl crate::transport::Transport for DeadTransport {
        fn carrier(&self) -> Carrier {
            Carrier::InProcess
        }
        async fn send(&mut self, _frame: &[u8]) -> Result<(), TransportError> {
            Err(TransportError::Detached)
        }
        fn try_recv(&mut self) -> Result<Option<Inbound>, TransportError> {
            Err(TransportError::Detached)
        }
    }

    #[tokio::test]
    async fn boot_announces_join_and_initializes_fingers() {
        let bus = MemoryBus::new();
        let (node, mut peer) = node_on_bus(&bus).await;

        let inbound = peer.try_recv().unwrap().unwrap();
        assert_eq!(
            Message::parse(&inbound.frame, 8).unwrap(),
            Message::Join(node.self_id())
        );

        for (i, entry) in node.finger_entries().iter().enumerate() {
            assert_eq!(entry.start, node.self_id().finger_start(i, 8));
            assert_eq!(entry.owner, node.self_id());
        }
    }

    #[tokio::test]
    async fn responsibility_is_the_degenerate_interval() {
        let bus = MemoryBus::new();
        let (node, _peer) = node_on_bus(&bus).await;

        assert!(node.is_responsible_for(node.self_id()));
        for id in 0..8u16 {
            if NodeId(id) != node.self_id() {
                assert!(!node.is_responsible_for(NodeId(id)));
            }
        }
    }

    #[tokio::test]
    async fn find_successor_is_self_with_no_known_peers() {
        let bus = MemoryBus::new();
        let (node, _peer) = node_on_bus(&bus).await;
        for id in 0..8u16 {
            assert_eq!(node.find_successor(NodeId(id)), node.self_id());
        }
    }

    #[tokio::test]
    async fn inbound_join_updates_matching_fingers() {
        let bus = MemoryBus::new();
        let (mut node, mut peer) = node_on_bus(&bus).await;
        let _ = peer.try_recv();

        let joiner = NodeId((node.self_id().0 + 2) % 8);
        peer.send(&Message::Join(joiner).encode()).await.unwrap();
        node.tick().await;

        for entry in node.finger_entries() {
            if entry.start == joiner {
                assert_eq!(entry.owner, joiner);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_timeout_then_revival() {
        let bus = MemoryBus::new();
        let (mut node, mut peer) = node_on_bus(&bus).await;
        let silent = NodeId((node.self_id().0 + 1) % 8);

        tokio::time::advance(Duration::from_millis(30_001)).await;
        node.tick().await;
        assert!(!node.alive_peers().contains(&silent));

        peer.send(&Message::Heartbeat(silent).encode()).await.unwrap();
        node.tick().await;
        assert!(node.alive_peers().contains(&silent));
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeats_and_stabilization_fire_on_schedule() {
        let bus = MemoryBus::new();
        let (mut node, mut peer) = node_on_bus(&bus).await;
        let _join = peer.try_recv();

        // First tick sends the initial heartbeat.
        node.tick().await;
        let first = peer.try_recv().unwrap().unwrap();
        assert_eq!(
            Message::parse(&first.frame, 8).unwrap(),
            Message::Heartbeat(node.self_id())
        );
        assert!(peer.try_recv().unwrap().is_none());

        // Nothing further is due until the intervals elapse.
        node.tick().await;
        assert!(peer.try_recv().unwrap().is_none());

        tokio::time::advance(Duration::from_millis(30_001)).await;
        node.tick().await;
        let mut seen = Vec::new();
        while let Some(inbound) = peer.try_recv().unwrap() {
            seen.push(Message::parse(&inbound.frame, 8).unwrap());
        }
        assert!(seen.contains(&Message::Heartbeat(node.self_id())));
        assert!(seen.contains(&Message::Check(node.self_id())));
    }

    #[tokio::test]
    async fn anomalous_frames_are_dropped_silently() {
        let bus = MemoryBus::new();
        let (mut node, mut peer) = node_on_bus(&bus).await;
        let before: Vec<_> = node.finger_entries().to_vec();

        peer.send(b"JOIN:banana").await.unwrap();
        node.tick().await;
        peer.send(b"JOIN:200").await.unwrap();
        node.tick().await;
        peer.send(b"WHAT:1").await.unwrap();
        node.tick().await;

        assert_eq!(node.finger_entries(), &before[..]);
        assert_eq!(node.alive_peers().len(), 8);
    }

    #[tokio::test]
    async fn transport_failures_are_absorbed() {
        let mut node = OverlayNode::boot(test_config(), Box::new(DeadTransport)).await;
        // Boot already swallowed a failing join broadcast; the loop keeps
        // going through failing receives and sends.
        node.tick().await;
        node.stabilize().await;
        assert!(node.is_responsible_for(node.self_id()));
    }

    #[tokio::test]
    async fn stabilization_skips_dead_peers() {
        let bus = MemoryBus::new();
        let (mut node, mut peer) = node_on_bus(&bus).await;
        let self_id = node.self_id();

        // The joiner matches our first finger start and becomes its owner.
        let joiner = NodeId((self_id.0 + 1) % 8);
        peer.send(&Message::Join(joiner).encode()).await.unwrap();
        node.tick().await;

        // Evict it, then stabilize: no finger may keep the dead owner.
        node.liveness.sweep(u64::MAX);
        node.stabilize().await;
        for entry in node.finger_entries() {
            assert_ne!(entry.owner, joiner);
        }
    }
}
