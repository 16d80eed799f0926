pub mod engine;
pub mod liveness;
pub mod types;
pub mod wire;

use std::net::Ipv4Addr;

// Overlay configuration. The identifier-space width is structural (it fixes
// the finger table arity); the rest are deployment constants with CLI
// overrides.
pub const FINGER_BITS: usize = 8;
pub const DEFAULT_NODE_COUNT: u16 = 8;
pub const HEARTBEAT_INTERVAL_MS: u64 = 10_000;
pub const LIVENESS_TIMEOUT_MS: u64 = 30_000;
pub const STABILIZE_INTERVAL_MS: u64 = 30_000;
pub const TICK_MS: u64 = 50;

pub const DEFAULT_RADIO_PORT: u16 = 47400;
pub const DEFAULT_MESH_PORT: u16 = 47401;
pub const DEFAULT_MESH_GROUP: Ipv4Addr = Ipv4Addr::new(239, 77, 0, 1);

/// The reference firmware derived its identity from a constant placeholder
/// instead of the hardware address. Kept as the default so the behavior is
/// visible and operator-overridable rather than silently corrected.
pub const PLACEHOLDER_SEED: &str = "DEVICE-ADDR-PLACEHOLDER";

#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Total node count N. Fixed at deployment, never discovered.
    pub node_count: u16,
    /// Stable seed for identity derivation, nominally the device address.
    pub seed: String,
    pub heartbeat_interval_ms: u64,
    pub liveness_timeout_ms: u64,
    pub stabilize_interval_ms: u64,
    /// Scheduler tick of the cooperative poll loop.
    pub tick_ms: u64,
    pub radio_port: u16,
    pub mesh_port: u16,
    pub mesh_group: Ipv4Addr,
    /// Opt-in modular interval arithmetic for the routing comparisons. The
    /// default preserves the deployed firmware's linear comparisons, which
    /// do not match across the wrap boundary of the identifier space.
    pub cyclic_intervals: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_count: DEFAULT_NODE_COUNT,
            seed: PLACEHOLDER_SEED.to_string(),
            heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
            liveness_timeout_ms: LIVENESS_TIMEOUT_MS,
            stabilize_interval_ms: STABILIZE_INTERVAL_MS,
            tick_ms: TICK_MS,
            radio_port: DEFAULT_RADIO_PORT,
            mesh_port: DEFAULT_MESH_PORT,
            mesh_group: DEFAULT_MESH_GROUP,
            cyclic_intervals: false,
        }
    }
}
