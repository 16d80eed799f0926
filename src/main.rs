use clap::Parser;
use meshring::overlay::engine::OverlayNode;
use meshring::overlay::{self, NodeConfig};
use meshring::transport::detect_carrier;
use std::net::Ipv4Addr;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshring")]
#[command(about = "Overlay routing node for field-deployed sensors")]
struct Cli {
    /// Stable identity seed, nominally the device address
    #[arg(long, default_value = overlay::PLACEHOLDER_SEED)]
    seed: String,

    /// Total node count N of the deployment (fixed, never discovered)
    #[arg(long, default_value_t = overlay::DEFAULT_NODE_COUNT)]
    node_count: u16,

    /// UDP port of the point-to-point packet radio carrier
    #[arg(long, default_value_t = overlay::DEFAULT_RADIO_PORT)]
    radio_port: u16,

    /// UDP port of the mesh carrier
    #[arg(long, default_value_t = overlay::DEFAULT_MESH_PORT)]
    mesh_port: u16,

    /// Multicast group of the mesh carrier
    #[arg(long, default_value_t = overlay::DEFAULT_MESH_GROUP)]
    mesh_group: Ipv4Addr,

    #[arg(long, default_value_t = overlay::HEARTBEAT_INTERVAL_MS)]
    heartbeat_interval_ms: u64,

    #[arg(long, default_value_t = overlay::LIVENESS_TIMEOUT_MS)]
    liveness_timeout_ms: u64,

    #[arg(long, default_value_t = overlay::STABILIZE_INTERVAL_MS)]
    stabilize_interval_ms: u64,

    /// Scheduler tick of the poll loop
    #[arg(long, default_value_t = overlay::TICK_MS)]
    tick_ms: u64,

    /// Use modular interval arithmetic in the routing comparisons instead
    /// of the deployed firmware's linear comparisons
    #[arg(long)]
    cyclic_intervals: bool,
}

impl Cli {
    fn into_config(self) -> NodeConfig {
        NodeConfig {
            node_count: self.node_count,
            seed: self.seed,
            heartbeat_interval_ms: self.heartbeat_interval_ms,
            liveness_timeout_ms: self.liveness_timeout_ms,
            stabilize_interval_ms: self.stabilize_interval_ms,
            tick_ms: self.tick_ms,
            radio_port: self.radio_port,
            mesh_port: self.mesh_port,
            mesh_group: self.mesh_group,
            cyclic_intervals: self.cyclic_intervals,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Cli::parse().into_config();

    // Fatal initialization failure: one diagnostic, then halt. No retry,
    // no degraded mode, no further sends.
    let transport = match detect_carrier(&cfg).await {
        Ok(transport) => transport,
        Err(err) => {
            error!(%err, "transport bring-up failed, halting");
            std::process::exit(1);
        }
    };

    OverlayNode::boot(cfg, transport).await.run().await;
}
