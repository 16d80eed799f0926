pub mod memory;
pub mod mesh;
pub mod radio;

use crate::error::TransportError;
use crate::overlay::NodeConfig;
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info};

/// Which carrier a transport instance drives. Exactly one is active per
/// running instance, chosen once at boot; runtime switching is unsupported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Carrier {
    /// Broadcast point-to-point packet radio.
    PointToPoint,
    /// Self-healing multi-hop mesh.
    Mesh,
    /// In-process bus for tests and bench deployments.
    InProcess,
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Carrier::PointToPoint => "point-to-point radio",
            Carrier::Mesh => "multi-hop mesh",
            Carrier::InProcess => "in-process bus",
        };
        f.write_str(name)
    }
}

/// One inbound frame. The sender hint is carrier-specific (a socket address,
/// a bus label) and only ever used for diagnostics; the overlay identifies
/// peers by the id inside the frame.
#[derive(Clone, Debug)]
pub struct Inbound {
    pub frame: Vec<u8>,
    pub sender_hint: Option<String>,
}

/// The link-layer seam: best-effort unordered broadcast out, non-blocking
/// single-frame poll in. No ordering across senders, no acknowledgments.
#[async_trait]
pub trait Transport: Send {
    fn carrier(&self) -> Carrier;

    /// Best-effort broadcast to every peer reachable over the active
    /// carrier. Failures are for the caller to absorb, not escalate.
    async fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Non-blocking poll: at most one pending frame per call.
    fn try_recv(&mut self) -> Result<Option<Inbound>, TransportError>;
}

/// Capability probe run once at boot: try to bring up the point-to-point
/// packet radio; fall back to the mesh carrier if it is absent. Both probes
/// failing is a fatal initialization failure — no retry, no degraded mode.
pub async fn detect_carrier(cfg: &NodeConfig) -> Result<Box<dyn Transport>, TransportError> {
    match radio::PacketRadio::probe(cfg).await {
        Ok(radio) => {
            info!(port = cfg.radio_port, "point-to-point packet radio detected");
            Ok(Box::new(radio))
        }
        Err(radio_err) => {
            debug!(%radio_err, "packet radio absent, probing mesh carrier");
            match mesh::MeshRadio::probe(cfg).await {
                Ok(mesh) => {
                    info!(group = %cfg.mesh_group, port = cfg.mesh_port, "mesh carrier detected");
                    Ok(Box::new(mesh))
                }
                Err(mesh_err) => Err(TransportError::ProbeFailed(format!(
                    "packet radio: {radio_err}; mesh: {mesh_err}"
                ))),
            }
        }
    }
}
