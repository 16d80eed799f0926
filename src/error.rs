use crate::overlay::types::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

#[derive(Error, Debug)]
pub enum TransportError {
    /// Neither carrier passed its capability probe. Fatal at boot: the
    /// process halts, there is no retry and no degraded mode.
    #[error("no usable carrier: {0}")]
    ProbeFailed(String),

    /// A send or receive failed mid-operation. Absorbed by the engine and
    /// treated as "nothing received" / "best effort sent".
    #[error("carrier I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("carrier is detached from its bus")]
    Detached,
}

/// Anomalies in inbound frames. Never escalated past the poll loop; the
/// frame is dropped and the loop continues.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("id {0} outside the identifier space")]
    IdOutOfRange(NodeId),
}
