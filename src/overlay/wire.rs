use crate::error::ProtocolError;
use crate::overlay::types::NodeId;

const JOIN_PREFIX: &str = "JOIN:";
const CHECK_PREFIX: &str = "CHECK:";
const HEARTBEAT_PREFIX: &str = "HEARTBEAT:";

/// Overlay wire messages: ASCII `PREFIX:<decimal id>`, broadcast and
/// unacknowledged. Carrier-agnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    /// Presence announcement from a booting node.
    Join(NodeId),
    /// Stabilization probe. Fire-and-forget telemetry; receivers ignore it.
    Check(NodeId),
    /// Liveness ping.
    Heartbeat(NodeId),
}

impl Message {
    pub fn encode(&self) -> Vec<u8> {
        let text = match self {
            Message::Join(id) => format!("{JOIN_PREFIX}{id}"),
            Message::Check(id) => format!("{CHECK_PREFIX}{id}"),
            Message::Heartbeat(id) => format!("{HEARTBEAT_PREFIX}{id}"),
        };
        text.into_bytes()
    }

    /// Parses one inbound frame. `node_count` bounds the id; anything
    /// malformed or out of range is an anomaly the caller drops.
    pub fn parse(frame: &[u8], node_count: u16) -> Result<Message, ProtocolError> {
        let text = std::str::from_utf8(frame)
            .map_err(|_| ProtocolError::Malformed("not valid UTF-8".into()))?;
        let text = text.trim_end_matches('\n');

        let (rest, build): (&str, fn(NodeId) -> Message) =
            if let Some(rest) = text.strip_prefix(JOIN_PREFIX) {
                (rest, Message::Join)
            } else if let Some(rest) = text.strip_prefix(CHECK_PREFIX) {
                (rest, Message::Check)
            } else if let Some(rest) = text.strip_prefix(HEARTBEAT_PREFIX) {
                (rest, Message::Heartbeat)
            } else {
                return Err(ProtocolError::Malformed(format!("unknown frame {text:?}")));
            };

        let id = rest
            .parse::<u16>()
            .map(NodeId)
            .map_err(|_| ProtocolError::Malformed(format!("bad id field {rest:?}")))?;
        if !id.in_space(node_count) {
            return Err(ProtocolError::IdOutOfRange(id));
        }
        Ok(build(id))
    }

    pub fn sender(&self) -> NodeId {
        match self {
            Message::Join(id) | Message::Check(id) | Message::Heartbeat(id) => *id,
        }
    }
}
