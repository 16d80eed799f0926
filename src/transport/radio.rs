use crate::error::TransportError;
use crate::overlay::NodeConfig;
use crate::transport::{Carrier, Inbound, Transport};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;

const MAX_FRAME: usize = 512;

/// Point-to-point packet radio carrier. The driver broadcasts each frame to
/// everything in "radio range" — here a UDP broadcast datagram on the
/// deployment port — and polls the receive buffer without blocking.
pub struct PacketRadio {
    socket: UdpSocket,
    broadcast_addr: SocketAddr,
}

impl PacketRadio {
    /// Capability probe: address the radio on its known port and enable
    /// broadcast. Failure means the peripheral is absent and the caller
    /// should fall back to the mesh carrier.
    pub async fn probe(cfg: &NodeConfig) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, cfg.radio_port)).await?;
        socket.set_broadcast(true)?;
        Ok(Self {
            socket,
            broadcast_addr: SocketAddr::from((Ipv4Addr::BROADCAST, cfg.radio_port)),
        })
    }
}

#[async_trait]
impl Transport for PacketRadio {
    fn carrier(&self) -> Carrier {
        Carrier::PointToPoint
    }

    async fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.socket.send_to(frame, self.broadcast_addr).await?;
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<Inbound>, TransportError> {
        let mut buf = [0u8; MAX_FRAME];
        match self.socket.try_recv_from(&mut buf) {
            Ok((len, from)) => Ok(Some(Inbound {
                frame: buf[..len].to_vec(),
                sender_hint: Some(from.to_string()),
            })),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
