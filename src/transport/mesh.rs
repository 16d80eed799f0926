use crate::error::TransportError;
use crate::overlay::NodeConfig;
use crate::transport::{Carrier, Inbound, Transport};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;

const MAX_FRAME: usize = 512;

/// Self-healing multi-hop mesh carrier. The mesh stack handles relaying;
/// from the overlay's point of view a frame sent to the group reaches every
/// reachable peer. Modeled as a UDP multicast group on the mesh port.
pub struct MeshRadio {
    socket: UdpSocket,
    group_addr: SocketAddr,
}

impl MeshRadio {
    /// Capability probe: bind the mesh port and join the deployment group.
    pub async fn probe(cfg: &NodeConfig) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, cfg.mesh_port)).await?;
        socket.join_multicast_v4(cfg.mesh_group, Ipv4Addr::UNSPECIFIED)?;
        socket.set_multicast_loop_v4(false)?;
        Ok(Self {
            socket,
            group_addr: SocketAddr::from((cfg.mesh_group, cfg.mesh_port)),
        })
    }
}

#[async_trait]
impl Transport for MeshRadio {
    fn carrier(&self) -> Carrier {
        Carrier::Mesh
    }

    async fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.socket.send_to(frame, self.group_addr).await?;
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
