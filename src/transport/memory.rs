use crate::error::TransportError;
use crate::transport::{Carrier, Inbound, Transport};
use async_trait::async_trait;
use rand::Rng;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// In-process broadcast bus: every endpoint's send fans out to every other
/// endpoint, optionally dropping frames at a configured rate to exercise the
/// overlay's loss tolerance. Plays the role a radio simulator device plays
/// on hardware-adjacent builds.
#[derive(Clone, Default)]
pub struct MemoryBus {
    inner: Arc<Mutex<BusInner>>,
}

#[derive(Default)]
struct BusInner {
    endpoints: Vec<BusEndpoint>,
    loss: f64,
}

struct BusEndpoint {
    label: String,
    tx: mpsc::UnboundedSender<Inbound>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus that drops each delivery independently with probability `loss`.
    pub fn with_loss(loss: f64) -> Self {
        let bus = Self::default();
        bus.inner.lock().unwrap().loss = loss.clamp(0.0, 1.0);
        bus
    }

    /// Attaches a new endpoint. The label is the sender hint peers see.
    pub fn endpoint(&self, label: &str) -> MemoryTransport {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().endpoints.push(BusEndpoint {
            label: label.to_string(),
            tx,
        });
        MemoryTransport {
            label: label.to_string(),
            bus: Arc::clone(&self.inner),
            rx,
        }
    }
}

pub struct MemoryTransport {
    label: String,
    bus: Arc<Mutex<BusInner>>,
    rx: mpsc::UnboundedReceiver<Inbound>,
}

#[async_trait]
impl Transport for MemoryTransport {
    fn carrier(&self) -> Carrier {
        Carrier::InProcess
    }

    async fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let inner = self.bus.lock().map_err(|_| TransportError::Detached)?;
        for endpoint in inner.endpoints.iter().filter(|e| e.label != self.label) {
            if inner.loss > 0.0 && rand::rng().random_bool(inner.loss) {
                continue;
            }
            // A closed receiver is a peer that went away; best-effort send.
            let _ = endpoint.tx.send(Inbound {
                frame: frame.to_vec(),
                sender_hint: Some(self.label.clone()),
            });
        }
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<Inbound>, TransportError> {
        match self.rx.try_recv() {
            Ok(inbound) => Ok(Some(inbound)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Detached),
        }
    }
}
