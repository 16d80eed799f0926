//! meshring: the self-organizing overlay routing core for a field-deployed
//! sensor node. Each node keeps a partial view of which peer owns which
//! portion of a small identifier space (a single-hop, small-N Chord-style
//! finger table) and keeps that view fresh through join announcements,
//! periodic stabilization, and heartbeat-based liveness tracking, over one
//! of two radio carriers chosen at boot.

pub mod error;
pub mod identity;
pub mod overlay;
pub mod transport;
