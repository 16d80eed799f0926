use crate::overlay::types::NodeId;
use sha2::{Digest, Sha256};

/// Derives this node's fixed identifier from a stable seed string: SHA-256
/// of the seed, first digest byte reduced modulo the node count. Computed
/// once at boot, immutable thereafter.
///
/// The reduction into a very small range means two physically distinct
/// nodes can collide; the deployment accepts that rather than resolving it.
pub fn derive_id(seed: &str, node_count: u16) -> NodeId {
    debug_assert!(node_count > 0, "deployment must have at least one node");
    let digest = Sha256::digest(seed.as_bytes());
    NodeId(u16::from(digest[0]) % node_count)
}
