use serde::Deserialize;

/// Membership value of a node that is fully rebalanced into the cluster.
/// Anything else denotes a pending or transitional state.
pub const ACTIVE_MEMBERSHIP: &str = "active";

/// A cluster member as reported by the `/pools/nodes` topology query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub memory_total: u64,
    pub memory_free: u64,
    pub couch_api_base: String,
    pub cluster_membership: String,
    pub status: String,
    /// Opaque internal identifier assigned by the cluster; required for
    /// failover and rebalance calls and never derivable from the hostname.
    pub otp_node: String,
    /// Format `host:port`.
    pub hostname: String,
    pub version: String,
}

impl Node {
    pub fn is_active(&self) -> bool {
        self.cluster_membership == ACTIVE_MEMBERSHIP
    }
}
