use ccm_couchbase::Node;

pub(crate) const DEFAULT_ADMIN_PORT: u16 = 8091;

/// A desired cluster member, observed from service discovery.
///
/// Values are rebuilt from a live query every reconciliation pass and never
/// cached or mutated. Equality is structural over all fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Service {
    pub(crate) name: String,
    pub(crate) replicas: u64,
    pub(crate) port: u16,
    /// Name of the cluster this service belongs to
    pub(crate) cluster: String,
    /// Fully qualified hostname. Short hostnames are not allowed for cluster membership.
    pub(crate) hostname: String,
    /// Raw comma-separated role string as declared on the service
    pub(crate) services: String,
}

impl Service {
    pub(crate) fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    pub(crate) fn uri(&self) -> String {
        format!("http://{}:{}", self.hostname, self.port)
    }

    /// The `hostname:port` address is the sole join key between desired and
    /// actual state: a service and a node denote the same physical member
    /// iff the address matches the node's hostname.
    pub(crate) fn correlates(&self, node: &Node) -> bool {
        self.address() == node.hostname
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(hostname: &str) -> Node {
        serde_json::from_value(serde_json::json!({
            "memoryTotal": 0u64,
            "memoryFree": 0u64,
            "couchApiBase": format!("http://{}/", hostname),
            "clusterMembership": "active",
            "status": "healthy",
            "otpNode": format!("ns_1@{}", hostname),
            "hostname": hostname,
            "version": "5.0.1-5003-enterprise"
        }))
        .unwrap()
    }

    fn service(hostname: &str, port: u16) -> Service {
        Service {
            name: "db".to_owned(),
            replicas: 1,
            port,
            cluster: "couchbase".to_owned(),
            hostname: hostname.to_owned(),
            services: "data".to_owned(),
        }
    }

    #[test]
    fn correlates_on_address() {
        let service = service("db-0.example.com", 8091);
        assert!(service.correlates(&node("db-0.example.com:8091")));
    }

    #[test]
    fn hostname_alone_does_not_correlate() {
        let service = service("db-0.example.com", 9000);
        assert!(!service.correlates(&node("db-0.example.com:8091")));
        assert!(!service.correlates(&node("db-1.example.com:9000")));
    }
}
