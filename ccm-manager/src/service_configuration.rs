use std::fs::read_to_string;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default seconds in between reconciliation passes.
const DEFAULT_INTERVAL_SECS: u64 = 300;

/// configuration settings loaded from the config file
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LoadConfiguration {
    /// Managed cluster identity and provisioning parameters
    pub(crate) cluster: ClusterConfig,
    /// Bucket to create on the cluster, if any
    pub(crate) bucket: Option<BucketConfig>,
    /// Sync gateway user to create on the cluster, if any
    pub(crate) sync_gateway: Option<SyncGatewayConfig>,
    /// Seconds in between reconciliation passes (default 300)
    pub(crate) interval: Option<u64>,
    /// Docker Engine API endpoint used for service discovery
    pub(crate) docker_endpoint: String,
}

/// Managed cluster configuration.
///
/// The manager consolidates all discovered services declaring `name` as
/// their cluster into one Couchbase cluster.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ClusterConfig {
    pub(crate) name: String,
    /// Cluster admin username
    pub(crate) username: String,
    /// Cluster admin password, either a literal value or a path to a secret file
    pub(crate) password: String,
    /// Data service memory quota, in MB
    pub(crate) memory_quota: u64,
    /// Index service memory quota, in MB
    pub(crate) index_memory_quota: u64,
    /// Full text search service memory quota, in MB
    pub(crate) fts_memory_quota: u64,
}

/// Bucket descriptor: name plus RAM quota in MB.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BucketConfig {
    pub(crate) name: String,
    pub(crate) memory_quota: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SyncGatewayConfig {
    pub(crate) username: String,
    pub(crate) password: String,
}

/// validated runtime configuration for the manager service,
/// immutable for the process lifetime
#[derive(Debug)]
pub(crate) struct ServiceConfiguration {
    pub(crate) cluster: ClusterConfig,
    pub(crate) bucket: Option<BucketConfig>,
    pub(crate) sync_gateway: Option<SyncGatewayConfig>,
    pub(crate) interval: Duration,
    pub(crate) docker_endpoint: String,
}

/// Implementing the TryFrom trait to transform LoadConfiguration into ServiceConfiguration
impl TryFrom<LoadConfiguration> for ServiceConfiguration {
    type Error = anyhow::Error;

    fn try_from(config: LoadConfiguration) -> Result<Self> {
        let mut cluster = config.cluster;
        cluster.password = resolve_secret(&cluster.password);

        Ok(ServiceConfiguration {
            cluster,
            bucket: config.bucket,
            sync_gateway: config.sync_gateway,
            interval: Duration::from_secs(config.interval.unwrap_or(DEFAULT_INTERVAL_SECS)),
            docker_endpoint: config.docker_endpoint,
        })
    }
}

/// A password value may be a path to a file holding the secret (the docker
/// secrets convention); when no such file can be read the value is taken
/// literally.
pub(crate) fn resolve_secret(value: &str) -> String {
    match read_to_string(value) {
        Ok(contents) => contents.trim_end().to_owned(),
        Err(_) => value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
cluster:
  name: couchbase
  username: admin
  password: letmein
  memory_quota: 1024
  index_memory_quota: 512
  fts_memory_quota: 512
bucket:
  name: app
  memory_quota: 512
sync_gateway:
  username: sync-gateway
  password: secret
interval: 60
docker_endpoint: http://127.0.0.1:2375
"#;

    const MINIMAL_CONFIG: &str = r#"
cluster:
  name: couchbase
  username: admin
  password: letmein
  memory_quota: 1024
  index_memory_quota: 512
  fts_memory_quota: 512
docker_endpoint: http://127.0.0.1:2375
"#;

    #[test]
    fn loads_full_config() {
        let load_config: LoadConfiguration = serde_yaml::from_str(FULL_CONFIG).unwrap();
        let config: ServiceConfiguration = load_config.try_into().unwrap();

        assert_eq!(config.cluster.name, "couchbase");
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.bucket.unwrap().name, "app");
        assert_eq!(config.sync_gateway.unwrap().username, "sync-gateway");
    }

    #[test]
    fn bucket_user_and_interval_are_optional() {
        let load_config: LoadConfiguration = serde_yaml::from_str(MINIMAL_CONFIG).unwrap();
        let config: ServiceConfiguration = load_config.try_into().unwrap();

        assert!(config.bucket.is_none());
        assert!(config.sync_gateway.is_none());
        assert_eq!(config.interval, Duration::from_secs(DEFAULT_INTERVAL_SECS));
    }

    #[test]
    fn password_resolves_from_secret_file() {
        let path = std::env::temp_dir().join("ccm-secret-test");
        std::fs::write(&path, "from-file\n").unwrap();

        assert_eq!(resolve_secret(path.to_str().unwrap()), "from-file");
        assert_eq!(resolve_secret("literal-password"), "literal-password");

        std::fs::remove_file(&path).unwrap();
    }
}
