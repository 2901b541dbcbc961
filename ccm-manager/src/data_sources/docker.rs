use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::ServiceDataSource;
use crate::service::{Service, DEFAULT_ADMIN_PORT};

const DOCKER_API_VERSION: &str = "v1.32";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const CLUSTER_LABEL: &str = "com.ccm.cluster";
const HOSTNAME_LABEL: &str = "com.ccm.hostname";
const SERVICES_LABEL: &str = "com.ccm.services";
const PORT_LABEL: &str = "com.ccm.port";

/// Discovers cluster members from the Docker Engine API: every Docker
/// service labelled with `com.ccm.cluster` is a candidate member, described
/// by its `com.ccm.*` labels.
pub(crate) struct DockerServiceDataSource {
    endpoint: String,
    http: reqwest::Client,
}

impl DockerServiceDataSource {
    pub(crate) fn new(endpoint: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(DockerServiceDataSource {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            http,
        })
    }
}

#[async_trait]
impl ServiceDataSource for DockerServiceDataSource {
    async fn fetch(&self) -> Result<HashSet<Service>> {
        let url = format!("{}/{}/services", self.endpoint, DOCKER_API_VERSION);
        let filters = format!("{{\"label\":[\"{}\"]}}", CLUSTER_LABEL);

        let response = self
            .http
            .get(&url)
            .query(&[("filters", filters)])
            .send()
            .await?
            .error_for_status()
            .context("docker services query failed")?;

        let payload: Value = response.json().await?;
        let entries = payload
            .as_array()
            .context("docker services response is not an array")?;

        let mut services = HashSet::new();

        for entry in entries {
            match parse_service(entry) {
                Some(service) => {
                    services.insert(service);
                }
                None => debug!("skipping docker service entry without ccm labels"),
            }
        }

        Ok(services)
    }
}

/// Entries missing the required labels or `Spec` fields are skipped, not errors.
fn parse_service(entry: &Value) -> Option<Service> {
    let spec = entry.get("Spec")?;
    let labels = spec.get("Labels")?;

    let cluster = labels.get(CLUSTER_LABEL)?.as_str()?;
    let hostname = labels.get(HOSTNAME_LABEL)?.as_str()?;
    let role_string = labels.get(SERVICES_LABEL)?.as_str()?;
    let port = labels
        .get(PORT_LABEL)
        .and_then(Value::as_str)
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_ADMIN_PORT);

    Some(Service {
        name: spec.get("Name")?.as_str()?.to_owned(),
        replicas: spec.pointer("/Mode/Replicated/Replicas")?.as_u64()?,
        port,
        cluster: cluster.to_owned(),
        hostname: hostname.to_owned(),
        services: role_string.to_owned(),
    })
}
