use anyhow::{bail, Context, Result};
use ccm_couchbase::{
    AuthDomain, Couchbase, CouchbaseAdmin, Credentials, Node, ServiceOptions, StorageMode,
};
use tracing::{error, info};

use crate::data_sources::ServiceDataSource;
use crate::service::Service;
use crate::service_configuration::ServiceConfiguration;

/// Roles granted to the sync gateway user: full access to every bucket plus
/// read-only admin.
const SYNC_GATEWAY_ROLES: &str = "bucket_full_access[*],ro_admin";

/// The reconciliation controller.
///
/// Observes the desired member set through the discovery port, compares it
/// against the cluster's actual node membership and issues the minimal set
/// of admin operations to converge the two. The controller is the sole
/// writer of the cluster's administrative state.
pub(crate) struct Manager {
    config: ServiceConfiguration,
    data_source: Box<dyn ServiceDataSource>,
}

impl Manager {
    pub(crate) fn new(config: ServiceConfiguration, data_source: Box<dyn ServiceDataSource>) -> Self {
        Manager {
            config,
            data_source,
        }
    }

    /// Run the reconciliation loop for the process lifetime.
    ///
    /// One pass runs to completion before the next begins; a failed pass is
    /// logged and retried at the next tick. The interval timer is the only
    /// retry mechanism.
    pub(crate) async fn run(&self) {
        let mut interval = tokio::time::interval(self.config.interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.run_iteration().await {
                error!(cluster = %self.config.cluster.name, error = %e, "reconciliation pass failed");
            }
        }
    }

    pub(crate) async fn run_iteration(&self) -> Result<()> {
        let mut services: Vec<Service> = self
            .data_source
            .fetch()
            .await
            .context("failed to fetch services from discovery")?
            .into_iter()
            .filter(|service| service.cluster == self.config.cluster.name)
            .collect();

        // The discovery snapshot is an unordered set; sort it so that
        // join-or-bootstrap always targets a well-defined first instance.
        services.sort_by(|a, b| a.name.cmp(&b.name).then(a.hostname.cmp(&b.hostname)));

        // Get any already provisioned service, if none try to provision the
        // first, initializing a new cluster.
        let cluster = self.resolve_cluster(&services).await?;

        // Create bucket if needed
        if let Some(bucket) = &self.config.bucket {
            if !cluster.bucket_exists(&bucket.name).await? {
                info!(bucket = %bucket.name, "creating bucket");
                cluster.create_bucket(&bucket.name, bucket.memory_quota).await?;
            }
        }

        // Create sync gateway user if needed
        if let Some(user) = &self.config.sync_gateway {
            if !cluster.user_exists(&user.username).await? {
                info!(user = %user.username, "creating sync gateway user");
                cluster
                    .create_user(&user.username, &user.password, SYNC_GATEWAY_ROLES, AuthDomain::Local)
                    .await?;
            }
        }

        // Retrieve all current cluster nodes
        let nodes = cluster
            .nodes()
            .await
            .context("failed to query cluster topology")?;

        let (added, removed) = diff(&services, &nodes);

        if !added.is_empty() || !removed.is_empty() {
            info!(
                nodes = nodes.len(),
                services = services.len(),
                added = added.len(),
                removed = removed.len(),
                "cluster membership diverged"
            );
        }

        // Add new services to the cluster. One broken member must never
        // block convergence of the rest.
        for service in &added {
            info!(
                service = %service.name,
                cluster = %self.config.cluster.name,
                through = %cluster.uri(),
                "adding node to cluster"
            );

            if let Err(e) = cluster
                .add_node(
                    &service.hostname,
                    &self.config.cluster.username,
                    &self.config.cluster.password,
                    ServiceOptions::parse(&service.services),
                )
                .await
            {
                error!(service = %service.name, error = %e, "failed to add node");
            }
        }

        // Flag failed nodes, collecting the otpNodes of successful failovers
        let mut ejected_nodes = Vec::new();

        for node in &removed {
            info!(node = %node.hostname, cluster = %self.config.cluster.name, "failing over node");

            match cluster.failover(&node.otp_node).await {
                Ok(()) => ejected_nodes.push(node.otp_node.clone()),
                Err(e) => error!(node = %node.hostname, error = %e, "failed to fail over node"),
            }
        }

        let known_nodes = cluster
            .nodes()
            .await
            .context("failed to query cluster topology")?;

        if needs_rebalance(&known_nodes, &ejected_nodes) {
            info!(cluster = %self.config.cluster.name, "rebalancing cluster");

            let known: Vec<String> = known_nodes
                .iter()
                .map(|node| node.otp_node.clone())
                .collect();

            cluster.rebalance(&known, &ejected_nodes).await?;
        }

        Ok(())
    }

    /// Resolve the cluster handle for this pass: the first instance whose
    /// probe reports an existing admin identity, or — when none is
    /// provisioned — the first instance, bootstrapped into a new cluster.
    async fn resolve_cluster(&self, services: &[Service]) -> Result<CouchbaseAdmin> {
        let credentials = Credentials::new(
            &self.config.cluster.username,
            &self.config.cluster.password,
        );

        for service in services {
            if Couchbase::connect(&service.uri())?.is_provisioned().await? {
                return Ok(Couchbase::connect(&service.uri())?.authenticate(credentials.clone()));
            }
        }

        let Some(service) = services.first() else {
            bail!(
                "no service available to bootstrap or join cluster {}",
                self.config.cluster.name
            );
        };

        info!(
            service = %service.name,
            cluster = %self.config.cluster.name,
            "provisioning new cluster"
        );

        Couchbase::connect(&service.uri())?
            .provision(
                &service.hostname,
                credentials,
                self.config.cluster.memory_quota,
                self.config.cluster.index_memory_quota,
                self.config.cluster.fts_memory_quota,
                ServiceOptions::parse(&service.services),
                StorageMode::default(),
            )
            .await
            .context("failed to provision cluster")
    }
}

/// Compute which desired services are missing from the cluster and which
/// cluster nodes no longer have a backing service, joined on the
/// `hostname:port` correlation key.
pub(crate) fn diff<'a>(
    services: &'a [Service],
    nodes: &'a [Node],
) -> (Vec<&'a Service>, Vec<&'a Node>) {
    let added = services
        .iter()
        .filter(|service| !nodes.iter().any(|node| service.correlates(node)))
        .collect();

    let removed = nodes
        .iter()
        .filter(|node| !services.iter().any(|service| service.correlates(node)))
        .collect();

    (added, removed)
}

/// Rebalance is level-triggered on cluster state: any node still outside
/// `active` membership requires one, as does any failover performed this
/// pass. This also completes rebalances left half-done by a previous run.
pub(crate) fn needs_rebalance(nodes: &[Node], ejected_nodes: &[String]) -> bool {
    nodes.iter().any(|node| !node.is_active()) || !ejected_nodes.is_empty()
}
