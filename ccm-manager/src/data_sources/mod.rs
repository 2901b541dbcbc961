mod docker;
pub(crate) use docker::DockerServiceDataSource;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::service::Service;

/// Source of the observed service instance set, queried once per
/// reconciliation pass. The returned set carries no ordering guarantee and
/// is de-duplicated by structural equality.
#[async_trait]
pub(crate) trait ServiceDataSource: Send + Sync {
    async fn fetch(&self) -> Result<HashSet<Service>>;
}
