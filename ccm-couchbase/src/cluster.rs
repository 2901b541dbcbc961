use std::time::Duration;

use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::credentials::Credentials;
use crate::errors::{CouchbaseError, Result};
use crate::node::Node;
use crate::service_options::ServiceOptions;

const DEFAULT_ADMIN_PORT: u16 = 8091;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Index storage engine selected at cluster provisioning time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    #[default]
    Forestdb,
    MemoryOptimized,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Forestdb => "forestdb",
            StorageMode::MemoryOptimized => "memory_optimized",
        }
    }
}

/// Request plumbing shared by both handle stages. Basic auth is attached
/// iff credentials are present.
#[derive(Debug, Clone)]
pub(crate) struct AdminEndpoint {
    base_uri: String,
    port: u16,
    http: reqwest::Client,
    credentials: Option<Credentials>,
}

impl AdminEndpoint {
    fn new(uri: &str, credentials: Option<Credentials>) -> Result<Self> {
        let parsed = reqwest::Url::parse(uri)
            .map_err(|e| CouchbaseError::InvalidUri(format!("{}: {}", uri, e)))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(AdminEndpoint {
            base_uri: uri.trim_end_matches('/').to_owned(),
            port: parsed.port().unwrap_or(DEFAULT_ADMIN_PORT),
            http,
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, format!("{}{}", self.base_uri, path));

        if let Some(credentials) = &self.credentials {
            request = request.header(header::AUTHORIZATION, credentials.http_basic_auth());
        }

        request
    }

    pub(crate) async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.request(Method::GET, path).send().await?)
    }

    pub(crate) async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        Ok(self.request(Method::POST, path).form(form).send().await?)
    }

    pub(crate) async fn put_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        Ok(self.request(Method::PUT, path).form(form).send().await?)
    }

    async fn set_hostname(&self, hostname: &str) -> Result<()> {
        let response = self
            .post_form("/node/controller/rename", &[("hostname", hostname.to_owned())])
            .await?;
        expect_success(response).await.map(|_| ())
    }

    async fn set_quota(
        &self,
        field: &'static str,
        quota: u64,
        too_small: CouchbaseError,
    ) -> Result<()> {
        let response = self
            .post_form("/pools/default", &[(field, quota.to_string())])
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(CouchbaseError::Unauthorized),
            StatusCode::BAD_REQUEST => Err(too_small),
            status => Err(unexpected(status, response).await),
        }
    }

    async fn set_services(&self, services: ServiceOptions) -> Result<()> {
        let response = self
            .post_form(
                "/node/controller/setupServices",
                &[("services", services.to_string())],
            )
            .await?;
        expect_success(response).await.map(|_| ())
    }

    async fn set_storage_mode(&self, storage_mode: StorageMode) -> Result<()> {
        let response = self
            .post_form(
                "/settings/indexes",
                &[("storageMode", storage_mode.as_str().to_owned())],
            )
            .await?;
        expect_success(response).await.map(|_| ())
    }

    async fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        let response = self
            .post_form(
                "/settings/web",
                &[
                    ("username", credentials.username.clone()),
                    ("password", credentials.password.clone()),
                    ("port", self.port.to_string()),
                ],
            )
            .await?;
        expect_success(response).await.map(|_| ())
    }
}

/// Map a response into the typed error space: 2xx passes through, 401 maps
/// to [`CouchbaseError::Unauthorized`], anything else becomes the catch-all
/// carrying the raw status and body.
pub(crate) async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(CouchbaseError::Unauthorized),
        status => Err(unexpected(status, response).await),
    }
}

pub(crate) async fn unexpected(
    status: StatusCode,
    response: reqwest::Response,
) -> CouchbaseError {
    CouchbaseError::UnexpectedResponse {
        status,
        body: response.text().await.unwrap_or_default(),
    }
}

/// Unauthenticated handle to one node's admin endpoint.
///
/// Before an admin identity exists only the bootstrap probe and initial
/// provisioning are possible; everything else requires a [`CouchbaseAdmin`],
/// obtained through [`Couchbase::authenticate`] on an already provisioned
/// cluster or as the result of [`Couchbase::provision`].
#[derive(Debug, Clone)]
pub struct Couchbase {
    endpoint: AdminEndpoint,
}

impl Couchbase {
    pub fn connect(uri: &str) -> Result<Self> {
        Ok(Couchbase {
            endpoint: AdminEndpoint::new(uri, None)?,
        })
    }

    pub fn uri(&self) -> &str {
        &self.endpoint.base_uri
    }

    /// Probe whether the cluster behind this node already has an admin
    /// identity. The product answers the unauthenticated cluster-info request
    /// with 401 once provisioned; any other status means unprovisioned. The
    /// 401 here is a signal, not an error.
    pub async fn is_provisioned(&self) -> Result<bool> {
        let response = self.endpoint.get("/pools/default").await?;
        Ok(response.status() == StatusCode::UNAUTHORIZED)
    }

    /// Attach admin credentials, yielding the full operation set for an
    /// already provisioned cluster.
    pub fn authenticate(self, credentials: Credentials) -> CouchbaseAdmin {
        CouchbaseAdmin {
            endpoint: AdminEndpoint {
                credentials: Some(credentials),
                ..self.endpoint
            },
        }
    }

    /// Bootstrap a new cluster on this node.
    ///
    /// Quotas and service roles must be settled before the credentials call:
    /// `/settings/web` fixes the management port and finalizes the admin
    /// identity, after which every request must carry Basic auth.
    pub async fn provision(
        self,
        hostname: &str,
        credentials: Credentials,
        memory_quota: u64,
        index_memory_quota: u64,
        fts_memory_quota: u64,
        services: ServiceOptions,
        storage_mode: StorageMode,
    ) -> Result<CouchbaseAdmin> {
        debug!(uri = %self.endpoint.base_uri, %hostname, "provisioning cluster node");

        self.endpoint.set_hostname(hostname).await?;
        self.endpoint
            .set_quota("memoryQuota", memory_quota, CouchbaseError::MemoryQuotaTooSmall)
            .await?;
        self.endpoint
            .set_quota(
                "indexMemoryQuota",
                index_memory_quota,
                CouchbaseError::IndexMemoryQuotaTooSmall,
            )
            .await?;
        self.endpoint
            .set_quota(
                "ftsMemoryQuota",
                fts_memory_quota,
                CouchbaseError::FtsMemoryQuotaTooSmall,
            )
            .await?;
        self.endpoint.set_services(services).await?;
        self.endpoint.set_storage_mode(storage_mode).await?;
        self.endpoint.set_credentials(&credentials).await?;

        Ok(self.authenticate(credentials))
    }
}

/// Authenticated admin handle: every request carries HTTP Basic auth.
#[derive(Debug, Clone)]
pub struct CouchbaseAdmin {
    pub(crate) endpoint: AdminEndpoint,
}

impl CouchbaseAdmin {
    pub fn uri(&self) -> &str {
        &self.endpoint.base_uri
    }

    /// Register an external node under this cluster and return its otpNode
    /// identifier, needed later for failover and rebalance.
    pub async fn add_node(
        &self,
        hostname: &str,
        username: &str,
        password: &str,
        services: ServiceOptions,
    ) -> Result<String> {
        let response = self
            .endpoint
            .post_form(
                "/controller/addNode",
                &[
                    ("hostname", hostname.to_owned()),
                    ("user", username.to_owned()),
                    ("password", password.to_owned()),
                    ("services", services.to_string()),
                ],
            )
            .await?;

        let response = expect_success(response).await?;
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CouchbaseError::InvalidPayload(e.to_string()))?;

        payload
            .get("otpNode")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                CouchbaseError::InvalidPayload("missing otpNode in add node response".to_owned())
            })
    }

    /// Mark a node as failed over, evicting it from active service pending
    /// the next rebalance.
    pub async fn failover(&self, otp_node: &str) -> Result<()> {
        let response = self
            .endpoint
            .post_form("/controller/failOver", &[("otpNode", otp_node.to_owned())])
            .await?;
        expect_success(response).await.map(|_| ())
    }

    /// Trigger a topology rebalance over the given known/ejected node sets.
    ///
    /// The rebalance API treats an empty field value differently from an
    /// absent field; empty lists are omitted from the form entirely.
    pub async fn rebalance(&self, known_nodes: &[String], ejected_nodes: &[String]) -> Result<()> {
        let mut form: Vec<(&str, String)> = Vec::new();

        if !known_nodes.is_empty() {
            form.push(("knownNodes", known_nodes.join(",")));
        }
        if !ejected_nodes.is_empty() {
            form.push(("ejectedNodes", ejected_nodes.join(",")));
        }

        let response = self.endpoint.post_form("/controller/rebalance", &form).await?;
        expect_success(response).await.map(|_| ())
    }

    /// List the cluster's current topology.
    pub async fn nodes(&self) -> Result<Vec<Node>> {
        #[derive(Deserialize)]
        struct NodesPayload {
            nodes: Vec<Node>,
        }

        let response = self.endpoint.get("/pools/nodes").await?;
        let response = expect_success(response).await?;

        let payload: NodesPayload = response
            .json()
            .await
            .map_err(|e| CouchbaseError::InvalidPayload(e.to_string()))?;

        Ok(payload.nodes)
    }

    pub async fn set_memory_quota(&self, quota: u64) -> Result<()> {
        self.endpoint
            .set_quota("memoryQuota", quota, CouchbaseError::MemoryQuotaTooSmall)
            .await
    }

    pub async fn set_index_memory_quota(&self, quota: u64) -> Result<()> {
        self.endpoint
            .set_quota(
                "indexMemoryQuota",
                quota,
                CouchbaseError::IndexMemoryQuotaTooSmall,
            )
            .await
    }

    pub async fn set_fts_memory_quota(&self, quota: u64) -> Result<()> {
        self.endpoint
            .set_quota(
                "ftsMemoryQuota",
                quota,
                CouchbaseError::FtsMemoryQuotaTooSmall,
            )
            .await
    }

    /// Rotate the cluster admin credentials. Subsequent calls through this
    /// handle keep using the credentials it was constructed with.
    pub async fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        self.endpoint.set_credentials(credentials).await
    }
}
