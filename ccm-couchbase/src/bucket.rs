use reqwest::StatusCode;

use crate::cluster::{expect_success, unexpected, CouchbaseAdmin};
use crate::errors::{CouchbaseError, Result};

impl CouchbaseAdmin {
    /// Fetch the raw bucket descriptor.
    pub async fn bucket_info(&self, name: &str) -> Result<serde_json::Value> {
        let response = self
            .endpoint
            .get(&format!("/pools/default/buckets/{}", name))
            .await?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| CouchbaseError::InvalidPayload(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(CouchbaseError::Unauthorized),
            StatusCode::NOT_FOUND => Err(CouchbaseError::BucketNotFound),
            status => Err(unexpected(status, response).await),
        }
    }

    /// Existence check: a not-found bucket is `false`, every other error
    /// propagates.
    pub async fn bucket_exists(&self, name: &str) -> Result<bool> {
        match self.bucket_info(name).await {
            Ok(_) => Ok(true),
            Err(CouchbaseError::BucketNotFound) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Create a bucket with the given RAM quota in MB. The bucket is created
    /// with auth type `none`.
    pub async fn create_bucket(&self, name: &str, memory_quota: u64) -> Result<()> {
        let response = self
            .endpoint
            .post_form(
                "/pools/default/buckets",
                &[
                    ("name", name.to_owned()),
                    ("ramQuotaMB", memory_quota.to_string()),
                    ("authType", "none".to_owned()),
                ],
            )
            .await?;
        expect_success(response).await.map(|_| ())
    }
}
