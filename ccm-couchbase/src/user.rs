use reqwest::StatusCode;

use crate::cluster::{expect_success, unexpected, CouchbaseAdmin};
use crate::errors::{CouchbaseError, Result};

/// RBAC identity domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthDomain {
    #[default]
    Local,
    External,
}

impl AuthDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthDomain::Local => "local",
            AuthDomain::External => "external",
        }
    }
}

impl CouchbaseAdmin {
    /// List the cluster's RBAC users as raw descriptors.
    pub async fn users(&self) -> Result<Vec<serde_json::Value>> {
        let response = self.endpoint.get("/settings/rbac/users").await?;

        match response.status() {
            status if status.is_success() => {
                let payload: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| CouchbaseError::InvalidPayload(e.to_string()))?;

                payload
                    .as_array()
                    .cloned()
                    .ok_or_else(|| {
                        CouchbaseError::InvalidPayload("user listing is not an array".to_owned())
                    })
            }
            StatusCode::UNAUTHORIZED => Err(CouchbaseError::Unauthorized),
            StatusCode::NOT_FOUND => Err(CouchbaseError::BucketNotFound),
            status => Err(unexpected(status, response).await),
        }
    }

    /// Existence check against the user listing, matched on the `id` field.
    pub async fn user_exists(&self, name: &str) -> Result<bool> {
        let users = self.users().await?;

        Ok(users
            .iter()
            .any(|user| user.get("id").and_then(serde_json::Value::as_str) == Some(name)))
    }

    /// Create an RBAC user with the given comma-separated role string.
    pub async fn create_user(
        &self,
        name: &str,
        password: &str,
        roles: &str,
        auth_domain: AuthDomain,
    ) -> Result<()> {
        let response = self
            .endpoint
            .put_form(
                &format!("/settings/rbac/users/{}/{}", auth_domain.as_str(), name),
                &[
                    ("name", name.to_owned()),
                    ("password", password.to_owned()),
                    ("roles", roles.to_owned()),
                ],
            )
            .await?;
        expect_success(response).await.map(|_| ())
    }

    /// Replace an existing user's role assignments.
    pub async fn set_roles(&self, user: &str, roles: &str) -> Result<()> {
        let response = self
            .endpoint
            .put_form(
                &format!("/settings/rbac/users/{}", user),
                &[("roles", roles.to_owned())],
            )
            .await?;
        expect_success(response).await.map(|_| ())
    }
}
