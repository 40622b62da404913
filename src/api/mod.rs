//! HTTP client for the Nscale region and compute services.
//!
//! Only the read path the reconciliation engine needs is implemented: one
//! `GET` per snapshot, decoded into [`ResourceSnapshot`]. Mutations are issued
//! by the caller before a wait begins.

mod error;
mod types;

pub use error::{ApiError, FetchError};
pub use types::{
    ProvisioningStatus, ResourceId, ResourceKind, ResourceMetadata, ResourceSnapshot,
    ResourceTarget, Tag,
};

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, NscaleConfig};
use crate::fetcher::{FetchFuture, ResourceFetcher};

/// Errors raised while constructing an [`NscaleClient`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClientError {
    /// Raised when the configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the HTTP client cannot be built.
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl From<ConfigError> for ClientError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

/// Read-only client over the Nscale control plane.
#[derive(Clone, Debug)]
pub struct NscaleClient {
    http: Client,
    service_token: String,
    organization_id: String,
    region_endpoint: String,
    compute_endpoint: String,
}

impl NscaleClient {
    /// Constructs a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the configuration fails
    /// validation and [`ClientError::Build`] when the TLS stack cannot be
    /// initialised.
    pub fn new(config: &NscaleConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|err| ClientError::Build(err.to_string()))?;
        Ok(Self {
            http,
            service_token: config.service_token.clone(),
            organization_id: config.organization_id.clone(),
            region_endpoint: config
                .region_service_api_endpoint
                .trim_end_matches('/')
                .to_owned(),
            compute_endpoint: config
                .compute_service_api_endpoint
                .trim_end_matches('/')
                .to_owned(),
        })
    }

    /// Fetches the current snapshot of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Api`] for non-success responses (including a
    /// synthesised `404` when a compute cluster is missing from the list),
    /// [`FetchError::Transport`] when no response arrives, and
    /// [`FetchError::Decode`] when the body is not a resource.
    pub async fn get(&self, target: &ResourceTarget) -> Result<ResourceSnapshot, FetchError> {
        match target.kind {
            ResourceKind::ComputeCluster => self.find_compute_cluster(&target.id).await,
            ResourceKind::Instance
            | ResourceKind::Network
            | ResourceKind::SecurityGroup
            | ResourceKind::FileStorage => {
                let endpoint = self.resource_endpoint(target);
                let body = self.get_json(&endpoint).await?;
                ResourceSnapshot::from_body(body).map_err(|err| FetchError::Decode {
                    endpoint,
                    message: err.to_string(),
                })
            }
        }
    }

    pub(crate) fn resource_endpoint(&self, target: &ResourceTarget) -> String {
        match target.kind {
            ResourceKind::Instance => {
                format!("{}/api/v2/instances/{}", self.compute_endpoint, target.id)
            }
            ResourceKind::ComputeCluster => format!(
                "{}/api/v1/organizations/{}/clusters",
                self.compute_endpoint, self.organization_id
            ),
            ResourceKind::Network => {
                format!("{}/api/v2/networks/{}", self.region_endpoint, target.id)
            }
            ResourceKind::SecurityGroup => format!(
                "{}/api/v2/securitygroups/{}",
                self.region_endpoint, target.id
            ),
            ResourceKind::FileStorage => {
                format!("{}/api/v2/filestorage/{}", self.region_endpoint, target.id)
            }
        }
    }

    async fn find_compute_cluster(&self, id: &ResourceId) -> Result<ResourceSnapshot, FetchError> {
        let endpoint = self.resource_endpoint(&ResourceTarget::new(
            ResourceKind::ComputeCluster,
            id.clone(),
        ));
        let body = self.get_json(&endpoint).await?;
        let serde_json::Value::Array(clusters) = body else {
            return Err(FetchError::Decode {
                endpoint,
                message: String::from("expected a list of compute clusters"),
            });
        };
        for cluster in clusters {
            let snapshot = ResourceSnapshot::from_body(cluster).map_err(|err| {
                FetchError::Decode {
                    endpoint: endpoint.clone(),
                    message: err.to_string(),
                }
            })?;
            if snapshot.id() == id.as_str() {
                return Ok(snapshot);
            }
        }
        Err(FetchError::not_found(format!(
            "failed to find compute cluster '{id}' in the list response"
        )))
    }

    async fn get_json(&self, endpoint: &str) -> Result<serde_json::Value, FetchError> {
        let response = self
            .http
            .get(endpoint)
            .bearer_auth(&self.service_token)
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                endpoint: endpoint.to_owned(),
                message: err.to_string(),
            })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Transport {
                endpoint: endpoint.to_owned(),
                message: err.to_string(),
            })?;
        debug!(endpoint, status = status.as_u16(), "fetched resource");

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), endpoint, body.to_vec()).into());
        }

        serde_json::from_slice(&body).map_err(|err| FetchError::Decode {
            endpoint: endpoint.to_owned(),
            message: err.to_string(),
        })
    }
}

impl ResourceFetcher for NscaleClient {
    fn fetch<'a>(&'a self, target: &'a ResourceTarget) -> FetchFuture<'a> {
        Box::pin(self.get(target))
    }
}

#[cfg(test)]
mod tests;
