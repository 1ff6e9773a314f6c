use super::types::{MetadataError, MetadataResult, TaskMetadata};
use async_trait::async_trait;
use std::{env, time::Duration};
use tracing::debug;

pub const METADATA_URI_V4_ENV: &str = "ECS_CONTAINER_METADATA_URI_V4";
pub const METADATA_URI_ENV: &str = "ECS_CONTAINER_METADATA_URI";

/// Source of task metadata snapshots.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_task_metadata(&self) -> MetadataResult<TaskMetadata>;
}

#[derive(Debug, Clone)]
pub struct HttpMetadataProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMetadataProvider {
    pub fn new(endpoint: &str, timeout: Duration) -> MetadataResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(MetadataError::Client)?;

        Ok(HttpMetadataProvider {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Uses `endpoint` when given, otherwise the metadata URI the agent injects
    /// into every container.
    pub fn from_env(endpoint: Option<&str>, timeout: Duration) -> MetadataResult<Self> {
        let endpoint = resolve_endpoint(endpoint, |key| env::var(key).ok())?;
        Self::new(&endpoint, timeout)
    }

    pub fn task_url(&self) -> String {
        format!("{}/task", self.endpoint)
    }
}

pub fn resolve_endpoint(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> MetadataResult<String> {
    explicit
        .map(str::to_string)
        .or_else(|| lookup(METADATA_URI_V4_ENV))
        .or_else(|| lookup(METADATA_URI_ENV))
        .filter(|endpoint| !endpoint.trim().is_empty())
        .ok_or(MetadataError::EndpointNotConfigured)
}

#[async_trait]
impl MetadataProvider for HttpMetadataProvider {
    async fn fetch_task_metadata(&self) -> MetadataResult<TaskMetadata> {
        let url = self.task_url();
        debug!(url = %url, "fetching task metadata");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| MetadataError::Request {
                url: url.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(MetadataError::Status {
                url,
                status: resp.status(),
            });
        }

        let task: TaskMetadata = resp
            .json()
            .await
            .map_err(|source| MetadataError::Decode {
                url: url.clone(),
                source,
            })?;

        debug!(
            url = %url,
            cluster = task.cluster.as_deref().unwrap_or_default(),
            task_arn = task.task_arn.as_deref().unwrap_or_default(),
            family = task.family.as_deref().unwrap_or_default(),
            revision = task.revision.as_deref().unwrap_or_default(),
            status = task.known_status.as_deref().unwrap_or_default(),
            containers = task.containers.len(),
            "task metadata fetched"
        );
        Ok(task)
    }
}
