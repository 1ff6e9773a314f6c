use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Lifecycle states a task container can report in `KnownStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    None,
    Pulled,
    Created,
    Running,
    ResourcesProvisioned,
    Stopped,
    Unknown,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::None => "NONE",
            ContainerStatus::Pulled => "PULLED",
            ContainerStatus::Created => "CREATED",
            ContainerStatus::Running => "RUNNING",
            ContainerStatus::ResourcesProvisioned => "RESOURCES_PROVISIONED",
            ContainerStatus::Stopped => "STOPPED",
            ContainerStatus::Unknown => "UNKNOWN",
        }
    }

    /// Exact, case-sensitive match. Anything unrecognised is `Unknown`.
    pub fn parse(status: &str) -> Self {
        match status {
            "NONE" => ContainerStatus::None,
            "PULLED" => ContainerStatus::Pulled,
            "CREATED" => ContainerStatus::Created,
            "RUNNING" => ContainerStatus::Running,
            "RESOURCES_PROVISIONED" => ContainerStatus::ResourcesProvisioned,
            "STOPPED" => ContainerStatus::Stopped,
            _ => ContainerStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskMetadata {
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(rename = "TaskARN", default)]
    pub task_arn: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub known_status: Option<String>,
    #[serde(default)]
    pub containers: Vec<ContainerMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "DockerId", default)]
    pub container_id: String,
    #[serde(rename = "KnownStatus", default)]
    pub known_status: String,
    #[serde(rename = "Image", default)]
    pub image: String,
    #[serde(rename = "Labels", default)]
    pub labels: HashMap<String, String>,
    #[serde(rename = "Networks", default)]
    pub networks: Vec<NetworkMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetadata {
    #[serde(rename = "NetworkMode", default)]
    pub network_mode: String,
    #[serde(rename = "IPv4Addresses", default)]
    pub ipv4_addresses: Vec<String>,
}

impl ContainerMetadata {
    pub fn status(&self) -> ContainerStatus {
        ContainerStatus::parse(&self.known_status)
    }

    /// First address of the first network attachment, if the agent reported one.
    pub fn primary_ipv4(&self) -> Option<&str> {
        self.networks
            .first()?
            .ipv4_addresses
            .first()
            .map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error(
        "task metadata endpoint not configured. Set ECS_CONTAINER_METADATA_URI_V4 or pass --endpoint"
    )]
    EndpointNotConfigured,

    #[error("failed to build metadata client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("metadata endpoint {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode task metadata from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type MetadataResult<T> = Result<T, MetadataError>;
