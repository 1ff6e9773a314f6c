use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    /// `{name}-{container_id}`. Unique within a task because the container id is.
    pub fn for_container(name: &str, container_id: &str) -> Self {
        EndpointId(format!("{}-{}", name, container_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        EndpointId(id.to_string())
    }
}

/// A running task container's reachable address and the metadata consumers
/// route on. Rebuilt from scratch on every listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: EndpointId,
    pub target: String,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    // Task containers have no port mapping, so this always mirrors `port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_port: Option<u16>,
    pub name: String,
    pub container_id: String,
    pub image: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Recoverable conditions hit while listing endpoints. None of them stop a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverWarning {
    MetadataFetchFailed {
        error: String,
    },
    PortLabelUnparsable {
        label: String,
        value: String,
        error: String,
    },
    PortLabelOutOfRange {
        label: String,
        value: i64,
    },
    MissingNetworkAddress {
        name: String,
        container_id: String,
    },
}

pub trait WarningSink: Send + Sync {
    fn warn(&self, warning: ObserverWarning);
}

/// Forwards warnings to the process `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, warning: ObserverWarning) {
        match warning {
            ObserverWarning::MetadataFetchFailed { error } => {
                warn!(error = %error, "error fetching task metadata");
            }
            ObserverWarning::PortLabelUnparsable {
                label,
                value,
                error,
            } => {
                warn!(label = %label, value = %value, error = %error, "failed parsing port label");
            }
            ObserverWarning::PortLabelOutOfRange { label, value } => {
                warn!(label = %label, value, "port label value invalid for port usage");
            }
            ObserverWarning::MissingNetworkAddress { name, container_id } => {
                warn!(
                    container = %name,
                    container_id = %container_id,
                    "running container has no network address, skipping"
                );
            }
        }
    }
}

/// Produces the full current endpoint set on every call.
#[async_trait]
pub trait EndpointsLister: Send + Sync {
    async fn list_endpoints(&self) -> Vec<Endpoint>;
}
