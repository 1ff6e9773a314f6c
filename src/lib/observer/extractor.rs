use super::{
    ports::port_from_labels,
    types::{Endpoint, EndpointId, ObserverWarning, WarningSink},
};
use crate::lib::metadata::types::{ContainerMetadata, ContainerStatus, TaskMetadata};
use std::sync::Arc;
use tracing::debug;

/// Turns a task metadata snapshot into the endpoints of its running containers.
///
/// Holds only configuration, so a single extractor can serve concurrent
/// callers. Every call returns a full set in snapshot order, never a delta.
#[derive(Clone)]
pub struct EndpointExtractor {
    port_labels: Vec<String>,
    sink: Arc<dyn WarningSink>,
}

impl EndpointExtractor {
    pub fn new(port_labels: Vec<String>, sink: Arc<dyn WarningSink>) -> Self {
        EndpointExtractor { port_labels, sink }
    }

    pub fn extract(&self, task: Option<&TaskMetadata>) -> Vec<Endpoint> {
        let Some(task) = task else {
            return Vec::new();
        };

        task.containers
            .iter()
            .filter(|container| {
                let status = container.status();
                if status != ContainerStatus::Running {
                    debug!(
                        container = %container.name,
                        status = status.as_str(),
                        "skipping container that is not running"
                    );
                }
                status == ContainerStatus::Running
            })
            .filter_map(|container| self.endpoint_for(container))
            .collect()
    }

    fn endpoint_for(&self, container: &ContainerMetadata) -> Option<Endpoint> {
        let Some(host) = container.primary_ipv4() else {
            self.sink.warn(ObserverWarning::MissingNetworkAddress {
                name: container.name.clone(),
                container_id: container.container_id.clone(),
            });
            return None;
        };

        let port = port_from_labels(&container.labels, &self.port_labels, self.sink.as_ref());
        let target = match port {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Some(Endpoint {
            id: EndpointId::for_container(&container.name, &container.container_id),
            target,
            host: host.to_string(),
            port,
            alternate_port: port,
            name: container.name.clone(),
            container_id: container.container_id.clone(),
            image: container.image.clone(),
            labels: container.labels.clone(),
        })
    }
}
