use super::{
    extractor::EndpointExtractor,
    types::{Endpoint, EndpointsLister, ObserverWarning, WarningSink},
};
use crate::lib::metadata::provider::MetadataProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Reports the endpoints of the task this process runs in.
pub struct TaskObserver {
    provider: Arc<dyn MetadataProvider>,
    extractor: EndpointExtractor,
    sink: Arc<dyn WarningSink>,
}

impl TaskObserver {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        port_labels: Vec<String>,
        sink: Arc<dyn WarningSink>,
    ) -> Self {
        TaskObserver {
            provider,
            extractor: EndpointExtractor::new(port_labels, sink.clone()),
            sink,
        }
    }
}

#[async_trait]
impl EndpointsLister for TaskObserver {
    async fn list_endpoints(&self) -> Vec<Endpoint> {
        let task = match self.provider.fetch_task_metadata().await {
            Ok(task) => Some(task),
            Err(err) => {
                self.sink.warn(ObserverWarning::MetadataFetchFailed {
                    error: err.to_string(),
                });
                None
            }
        };

        let endpoints = self.extractor.extract(task.as_ref());
        debug!(count = endpoints.len(), "listed task endpoints");
        endpoints
    }
}
