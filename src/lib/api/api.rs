use axum::{
    Json, Router,
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use super::types::EndpointServer;
use crate::lib::observer::{types::Endpoint, watcher::EndpointsWatcher};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::watch};
use tracing::info;

impl EndpointServer {
    pub fn new(watcher: Arc<EndpointsWatcher>, address: SocketAddr) -> Self {
        Self { watcher, address }
    }

    async fn get_endpoints(
        AxumState(watcher): AxumState<Arc<EndpointsWatcher>>,
    ) -> Json<Vec<Endpoint>> {
        Json(watcher.endpoints().await)
    }

    async fn get_endpoint(
        AxumState(watcher): AxumState<Arc<EndpointsWatcher>>,
        Path(id): Path<String>,
    ) -> impl IntoResponse {
        match watcher
            .endpoints()
            .await
            .into_iter()
            .find(|e| e.id.as_str() == id)
        {
            Some(endpoint) => Json(endpoint).into_response(),
            None => (
                StatusCode::NOT_FOUND,
                format!("Endpoint with id {} not found", id),
            )
                .into_response(),
        }
    }

    async fn healthz() -> &'static str {
        "ok"
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/endpoints", get(EndpointServer::get_endpoints))
            .route("/endpoints/{id}", get(EndpointServer::get_endpoint))
            .route("/healthz", get(EndpointServer::healthz))
            .with_state(self.watcher.clone())
    }

    /// Binds the configured address so failures surface before serving starts.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind(self.address).await
    }

    pub async fn start_server(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let app = self.router();
        info!(address = %listener.local_addr()?, "serving endpoint listing");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while shutdown.changed().await.is_ok() {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::observer::types::{EndpointsLister, testing::endpoint};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    struct FixedLister(Vec<Endpoint>);

    #[async_trait]
    impl EndpointsLister for FixedLister {
        async fn list_endpoints(&self) -> Vec<Endpoint> {
            self.0.clone()
        }
    }

    async fn server() -> EndpointServer {
        let watcher = Arc::new(EndpointsWatcher::new(
            Arc::new(FixedLister(vec![
                endpoint("collector", "abc", "10.0.0.5", Some(4317)),
                endpoint("web", "def", "10.0.0.6", None),
            ])),
            Duration::from_secs(30),
        ));
        watcher.refresh().await;
        EndpointServer::new(watcher, "127.0.0.1:0".parse().unwrap())
    }

    async fn get(server: &EndpointServer, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = server
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn lists_known_endpoints() {
        let server = server().await;
        let (status, body) = get(&server, "/endpoints").await;

        assert_eq!(status, StatusCode::OK);
        let endpoints: Vec<Endpoint> = serde_json::from_slice(&body).unwrap();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].target, "10.0.0.5:4317");
        assert_eq!(endpoints[1].port, None);
    }

    #[tokio::test]
    async fn gets_single_endpoint() {
        let server = server().await;

        let (status, body) = get(&server, "/endpoints/web-def").await;
        assert_eq!(status, StatusCode::OK);
        let endpoint: Endpoint = serde_json::from_slice(&body).unwrap();
        assert_eq!(endpoint.host, "10.0.0.6");

        let (status, _) = get(&server, "/endpoints/missing-123").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bind_reports_an_address_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut server = server().await;
        server.address = taken.local_addr().unwrap();

        let err = server.bind().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AddrInUse);
    }

    #[tokio::test]
    async fn serves_until_shutdown() {
        let server = server().await;
        let listener = server.bind().await.unwrap();
        let address = listener.local_addr().unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(server.start_server(listener, rx));

        let body = reqwest::get(format!("http://{}/healthz", address))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn health_check() {
        let server = server().await;
        let (status, body) = get(&server, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }
}
