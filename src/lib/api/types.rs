use crate::lib::observer::watcher::EndpointsWatcher;
use std::{net::SocketAddr, sync::Arc};

pub struct EndpointServer {
    pub watcher: Arc<EndpointsWatcher>,
    pub address: SocketAddr,
}
