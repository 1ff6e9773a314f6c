use clap::Parser;
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_PORT_LABEL: &str = "ECS_TASK_OBSERVER_PORT";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "task-observer",
    version,
    about = "Discovers the endpoints of the containers running in the current task"
)]
pub struct Config {
    /// Task metadata endpoint. Defaults to ECS_CONTAINER_METADATA_URI_V4.
    #[arg(long, env = "TASK_OBSERVER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Container labels that may hold the service port, highest priority first.
    #[arg(
        long,
        env = "TASK_OBSERVER_PORT_LABELS",
        value_delimiter = ',',
        default_value = DEFAULT_PORT_LABEL
    )]
    pub port_labels: Vec<String>,

    /// Seconds between metadata refreshes.
    #[arg(long, env = "TASK_OBSERVER_REFRESH_INTERVAL", default_value_t = DEFAULT_REFRESH_INTERVAL_SECS)]
    pub refresh_interval: u64,

    /// Seconds before a metadata request is abandoned.
    #[arg(long, env = "TASK_OBSERVER_REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout: u64,

    /// Serve the endpoint listing over HTTP on this address.
    #[arg(long, env = "TASK_OBSERVER_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// trace, debug, info, warn or error. RUST_LOG takes precedence.
    #[arg(long, env = "TASK_OBSERVER_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("invalid metadata endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
