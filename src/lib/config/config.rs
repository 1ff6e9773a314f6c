use super::types::{Config, ConfigError, ConfigResult};
use reqwest::Url;
use std::time::Duration;
use tracing::Level;

impl Config {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.refresh_interval == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "refresh_interval",
            });
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "request_timeout",
            });
        }

        if let Some(endpoint) = &self.endpoint {
            let url = Url::parse(endpoint).map_err(|err| ConfigError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                reason: err.to_string(),
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::InvalidEndpoint {
                    endpoint: endpoint.clone(),
                    reason: format!("unsupported scheme {}", url.scheme()),
                });
            }
        }

        Ok(())
    }

    /// Port label candidates in priority order, trimmed, with blanks dropped.
    /// An empty list is valid and makes every endpoint host-only.
    pub fn candidate_port_labels(&self) -> Vec<String> {
        self.port_labels
            .iter()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn level(&self) -> Option<Level> {
        self.log_level.parse().ok()
    }
}
