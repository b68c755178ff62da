//! Application configuration options

use std::time::Duration;

use crate::storage::settings::Settings;
use crate::stream::socket;
use crate::utils::CooldownOptions;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Build backend base URL
    pub build_api_url: String,

    /// Build request timeout
    pub request_timeout: Duration,

    /// Log stream worker options
    pub stream: socket::Options,

    /// Markers meaning the deployment succeeded
    pub success_markers: Vec<String>,

    /// Markers meaning the deployment failed
    pub failure_markers: Vec<String>,

    /// Enable local control server
    pub enable_server: bool,

    /// Server configuration
    pub server: ServerOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        // Stream periods must be non-zero
        let base_delay_secs = settings.stream.reconnect_base_delay_secs.max(1);

        Self {
            lifecycle: LifecycleOptions::default(),
            build_api_url: settings.build_api.base_url.clone(),
            request_timeout: Duration::from_secs(settings.build_api.request_timeout_secs),
            stream: socket::Options {
                url: settings.stream.url.clone(),
                reconnect: CooldownOptions {
                    base_delay: Duration::from_secs(base_delay_secs),
                    max_delay: Duration::from_secs(
                        settings.stream.reconnect_max_delay_secs.max(base_delay_secs),
                    ),
                    ..Default::default()
                },
                heartbeat_interval: Duration::from_secs(
                    settings.stream.heartbeat_interval_secs.max(1),
                ),
            },
            success_markers: settings.classifier.success_markers.clone(),
            failure_markers: settings.classifier.failure_markers.clone(),
            enable_server: settings.enable_server,
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(10),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
