//! Settings file management

use serde::{Deserialize, Serialize};

use crate::deploy::phase::{DEFAULT_FAILURE_MARKERS, DEFAULT_SUCCESS_MARKERS};
use crate::logs::LogLevel;

/// Launchpad settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON logs on stdout
    #[serde(default)]
    pub log_json: bool,

    /// Also write logs to a rolling file
    #[serde(default)]
    pub log_to_file: bool,

    /// Build backend configuration
    #[serde(default)]
    pub build_api: BuildApiSettings,

    /// Log stream configuration
    #[serde(default)]
    pub stream: StreamSettings,

    /// Phase classifier markers
    #[serde(default)]
    pub classifier: ClassifierSettings,

    /// Local control server
    #[serde(default)]
    pub server: ServerSettings,

    /// Enable the local control server
    #[serde(default = "default_true")]
    pub enable_server: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_to_file: false,
            build_api: BuildApiSettings::default(),
            stream: StreamSettings::default(),
            classifier: ClassifierSettings::default(),
            server: ServerSettings::default(),
            enable_server: true,
        }
    }
}

/// Build backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildApiSettings {
    /// Base URL of the build backend
    #[serde(default = "default_build_api_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_build_api_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BuildApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_build_api_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Log stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    /// WebSocket endpoint of the log stream
    #[serde(default = "default_stream_url")]
    pub url: String,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    #[serde(default = "default_reconnect_base_delay")]
    pub reconnect_base_delay_secs: u64,

    #[serde(default = "default_reconnect_max_delay")]
    pub reconnect_max_delay_secs: u64,
}

fn default_stream_url() -> String {
    "ws://localhost:9002".to_string()
}

fn default_heartbeat_interval() -> u64 {
    25
}

fn default_reconnect_base_delay() -> u64 {
    1
}

fn default_reconnect_max_delay() -> u64 {
    30
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            reconnect_base_delay_secs: default_reconnect_base_delay(),
            reconnect_max_delay_secs: default_reconnect_max_delay(),
        }
    }
}

/// Terminal markers used to classify log lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    #[serde(default = "default_success_markers")]
    pub success_markers: Vec<String>,

    #[serde(default = "default_failure_markers")]
    pub failure_markers: Vec<String>,
}

fn default_success_markers() -> Vec<String> {
    DEFAULT_SUCCESS_MARKERS.iter().map(|m| m.to_string()).collect()
}

fn default_failure_markers() -> Vec<String> {
    DEFAULT_FAILURE_MARKERS.iter().map(|m| m.to_string()).collect()
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            success_markers: default_success_markers(),
            failure_markers: default_failure_markers(),
        }
    }
}

/// Control server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}
