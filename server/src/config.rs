//! Server configuration
//!
//! Configuration system supporting:
//! - JSON config files
//! - CLI argument overrides
//! - A runtime [`ServerConfig`] builder for programmatic setup

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{TrellisError, TrellisResult};

/// Complete Trellis server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrellisConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP server hostname
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Maximum request body size in bytes (default: 16MB)
    #[serde(default = "default_max_body_size")]
    pub max_request_body_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Middleware settings
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Top-level routes
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Routes registered under a shared prefix
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// Route configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// HTTP method; empty or absent means any method
    #[serde(default)]
    pub method: String,

    /// URL path pattern: /api/users/:id
    pub path: String,

    /// Fixed response served by the route
    #[serde(default)]
    pub response: Option<ResponseConfig>,
}

/// Fixed response of a configured route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    #[serde(default = "default_status")]
    pub status: u16,

    /// Body text; `{name}` expands to the route parameter `name`
    #[serde(default)]
    pub body: String,

    #[serde(default = "default_content_type")]
    pub content_type: String,
}

/// Group of routes sharing a path prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Prefix prepended to every route path in the group
    pub prefix: String,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MiddlewareConfig {
    /// Enable request logging middleware
    #[serde(default)]
    pub enable_logging: bool,
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            hostname: default_hostname(),
            max_request_body_size: default_max_body_size(),
            request_timeout_secs: default_request_timeout(),
            middleware: MiddlewareConfig::default(),
            routes: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl TrellisConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> TrellisResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrellisError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON text
    pub fn from_json(content: &str) -> TrellisResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> TrellisResult<()> {
        if self.port == 0 {
            return Err(TrellisError::Config("Port must be > 0".to_string()));
        }
        if self.hostname.is_empty() {
            return Err(TrellisError::Config("Hostname cannot be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(TrellisError::Config("Request timeout must be > 0".to_string()));
        }
        Ok(())
    }

    /// Total number of configured routes, groups included
    pub fn route_count(&self) -> usize {
        self.routes.len() + self.groups.iter().map(|g| g.routes.len()).sum::<usize>()
    }

    /// Runtime settings derived from this file
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new()
            .port(self.port)
            .hostname(self.hostname.clone())
            .max_request_body_size(self.max_request_body_size)
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}

// Default function values for serde
fn default_port() -> u16 { 3000 }
fn default_hostname() -> String { "127.0.0.1".to_string() }
fn default_max_body_size() -> usize { 16 * 1024 * 1024 }
fn default_request_timeout() -> u64 { 30 }
fn default_status() -> u16 { 200 }
fn default_content_type() -> String { "text/plain; charset=utf-8".to_string() }

/// Runtime server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub hostname: String,
    pub max_request_body_size: usize,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            hostname: default_hostname(),
            max_request_body_size: default_max_body_size(),
            request_timeout: Duration::from_secs(default_request_timeout()),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn max_request_body_size(mut self, size: usize) -> Self {
        self.max_request_body_size = size;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
