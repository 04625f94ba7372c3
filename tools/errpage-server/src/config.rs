//! Server configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;

/// Config file names searched for in the working directory.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["errpage.toml", "errpage.json"];

/// Server configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listener configuration.
    #[serde(default)]
    pub server: HttpConfig,

    /// Example page configuration.
    #[serde(default)]
    pub examples: ExamplesConfig,

    /// Static editor configuration.
    #[serde(default)]
    pub editor: EditorConfig,

    /// Trusted upstream headers.
    #[serde(default)]
    pub headers: TrustedHeadersConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl ServerConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Load the explicit config file, or the first one found in `dir`, or defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                return Self::load(&path);
            }
        }

        Ok(Self::default())
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.server.url_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            bail!("url_prefix must be empty or start with '/' and not end with '/': {:?}", prefix);
        }
        self.bind_addr()?;
        Ok(())
    }

    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind))
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address (default: 127.0.0.1:8080).
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path prefix for every route (default: none).
    #[serde(default)]
    pub url_prefix: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            url_prefix: String::new(),
        }
    }
}

/// Example page configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplesConfig {
    /// Directory of `<name>.json` parameter documents.
    #[serde(default = "default_examples_dir")]
    pub dir: PathBuf,

    /// Mark rendered pages as publicly cacheable.
    #[serde(default = "default_true")]
    pub edge_cache: bool,

    /// Edge cache lifetime in seconds.
    #[serde(default = "default_edge_cache_ttl")]
    pub edge_cache_ttl_secs: u64,
}

fn default_examples_dir() -> PathBuf {
    PathBuf::from("data/examples")
}

fn default_true() -> bool {
    true
}

fn default_edge_cache_ttl() -> u64 {
    300
}

impl Default for ExamplesConfig {
    fn default() -> Self {
        Self {
            dir: default_examples_dir(),
            edge_cache: true,
            edge_cache_ttl_secs: default_edge_cache_ttl(),
        }
    }
}

/// Static editor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Directory holding the editor's static files.
    #[serde(default = "default_editor_dir")]
    pub dir: PathBuf,
}

fn default_editor_dir() -> PathBuf {
    PathBuf::from("editor/resources")
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            dir: default_editor_dir(),
        }
    }
}

/// Names of the trusted upstream headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedHeadersConfig {
    /// Correlation id header (default: Cf-Ray).
    #[serde(default = "default_ray_header")]
    pub ray: String,

    /// Forwarded client address header (default: X-Forwarded-For).
    #[serde(default = "default_client_ip_header")]
    pub client_ip: String,
}

fn default_ray_header() -> String {
    "Cf-Ray".to_string()
}

fn default_client_ip_header() -> String {
    "X-Forwarded-For".to_string()
}

impl Default for TrustedHeadersConfig {
    fn default() -> Self {
        Self {
            ray: default_ray_header(),
            client_ip: default_client_ip_header(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive, overridden by `RUST_LOG` (default: info).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Command-line and environment overrides applied on top of the file config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub url_prefix: Option<String>,
    pub examples_dir: Option<PathBuf>,
    pub editor_dir: Option<PathBuf>,
    pub no_edge_cache: bool,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl Overrides {
    /// Apply the overrides that were set.
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(prefix) = self.url_prefix {
            config.server.url_prefix = prefix;
        }
        if let Some(dir) = self.examples_dir {
            config.examples.dir = dir;
        }
        if let Some(dir) = self.editor_dir {
            config.editor.dir = dir;
        }
        if self.no_edge_cache {
            config.examples.edge_cache = false;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        if let Some(format) = self.log_format {
            config.log.format = format;
        }
    }
}
