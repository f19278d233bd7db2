mod loader;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use loader::load_config;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

/// Gateway server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Upstream Gemini configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// API key for the Generative Language API.
    /// Overridable via the GOOGLE_API_KEY environment variable.
    #[serde(default)]
    pub api_key: String,
    /// Model identifier (e.g., "gemini-2.0-flash").
    /// Overridable via the GEMINI_MODEL environment variable.
    #[serde(default)]
    pub model: String,
    /// Base URL of the Generative Language API
    #[serde(default = "default_upstream_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_upstream_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout() -> u64 {
    300
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: String::new(),
            url: default_upstream_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl UpstreamConfig {
    /// Returns the base URL with trailing slash stripped
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Cross-origin configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins; "*" allows any origin
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_origins(),
        }
    }
}

impl CorsConfig {
    /// Returns true if any origin is allowed
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Call trace recorder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraceConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_trace_endpoint")]
    pub endpoint: String,
    /// Overridable via the LANGSMITH_API_KEY environment variable
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_trace_project")]
    pub project: String,
}

fn default_trace_endpoint() -> String {
    "https://api.smith.langchain.com".to_string()
}

fn default_trace_project() -> String {
    "default".to_string()
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_trace_endpoint(),
            api_key: String::new(),
            project: default_trace_project(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file, applying environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_config(path)
    }

    /// Load configuration with fallback to default paths
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::from_file(path),
            None => {
                let default_paths = ["config.yaml", "config.yml", "./config/config.yaml"];
                for p in default_paths {
                    let path = Path::new(p);
                    if path.exists() {
                        return Self::from_file(path);
                    }
                }
                Err(ConfigError::NotFound(
                    "No config file found. Tried: config.yaml, config.yml, ./config/config.yaml"
                        .to_string(),
                ))
            }
        }
    }

    /// Validate that the configuration is complete enough to serve requests
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.api_key.is_empty() {
            return Err(ConfigError::Validation(
                "upstream.api_key is empty (set it in the config file or via GOOGLE_API_KEY)"
                    .to_string(),
            ));
        }
        if self.upstream.model.is_empty() {
            return Err(ConfigError::Validation(
                "upstream.model is empty (set it in the config file or via GEMINI_MODEL)"
                    .to_string(),
            ));
        }
        for origin in &self.cors.allowed_origins {
            if origin != "*" && url::Url::parse(origin).is_err() {
                return Err(ConfigError::Validation(format!(
                    "cors.allowed_origins entry is not a valid URL: {origin}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            upstream: UpstreamConfig {
                api_key: "test-key".to_string(),
                model: "gemini-2.0-flash".to_string(),
                ..UpstreamConfig::default()
            },
            cors: CorsConfig::default(),
            trace: TraceConfig::default(),
        }
    }

    #[test]
    fn test_upstream_base_url_trailing_slash() {
        let config = UpstreamConfig {
            url: "https://generativelanguage.googleapis.com/".to_string(),
            ..UpstreamConfig::default()
        };
        assert_eq!(config.base_url(), "https://generativelanguage.googleapis.com");
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_cors_default_allows_any() {
        let cors = CorsConfig::default();
        assert!(cors.allows_any());
    }

    #[test]
    fn test_cors_explicit_origins() {
        let cors = CorsConfig {
            allowed_origins: vec!["https://app.example.com".to_string()],
        };
        assert!(!cors.allows_any());
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_api_key() {
        let mut config = valid_config();
        config.upstream.api_key = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_validate_missing_model() {
        let mut config = valid_config();
        config.upstream.model = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_origin() {
        let mut config = valid_config();
        config.cors.allowed_origins = vec!["not a url".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trace_config_defaults() {
        let trace = TraceConfig::default();
        assert!(!trace.enabled);
        assert_eq!(trace.endpoint, "https://api.smith.langchain.com");
        assert_eq!(trace.project, "default");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NotFound("config.yaml".to_string());
        assert!(err.to_string().contains("config.yaml"));

        let err = ConfigError::Validation("upstream.model is empty".to_string());
        assert!(err.to_string().contains("upstream.model"));
    }

    #[test]
    fn test_config_from_file_missing() {
        let result = AppConfig::from_file("/nonexistent/path.yaml");
        assert!(result.is_err());
    }
}
