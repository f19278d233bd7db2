use std::path::Path;

use super::{AppConfig, ConfigError};

/// Load configuration from a YAML file and apply environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let mut config: AppConfig = serde_yaml::from_str(&content)?;

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Apply credential/model overrides from the environment.
///
/// The API key typically lives in the environment rather than the config
/// file, so a set variable always wins over the file value.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
        if !key.is_empty() {
            config.upstream.api_key = key;
        }
    }
    if let Ok(model) = std::env::var("GEMINI_MODEL") {
        if !model.is_empty() {
            config.upstream.model = model;
        }
    }
    if let Ok(key) = std::env::var("LANGSMITH_API_KEY") {
        if !key.is_empty() {
            config.trace.api_key = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_config() {
        let result = load_config("/nonexistent/config.yaml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_config_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.yaml");
        std::fs::write(&file, "invalid: yaml: content: [").unwrap();

        let result = load_config(&file);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_valid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.yaml");

        let config_content = r#"
server:
  port: 8000
  host: "0.0.0.0"

upstream:
  api_key: "file-key"
  model: "gemini-2.0-flash"
  timeout_seconds: 120

cors:
  allowed_origins:
    - "https://app.example.com"

trace:
  enabled: true
  api_key: "ls-key"
  project: "gateway"
"#;
        std::fs::write(&file, config_content).unwrap();

        let config = load_config(&file).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.upstream.model, "gemini-2.0-flash");
        assert_eq!(config.upstream.timeout_seconds, 120);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://app.example.com".to_string()]
        );
        assert!(config.trace.enabled);
        assert_eq!(config.trace.project, "gateway");
    }

    #[test]
    fn test_load_config_minimal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.yaml");

        // Only the upstream section is required; everything else defaults
        let config_content = r#"
upstream:
  api_key: "k"
  model: "gemini-2.0-flash"
"#;
        std::fs::write(&file, config_content).unwrap();

        let config = load_config(&file).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.upstream.timeout_seconds, 300);
        assert_eq!(
            config.upstream.base_url(),
            "https://generativelanguage.googleapis.com"
        );
        assert!(config.cors.allows_any());
        assert!(!config.trace.enabled);
    }
}
