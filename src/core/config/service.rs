use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::types::AppConfig;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 2] = ["max_tokens", "tokens"];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("FLIPKART_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.user_data_dir.join("secrets.yaml")
    }

    /// Loads the effective configuration from files and the process environment.
    pub fn load_config(&self) -> Result<AppConfig, ApiError> {
        self.load_config_with(|key| env::var(key).ok())
    }

    /// Same as [`load_config`](Self::load_config) with an injectable env lookup.
    pub fn load_config_with<F>(&self, lookup: F) -> Result<AppConfig, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        let merged = deep_merge(&public_config, &secrets_config);

        let mut config: AppConfig = serde_json::from_value(merged)
            .map_err(|e| ApiError::BadRequest(format!("Invalid config: {}", e)))?;

        apply_env_overrides(&mut config, lookup);
        config.data.csv_path = self.paths.resolve_input(&config.data.csv_path);
        config.data.vector_db = self.paths.resolve_output(&config.data.vector_db);

        validate_config(&config)?;
        Ok(config)
    }

    pub fn redact_sensitive_values(&self, config: &AppConfig) -> Value {
        let value = serde_json::to_value(config).unwrap_or(Value::Null);
        redact_sensitive_values(&value)
    }
}

/// Environment variables take precedence over both YAML files.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT").and_then(|val| val.parse::<u16>().ok()) {
        config.server.port = port;
    }
    if let Some(host) = lookup("FLIPKART_HOST").filter(|val| !val.trim().is_empty()) {
        config.server.host = host;
    }
    if let Some(debug) = lookup("FLIPKART_DEBUG").and_then(|val| parse_bool(&val)) {
        config.server.debug = debug;
    }
    if let Some(path) = lookup("FLIPKART_DATA_PATH").filter(|val| !val.trim().is_empty()) {
        config.data.csv_path = PathBuf::from(path);
    }
    if let Some(key) = lookup("GROQ_API_KEY").filter(|val| !val.trim().is_empty()) {
        config.llm.api_key = Some(key);
    }
    if let Some(key) = lookup("HF_TOKEN").filter(|val| !val.trim().is_empty()) {
        config.embedding.api_key = Some(key);
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ApiError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ApiError::BadRequest(format!("Failed to read config {}: {}", path.display(), e))
    })?;
    let value = serde_yaml::from_str::<Value>(&contents).map_err(|e| {
        ApiError::BadRequest(format!("Failed to parse config {}: {}", path.display(), e))
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ApiError::BadRequest(format!(
            "Invalid config {}: expected a mapping at the top level",
            path.display()
        ))),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_in(dir: &Path) -> ConfigService {
        let paths = AppPaths::with_dirs(dir.to_path_buf(), dir.join("var"));
        ConfigService::new(Arc::new(paths))
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = service_in(dir.path()).load_config_with(|_| None).unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chat.session_id, "user-session");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(
            config.data.vector_db,
            dir.path().join("var").join("vector_store.db")
        );
    }

    #[test]
    fn secrets_file_is_merged_over_public_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "llm:\n  model: llama-3.3-70b-versatile\nretrieval:\n  top_k: 5\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("var")).unwrap();
        fs::write(
            dir.path().join("var").join("secrets.yaml"),
            "llm:\n  api_key: from-secrets\n",
        )
        .unwrap();

        let config = service_in(dir.path()).load_config_with(|_| None).unwrap();

        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm.api_key.as_deref(), Some("from-secrets"));
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.max_history_messages, 20);
    }

    #[test]
    fn env_overrides_win_over_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yml"), "server:\n  port: 8000\n").unwrap();

        let config = service_in(dir.path())
            .load_config_with(|key| match key {
                "PORT" => Some("9100".to_string()),
                "FLIPKART_DEBUG" => Some("false".to_string()),
                "GROQ_API_KEY" => Some("gsk-test".to_string()),
                "HF_TOKEN" => Some("hf-test".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.server.port, 9100);
        assert!(!config.server.debug);
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.embedding.api_key.as_deref(), Some("hf-test"));
    }

    #[test]
    fn unparseable_port_override_is_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |key| {
            (key == "PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yml"), "server: [unterminated").unwrap();

        let err = service_in(dir.path()).load_config_with(|_| None).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn redact_sensitive_values_hides_api_keys() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        let mut config = AppConfig::default();
        config.llm.api_key = Some("gsk-secret".to_string());
        config.llm.max_tokens = Some(256);

        let redacted = service.redact_sensitive_values(&config);

        assert_eq!(redacted["llm"]["api_key"], json!("****"));
        assert_eq!(redacted["llm"]["max_tokens"], json!(256));
        assert_eq!(redacted["embedding"]["api_key"], Value::Null);
    }
}
