// TOML config adapter - Configuration management using TOML files

use crate::domain::errors::*;
use crate::error::LabelerError;
use crate::ports::*;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Section holding the labeler settings
const SECTION: &str = "labeler";

/// Environment variables overriding configuration keys
pub const ENV_MAPPINGS: [(&str, &str); 10] = [
    ("LABELER_API_URL", "api_url"),
    ("LABELER_API_USERNAME", "api_username"),
    ("LABELER_API_PASSWORD", "api_password"),
    ("LABELER_STORAGE_URL", "storage_url"),
    ("LABELER_BUCKET", "bucket"),
    ("LABELER_STORAGE_TOKEN", "storage_token"),
    ("LABELER_WORK_DIR", "work_dir"),
    ("LABELER_REPORT_COMMAND", "report_command"),
    ("LABELER_REQUEST_TIMEOUT_SECS", "request_timeout_secs"),
    ("LABELER_LOG_LEVEL", "log_level"),
];

/// Keys whose values never appear in logs or listings
pub const SECRET_KEYS: [&str; 2] = ["api_password", "storage_token"];

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    config: Arc<RwLock<BTreeMap<String, String>>>,
    config_file_path: Arc<RwLock<Option<PathBuf>>>,
}

impl TomlConfigAdapter {
    /// Create new TOML config adapter with default values
    pub fn new() -> Result<Self, DomainError> {
        Ok(Self {
            config: Arc::new(RwLock::new(Self::defaults())),
            config_file_path: Arc::new(RwLock::new(None)),
        })
    }

    fn defaults() -> BTreeMap<String, String> {
        let work_dir = std::env::temp_dir().join("exercise_labeler");
        [
            ("api_url", "http://localhost:8000"),
            ("storage_url", "http://localhost:9000"),
            ("bucket", "video-results"),
            ("request_timeout_secs", "30"),
            ("log_level", "info"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .chain(std::iter::once((
            "work_dir".to_string(),
            work_dir.to_string_lossy().to_string(),
        )))
        .collect()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, String>>, DomainError> {
        self.config
            .read()
            .map_err(|_| DomainError::Config("configuration lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, String>>, DomainError> {
        self.config
            .write()
            .map_err(|_| DomainError::Config("configuration lock poisoned".to_string()))
    }

    /// Get default config file path
    pub fn get_default_config_path() -> PathBuf {
        let candidate = PathBuf::from("config").join("labeler.toml");
        if candidate.exists() {
            candidate
        } else {
            PathBuf::from("labeler.toml")
        }
    }

    /// File the current values were loaded from, if any
    pub fn loaded_from(&self) -> Option<PathBuf> {
        self.config_file_path
            .read()
            .ok()
            .and_then(|path| path.clone())
    }

    /// Apply `LABELER_*` environment variables, returning how many were found
    pub fn apply_env_overrides(&self) -> Result<usize, DomainError> {
        let mut config = self.write()?;
        let mut applied = 0;
        for (env_var, key) in ENV_MAPPINGS {
            if let Ok(value) = std::env::var(env_var) {
                tracing::debug!("Environment override: {} -> {}", env_var, key);
                config.insert(key.to_string(), value);
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Value for display, with secrets masked
    pub fn display_value(key: &str, value: &str) -> String {
        if SECRET_KEYS.contains(&key) && !value.is_empty() {
            "********".to_string()
        } else {
            value.to_string()
        }
    }

    /// Serialize config to TOML string
    fn serialize_config(&self) -> Result<String, DomainError> {
        let config = self.read()?;
        let mut section = toml::map::Map::new();
        for (key, value) in config.iter() {
            section.insert(key.clone(), toml::Value::String(value.clone()));
        }
        let mut root = toml::map::Map::new();
        root.insert(SECTION.to_string(), toml::Value::Table(section));

        toml::to_string_pretty(&toml::Value::Table(root))
            .map_err(|e| DomainError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Deserialize config from TOML string
    fn deserialize_config(&self, toml_content: &str) -> Result<(), DomainError> {
        let parsed: toml::Value = toml::from_str(toml_content).map_err(LabelerError::from)?;

        let mut config = self.write()?;
        if let Some(table) = parsed.get(SECTION).and_then(|s| s.as_table()) {
            for (key, value) in table {
                let value = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    _ => {
                        return Err(DomainError::Config(format!(
                            "Unsupported value for {}",
                            key
                        )))
                    }
                };
                config.insert(key.clone(), value);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ConfigPort for TomlConfigAdapter {
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError> {
        Ok(self
            .read()?
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.write()?.insert(key.to_string(), value.to_string());
        tracing::debug!("Set config {} = {}", key, Self::display_value(key, value));
        Ok(())
    }

    async fn load_config(&self, file_path: &str) -> Result<(), DomainError> {
        let path = PathBuf::from(file_path);

        if !path.exists() {
            return Err(DomainError::FsFail(format!(
                "Config file does not exist: {}",
                file_path
            )));
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| DomainError::FsFail(format!("Failed to read config file: {}", e)))?;

        self.deserialize_config(&content)?;
        let mut config_path = self
            .config_file_path
            .write()
            .map_err(|_| DomainError::Config("configuration lock poisoned".to_string()))?;
        *config_path = Some(path);

        Ok(())
    }

    async fn save_config(&self, file_path: &str) -> Result<(), DomainError> {
        let path = PathBuf::from(file_path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DomainError::FsFail(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = self.serialize_config()?;
        std::fs::write(&path, content)
            .map_err(|e| DomainError::FsFail(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    async fn validate_config(&self) -> Result<(), DomainError> {
        let config = self.read()?;

        if let Some(log_level) = config.get("log_level") {
            LogLevel::parse(log_level)?;
        }

        for key in ["api_url", "storage_url"] {
            if let Some(url) = config.get(key) {
                reqwest::Url::parse(url)
                    .map_err(|e| DomainError::Config(format!("Invalid {} '{}': {}", key, url, e)))?;
            }
        }

        if let Some(timeout) = config.get("request_timeout_secs") {
            let secs: u64 = timeout.parse().map_err(|e| {
                DomainError::Config(format!("Invalid request_timeout_secs value: {}", e))
            })?;
            if secs == 0 {
                return Err(DomainError::Config(
                    "request_timeout_secs must be greater than zero".to_string(),
                ));
            }
        }

        Ok(())
    }

    async fn get_all_config_keys(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.read()?.keys().cloned().collect())
    }
}
