use nutrilog_core::openfoodfacts;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote store settings. Without a server URL the CLI works on a local file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Server URL (e.g., "http://localhost:8080")
    pub server_url: Option<String>,
    /// API key for authentication
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl ServerConfig {
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some()
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local store file
    pub data_dir: ConfigValue<PathBuf>,
    /// Whose data the commands read and write
    pub user_id: ConfigValue<String>,
    /// Language recipes are shown and generated in
    pub language: ConfigValue<String>,
    /// Open Food Facts base URL
    pub off_url: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub server: ServerConfig,
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    user_id: Option<String>,
    language: Option<String>,
    off_url: Option<String>,
    server: Option<ServerConfig>,
    gemini_api_key: Option<String>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut user_id = ConfigValue::new("default".to_string(), ConfigSource::Default);
        let mut language = ConfigValue::new("en".to_string(), ConfigSource::Default);
        let mut off_url = ConfigValue::new(
            openfoodfacts::DEFAULT_BASE_URL.to_string(),
            ConfigSource::Default,
        );
        let mut config_file = None;
        let mut server = ServerConfig::default();
        let mut gemini_api_key = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Relative paths are relative to the config file
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(uid) = file_config.user_id {
                user_id = ConfigValue::new(uid, ConfigSource::File);
            }
            if let Some(lang) = file_config.language {
                language = ConfigValue::new(lang, ConfigSource::File);
            }
            if let Some(url) = file_config.off_url {
                off_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(server_config) = file_config.server {
                server = server_config;
            }
            gemini_api_key = file_config.gemini_api_key;
        }

        if let Ok(dir) = std::env::var("NUTRILOG_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(uid) = std::env::var("NUTRILOG_USER_ID") {
            user_id = ConfigValue::new(uid, ConfigSource::Environment);
        }
        if let Ok(lang) = std::env::var("NUTRILOG_LANGUAGE") {
            language = ConfigValue::new(lang, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("NUTRILOG_OFF_URL") {
            off_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("NUTRILOG_SERVER_URL") {
            server.server_url = Some(url);
        }
        if let Ok(key) = std::env::var("NUTRILOG_API_KEY") {
            server.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            gemini_api_key = Some(key);
        }

        Ok(Self {
            data_dir,
            user_id,
            language,
            off_url,
            config_file,
            server,
            gemini_api_key,
        })
    }

    /// Local store file used when no server is configured.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.value.join("nutrilog.json")
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/nutrilog/
    /// - macOS: ~/Library/Application Support/nutrilog/
    /// - Windows: %APPDATA%/nutrilog/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nutrilog")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/nutrilog/
    /// - macOS: ~/Library/Application Support/nutrilog/
    /// - Windows: %APPDATA%/nutrilog/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nutrilog")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config.store_path().ends_with("nutrilog.json"));
        assert_eq!(config.user_id.value, "default");
        assert_eq!(config.user_id.source, ConfigSource::Default);
        assert_eq!(config.off_url.value, openfoodfacts::DEFAULT_BASE_URL);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_dir: /srv/nutrilog").unwrap();
        writeln!(file, "user_id: ana").unwrap();
        writeln!(file, "language: es").unwrap();
        writeln!(file, "server:").unwrap();
        writeln!(file, "  server_url: http://localhost:8080").unwrap();
        writeln!(file, "  api_key: secret").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.data_dir.value, PathBuf::from("/srv/nutrilog"));
        assert_eq!(config.data_dir.source, ConfigSource::File);
        assert_eq!(config.user_id.value, "ana");
        assert_eq!(config.language.value, "es");
        assert_eq!(config.language.source, ConfigSource::File);
        assert!(config.server.is_configured());
        assert_eq!(config.server.api_key.as_deref(), Some("secret"));
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_dir_follows_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: data\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("data"));
    }

    #[test]
    fn test_secrets_are_not_shown() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            "gemini_api_key: g-secret\nserver:\n  api_key: s-secret\n",
        )
        .unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("g-secret"));
        assert!(!json.contains("s-secret"));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "user_id: fromfile").unwrap();

        std::env::set_var("NUTRILOG_USER_ID", "fromenv");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.user_id.value, "fromenv");
        assert_eq!(config.user_id.source, ConfigSource::Environment);

        std::env::remove_var("NUTRILOG_USER_ID");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
