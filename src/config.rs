use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity recorded as creator of imported records unless configured.
pub const DEFAULT_IMPORTER: &str = "yapi";

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

/// Catalog service connection
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Catalog service URL (e.g., "http://yapi.internal:3000")
    pub base_url: Option<String>,
    /// Project token issued by the catalog
    pub token: Option<String>,
    /// Local project imported into when `--project` is not given
    pub project_id: Option<i64>,
}

impl CatalogConfig {
    /// Returns true if both the URL and the token are set
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.token.is_some()
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// User name recorded as creator of imported records
    pub importer: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    importer: Option<String>,
    catalog: Option<CatalogConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], reading overrides through `env`.
    pub fn load_with_env(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("apicase.db"),
            ConfigSource::Default,
        );
        let mut importer = ConfigValue::new(DEFAULT_IMPORTER.to_string(), ConfigSource::Default);
        let mut config_file = None;
        let mut catalog = CatalogConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(name) = file_config.importer {
                importer = ConfigValue::new(name, ConfigSource::File);
            }
            if let Some(catalog_config) = file_config.catalog {
                catalog = catalog_config;
            }
        }

        if let Some(db_path) = env("APICASE_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Some(name) = env("APICASE_IMPORTER") {
            importer = ConfigValue::new(name, ConfigSource::Environment);
        }
        if let Some(url) = env("APICASE_CATALOG_URL") {
            catalog.base_url = Some(url);
        }
        if let Some(token) = env("APICASE_CATALOG_TOKEN") {
            catalog.token = Some(token);
        }

        Ok(Self {
            database_path,
            importer,
            config_file,
            catalog,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/apicase/
    /// - macOS: ~/Library/Application Support/apicase/
    /// - Windows: %APPDATA%/apicase/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("apicase")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/apicase/
    /// - macOS: ~/Library/Application Support/apicase/
    /// - Windows: %APPDATA%/apicase/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("apicase")
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
