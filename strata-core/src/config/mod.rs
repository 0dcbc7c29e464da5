mod loader;
pub mod value;

use std::any::type_name;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use value::ConfigValue;

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// A section did not deserialize into the requested struct.
    Section { prefix: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Section { prefix, message } => {
                write!(f, "Invalid config section '{prefix}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration loaded from YAML files, `.env` files, and environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `strata.yaml` (base)
/// 2. `strata-{profile}.yaml` (profile override)
/// 3. `.env` file (loaded into process environment)
/// 4. `.env.{profile}` file (loaded into process environment)
/// 5. `STRATA_*` environment variables (e.g. `STRATA_DATASOURCE_URL` overrides
///    `strata.datasource.url`)
///
/// `.env` files never overwrite already-set environment variables.
///
/// Profile is determined by: `STRATA_PROFILE` env var > argument.
#[derive(Debug, Clone)]
pub struct StrataConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl StrataConfig {
    /// Load configuration for `profile` from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load configuration for `profile`, looking for files in `dir`.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var("STRATA_PROFILE").unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();

        loader::load_yaml_file(&dir.join("strata.yaml"), &mut values)?;
        let profile_path: PathBuf = dir.join(format!("strata-{active_profile}.yaml"));
        loader::load_yaml_file(&profile_path, &mut values)?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        loader::overlay_env(std::env::vars(), &mut values);

        tracing::debug!(profile = %active_profile, keys = values.len(), "Configuration loaded");
        Ok(StrataConfig {
            values,
            profile: active_profile,
        })
    }

    /// Create a config from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(StrataConfig {
            values,
            profile: profile.to_string(),
        })
    }

    /// Create an empty config (useful for testing).
    pub fn empty() -> Self {
        StrataConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Get a typed value for the given dot-separated key.
    ///
    /// Scalars convert between their string and typed forms, so an env var
    /// `"5"` reads as a number and a YAML `5` reads as a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the key does not exist, or
    /// `ConfigError::TypeMismatch` if the value cannot be converted.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        serde_json::from_value(value.to_json())
            .or_else(|_| match value.alternate_json() {
                Some(alt) => serde_json::from_value(alt),
                None => Err(<serde_json::Error as serde::de::Error>::custom("no alternate form")),
            })
            .map_err(|_| ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Get a typed value, returning a default if the key is missing or
    /// does not convert.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Deserialize every key under `prefix` into `T`.
    ///
    /// ```ignore
    /// let ds: DataSourceConfig = config.section("strata.datasource")?;
    /// ```
    pub fn section<T: DeserializeOwned>(&self, prefix: &str) -> Result<T, ConfigError> {
        let lead = format!("{prefix}.");
        let entries = self
            .values
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(&lead).map(|rest| (rest, v)));
        let tree = value::unflatten(entries);
        serde_json::from_value(tree).map_err(|e| ConfigError::Section {
            prefix: prefix.to_string(),
            message: e.to_string(),
        })
    }

    /// Check whether a key exists in the config.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }
}

fn default_datasource_name() -> String {
    "default".to_string()
}

/// Connection settings under `strata.datasource`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataSourceConfig {
    pub url: String,
    /// Connection name; part of every repository's table path.
    #[serde(default = "default_datasource_name")]
    pub name: String,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl DataSourceConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            name: default_datasource_name(),
            max_connections: None,
        }
    }

    pub fn from_config(config: &StrataConfig) -> Result<Self, ConfigError> {
        config.section("strata.datasource")
    }
}
