use std::collections::HashMap;
use std::path::Path;

use super::value::ConfigValue;
use super::ConfigError;

/// Prefix of environment variables that overlay configuration keys.
pub(crate) const ENV_PREFIX: &str = "STRATA_";

/// Load and parse a YAML file, flattening it into the values map.
/// A missing file is not an error.
pub(crate) fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        load_yaml_str(&content, values)?;
    }
    Ok(())
}

/// Parse a YAML string and flatten it into the values map.
pub(crate) fn load_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Flatten a YAML tree into dot-separated keys.
pub(crate) fn flatten_yaml(
    prefix: &str,
    value: &serde_yaml::Value,
    out: &mut HashMap<String, ConfigValue>,
) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key_str = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => format!("{other:?}"),
                };
                let full_key = if prefix.is_empty() {
                    key_str
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(&full_key, v, out);
            }
        }
        serde_yaml::Value::Sequence(seq) if !prefix.is_empty() => {
            out.insert(
                prefix.to_string(),
                ConfigValue::List(seq.iter().map(ConfigValue::from_yaml).collect()),
            );
            // Indexed entries (key.0, key.1, ...) so single items can be overridden by env
            for (i, item) in seq.iter().enumerate() {
                flatten_yaml(&format!("{prefix}.{i}"), item, out);
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
            }
        }
    }
}

/// Overlay `STRATA_*` variables.
///
/// A variable overrides an existing key when the key, upper-cased with `.`
/// replaced by `_`, equals the variable name (`STRATA_SERVICE_CASE_DEPTH`
/// -> `strata.service.case_depth`). Otherwise it is added under the
/// lower-cased name with every `_` read as `.`.
pub(crate) fn overlay_env(
    vars: impl IntoIterator<Item = (String, String)>,
    values: &mut HashMap<String, ConfigValue>,
) {
    let known: HashMap<String, String> = values
        .keys()
        .map(|k| (k.replace('.', "_").to_uppercase(), k.clone()))
        .collect();
    for (env_key, env_val) in vars {
        if !env_key.starts_with(ENV_PREFIX) || env_key == "STRATA_PROFILE" {
            continue;
        }
        let config_key = known
            .get(&env_key)
            .cloned()
            .unwrap_or_else(|| env_key.to_lowercase().replace('_', "."));
        values.insert(config_key, ConfigValue::from_env(&env_val));
    }
}
