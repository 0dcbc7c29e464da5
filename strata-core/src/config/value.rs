use serde_json::{Map, Number, Value};

/// A single flattened configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    pub(crate) fn from_yaml(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Bool(b) => ConfigValue::Bool(*b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    ConfigValue::Float(f)
                } else {
                    ConfigValue::String(n.to_string())
                }
            }
            serde_yaml::Value::String(s) => ConfigValue::String(s.clone()),
            serde_yaml::Value::Null => ConfigValue::Null,
            serde_yaml::Value::Sequence(seq) => {
                ConfigValue::List(seq.iter().map(ConfigValue::from_yaml).collect())
            }
            serde_yaml::Value::Tagged(tagged) => ConfigValue::from_yaml(&tagged.value),
            // Mappings are flattened by the loader and never stored whole.
            serde_yaml::Value::Mapping(_) => ConfigValue::Null,
        }
    }

    /// Infer the type of an environment variable value.
    pub(crate) fn from_env(raw: &str) -> Self {
        match raw {
            "true" => ConfigValue::Bool(true),
            "false" => ConfigValue::Bool(false),
            _ => {
                if let Ok(i) = raw.parse::<i64>() {
                    ConfigValue::Integer(i)
                } else if let Ok(f) = raw.parse::<f64>() {
                    ConfigValue::Float(f)
                } else {
                    ConfigValue::String(raw.to_string())
                }
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ConfigValue::String(s) => Value::String(s.clone()),
            ConfigValue::Integer(i) => Value::from(*i),
            ConfigValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            ConfigValue::Bool(b) => Value::Bool(*b),
            ConfigValue::Null => Value::Null,
            ConfigValue::List(items) => Value::Array(items.iter().map(ConfigValue::to_json).collect()),
        }
    }

    /// The same scalar in its other textual form: strings are parsed,
    /// numbers and booleans are rendered. `None` for lists and null.
    pub(crate) fn alternate_json(&self) -> Option<Value> {
        match self {
            ConfigValue::String(s) => match ConfigValue::from_env(s) {
                ConfigValue::String(_) => None,
                inferred => Some(inferred.to_json()),
            },
            ConfigValue::Integer(i) => Some(Value::String(i.to_string())),
            ConfigValue::Float(f) => Some(Value::String(f.to_string())),
            ConfigValue::Bool(b) => Some(Value::String(b.to_string())),
            ConfigValue::Null | ConfigValue::List(_) => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

/// Rebuild a nested JSON object from dot-separated keys relative to a
/// section. Indexed list entries (`list.0`) are skipped when the list itself
/// is present.
pub(crate) fn unflatten<'a>(entries: impl Iterator<Item = (&'a str, &'a ConfigValue)>) -> Value {
    let mut sorted: Vec<_> = entries.collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut root = Map::new();
    'entries: for (key, value) in sorted {
        let segments: Vec<&str> = key.split('.').collect();
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };
        let mut node = &mut root;
        for segment in parents {
            let child = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match child {
                Value::Object(map) => node = map,
                _ => continue 'entries,
            }
        }
        node.entry(leaf.to_string()).or_insert_with(|| value.to_json());
    }
    Value::Object(root)
}
