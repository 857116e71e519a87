//! Hierarchical settings consumed by settings-style injection.
//!
//! Settings form a single JSON tree. Sources are layered with [`Settings::merge`]
//! (right wins) and looked up by dotted path.

use std::env;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{DiError, DiResult};

/// Configuration tree handed to settings slots.
///
/// # Examples
///
/// ```
/// use weft_di::Settings;
///
/// let base = Settings::from_json_str(r#"{"Acme": {"Database": {"host": "db", "port": 5432}}}"#).unwrap();
/// let local = Settings::from_json_str(r#"{"Acme": {"Database": {"host": "localhost"}}}"#).unwrap();
/// let settings = base.merge(local);
///
/// assert_eq!(settings.get("Acme.Database.host").unwrap(), "localhost");
/// assert_eq!(settings.get_as::<u16>("Acme.Database.port").unwrap(), Some(5432));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    root: Value,
}

impl Settings {
    /// Empty settings.
    pub fn new() -> Self {
        Self { root: Value::Object(Map::new()) }
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn from_json_str(source: &str) -> DiResult<Self> {
        serde_json::from_str(source)
            .map(Self::from_value)
            .map_err(|e| DiError::Configuration(e.to_string()))
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(source: &str) -> DiResult<Self> {
        serde_yaml::from_str(source)
            .map(Self::from_value)
            .map_err(|e| DiError::Configuration(e.to_string()))
    }

    /// Reads `PREFIX_A__B=value` process variables into the path `A.B`.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, env::vars())
    }

    /// Same mapping as [`from_env`](Self::from_env) over an explicit variable list.
    ///
    /// Values are parsed as JSON when possible and kept as strings otherwise.
    ///
    /// ```
    /// use weft_di::Settings;
    ///
    /// let settings = Settings::from_vars("ACME", vec![
    ///     ("ACME_Database__port".to_string(), "5432".to_string()),
    ///     ("ACME_Database__host".to_string(), "db.local".to_string()),
    ///     ("OTHER_ignored".to_string(), "x".to_string()),
    /// ]);
    /// assert_eq!(settings.get_as::<u16>("Database.port").unwrap(), Some(5432));
    /// assert_eq!(settings.get("Database.host").unwrap(), "db.local");
    /// assert!(settings.get("ignored").is_none());
    /// ```
    pub fn from_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{}_", prefix);
        let mut settings = Self::new();
        for (key, raw) in vars {
            let Some(rest) = key.strip_prefix(&marker) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            let path: Vec<&str> = rest.split("__").collect();
            settings.insert(&path, value);
        }
        settings
    }

    /// Deep-merges `other` into `self`; mappings merge recursively, anything else is replaced.
    pub fn merge(mut self, other: Settings) -> Self {
        merge_value(&mut self.root, other.root);
        self
    }

    /// Looks up a dotted path such as `"Acme.Database.host"`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split('.').try_fold(&self.root, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Decodes the value at `path`; `Ok(None)` when the path is absent.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> DiResult<Option<T>> {
        match self.get(path) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| DiError::Configuration(format!("{}: {}", path, e))),
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    fn insert(&mut self, path: &[&str], value: Value) {
        let mut node = &mut self.root;
        for segment in path {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else {
                return;
            };
            node = map.entry(segment.to_string()).or_insert(Value::Null);
        }
        *node = value;
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Value> for Settings {
    fn from(root: Value) -> Self {
        Self::from_value(root)
    }
}

fn merge_value(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(left), Value::Object(right)) => {
            for (key, value) in right {
                match left.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        left.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
