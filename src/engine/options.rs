use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Engine configuration passed through verbatim to construction.
///
/// Keys follow the engine's own naming (`spellChecker`, `status`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineOptions(Map<String, Value>);

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The options every widget starts from.
    pub fn defaults() -> Self {
        let mut map = Map::new();
        map.insert("autoDownloadFontAwesome".to_string(), Value::Bool(false));
        map.insert("spellChecker".to_string(), Value::Bool(false));
        map.insert("status".to_string(), Value::Bool(false));
        Self(map)
    }

    /// These options layered over [`EngineOptions::defaults`].
    pub fn with_defaults(&self) -> Self {
        let mut merged = Self::defaults();
        for (key, value) in &self.0 {
            merged.0.insert(key.clone(), value.clone());
        }
        merged
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Truthiness of a feature flag. Arrays count as enabled, matching
    /// engines that accept either `true` or a list of sub-items.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Array(items)) => !items.is_empty(),
            _ => false,
        }
    }

    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Parse a `key=value` pair from the command line or a config file.
    ///
    /// Values that look like booleans or numbers become typed JSON values;
    /// everything else stays a string.
    pub fn parse_pair(pair: &str) -> Option<(String, Value)> {
        let (key, raw) = pair.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let raw = raw.trim();
        let value = match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => raw
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| raw.parse::<f64>().map(Value::from))
                .unwrap_or_else(|_| Value::String(raw.to_string())),
        };
        Some((key.to_string(), value))
    }

    /// Build options from `key=value` pairs; later pairs override earlier ones.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::new();
        for pair in pairs {
            if let Some((key, value)) = Self::parse_pair(pair.as_ref()) {
                options.set(key, value);
            }
        }
        options
    }
}
