//! Case-insensitive header bag.
//!
//! Hosts hand headers over in several shapes: a JSON object (values may be
//! strings or arrays of strings), a list of `[name, value]` tuples, or a list
//! of `{name, value}` objects. [`HeaderList::from_json`] accepts all three.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderList(Vec<(String, String)>);

impl HeaderList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Like [`HeaderList::get`] but trims and drops empty values.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn from_json(val: &Value) -> Self {
        let mut out = HeaderList::new();
        match val {
            Value::Object(map) => {
                for (name, value) in map {
                    match value {
                        Value::String(s) => out.insert(name.clone(), s.clone()),
                        Value::Array(arr) => {
                            if let Some(first) = arr.iter().find_map(Value::as_str) {
                                out.insert(name.clone(), first);
                            }
                        }
                        Value::Number(n) => out.insert(name.clone(), n.to_string()),
                        _ => {}
                    }
                }
            }
            Value::Array(arr) => {
                for item in arr {
                    if let Value::Array(kv) = item {
                        if let Some(name) = kv.first().and_then(Value::as_str) {
                            let value = kv.get(1).and_then(Value::as_str).unwrap_or("");
                            out.insert(name, value);
                        }
                    } else if let Value::Object(map) = item
                        && let Some(name) = map.get("name").and_then(Value::as_str)
                    {
                        let value = map.get("value").and_then(Value::as_str).unwrap_or("");
                        out.insert(name, value);
                    }
                }
            }
            _ => {}
        }
        out
    }

    /// Lower-cased name to value object, used when echoing headers into items.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.0 {
            map.entry(name.to_ascii_lowercase())
                .or_insert_with(|| Value::String(value.clone()));
        }
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let pairs = iter.into_iter().map(|(k, v)| (k.into(), v.into()));
        HeaderList(pairs.collect())
    }
}
