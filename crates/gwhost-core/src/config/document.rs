//! In-memory config document with structural helpers.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use super::atomic::write_atomic;
use super::error::ConfigError;

/// A parsed config whose root is guaranteed to be a JSON object.
///
/// Keys are addressed by path segments (`&["gateway", "auth", "token"]`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigDocument {
    root: Map<String, Value>,
}

impl ConfigDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config text, rejecting anything whose root is not an object.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(root) => Ok(Self { root }),
            other => Err(ConfigError::NotAnObject(kind_of(&other))),
        }
    }

    /// Read and parse a config file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Serialize as pretty JSON with a trailing newline.
    pub fn to_pretty_string(&self) -> Result<String, ConfigError> {
        let mut text = serde_json::to_string_pretty(&self.root)?;
        text.push('\n');
        Ok(text)
    }

    /// Write the document to `path` (temp file + rename).
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let text = self.to_pretty_string()?;
        write_atomic(path, text.as_bytes()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Borrow the root object.
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Value at `path`, if every segment exists.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut current = &self.root;
        for key in parents {
            current = current.get(*key)?.as_object()?;
        }
        current.get(*last)
    }

    /// String at `path`, if present and a string.
    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Walk `path`, creating empty objects for missing segments.
    ///
    /// Fails if an existing segment holds a non-object value; that value is
    /// left untouched.
    pub fn ensure_object(&mut self, path: &[&str]) -> Result<&mut Map<String, Value>, ConfigError> {
        let mut current = &mut self.root;
        for (depth, key) in path.iter().enumerate() {
            let entry = current
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = entry
                .as_object_mut()
                .ok_or_else(|| ConfigError::NotAnObjectAt(path[..=depth].join(".")))?;
        }
        Ok(current)
    }

    /// Set `path` to `value` unless a non-null value is already there.
    ///
    /// Returns whether the document changed.
    pub fn set_if_absent(&mut self, path: &[&str], value: Value) -> Result<bool, ConfigError> {
        let (last, parents) = path.split_last().ok_or(ConfigError::EmptyKeyPath)?;
        let parent = self.ensure_object(parents)?;
        if parent.get(*last).is_some_and(|existing| !existing.is_null()) {
            return Ok(false);
        }
        parent.insert((*last).to_string(), value);
        Ok(true)
    }

    /// Set `path` to `value`, creating parents as needed.
    pub fn set(&mut self, path: &[&str], value: Value) -> Result<(), ConfigError> {
        let (last, parents) = path.split_last().ok_or(ConfigError::EmptyKeyPath)?;
        self.ensure_object(parents)?.insert((*last).to_string(), value);
        Ok(())
    }

    /// Remove and return the value at `path`.
    pub fn remove(&mut self, path: &[&str]) -> Option<Value> {
        let (last, parents) = path.split_last()?;
        let mut current = &mut self.root;
        for key in parents {
            current = current.get_mut(*key)?.as_object_mut()?;
        }
        current.remove(*last)
    }
}

impl From<Map<String, Value>> for ConfigDocument {
    fn from(root: Map<String, Value>) -> Self {
        Self { root }
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
