//! Key-value persistence
//!
//! The game persists a single integer (the max score), so the storage
//! interface is a tiny integer key-value store. Failures are reported to the
//! caller, which decides on the fallback.
//!
//! Implementations:
//! - `MemoryStore`: in-process map, shared between clones
//! - `JsonFileStore`: JSON object on disk, written via tmp file + rename

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;

/// Integer key-value storage
pub trait KeyValueStore {
    /// Stored value for `key`, or `default` if the key was never set
    fn get(&self, key: &str, default: i64) -> anyhow::Result<i64>;
    /// Store `value` under `key`
    fn set(&mut self, key: &str, value: i64) -> anyhow::Result<()>;
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, i64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str, default: i64) -> anyhow::Result<i64> {
        Ok(self.values.borrow().get(key).copied().unwrap_or(default))
    }

    fn set(&mut self, key: &str, value: i64) -> anyhow::Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a JSON object file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> anyhow::Result<BTreeMap<String, i64>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn write_all(&self, values: &BTreeMap<String, i64>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str, default: i64) -> anyhow::Result<i64> {
        Ok(self.read_all()?.get(key).copied().unwrap_or(default))
    }

    fn set(&mut self, key: &str, value: i64) -> anyhow::Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        self.write_all(&values)
    }
}
