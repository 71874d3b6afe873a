//! Record of already-processed document contents.
//!
//! The ledger maps the hex SHA-256 of a document to when and under which
//! file name it was processed. A hash present in the ledger is never
//! processed again until the entry is removed by hand.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const LEDGER_FILE_NAME: &str = ".done.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub file: String,
    pub processed_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn get(&self, hash: &str) -> Option<&LedgerEntry> {
        self.entries.get(hash)
    }

    /// Adds `hash` unless it is already present. Returns whether it was added.
    pub fn record(&mut self, hash: impl Into<String>, entry: LedgerEntry) -> bool {
        let hash = hash.into();
        if self.entries.contains_key(&hash) {
            return false;
        }
        self.entries.insert(hash, entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where the ledger lives between runs.
pub trait LedgerStore {
    /// Never fails: an unreadable ledger is treated as empty.
    fn load(&self) -> Ledger;
    fn save(&self, ledger: &Ledger) -> Result<()>;
}

/// `.done.json` in the output directory.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(LEDGER_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self) -> Ledger {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ledger::new(),
            Err(err) => {
                log::warn!("ignoring unreadable ledger {}: {err}", self.path.display());
                return Ledger::new();
            }
        };

        match serde_json::from_str(&data) {
            Ok(ledger) => ledger,
            Err(err) => {
                log::warn!("ignoring corrupt ledger {}: {err}", self.path.display());
                Ledger::new()
            }
        }
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(ledger)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// Keeps the ledger in memory; for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    ledger: RefCell<Ledger>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: RefCell::new(ledger),
        }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Ledger {
        self.ledger.borrow().clone()
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        *self.ledger.borrow_mut() = ledger.clone();
        Ok(())
    }
}
