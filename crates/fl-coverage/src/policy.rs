//! Pretrained state/action value tables.
//!
//! # Artifact format
//!
//! One JSON document per geographic subdivision, stored as
//! `q_table_<subdivision>.json` in the policy directory:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "subdivision": "gangnam",
//!   "entries": [
//!     {"state_node": 1001, "state_unplowed": "f", "action": 1002, "value": 3.5}
//!   ]
//! }
//! ```
//!
//! A state is the current node's external id plus the uncovered-edge set
//! as a hex integer (see [`crate::bitset`]); an action is the candidate
//! node's external id.  Pairs absent from the table are worth `0.0`.
//! Tables are loaded once and never modified.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::bitset::{hex_to_words, words_to_hex};
use crate::{CoverageError, CoverageResult};

/// Artifact version this build reads and writes.
pub const POLICY_FORMAT_VERSION: u32 = 1;

// ── Artifact ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyArtifact {
    pub format_version: u32,
    pub subdivision:    String,
    #[serde(default)]
    pub entries:        Vec<PolicyEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub state_node:     u64,
    pub state_unplowed: String,
    pub action:         u64,
    pub value:          f64,
}

// ── PolicyTable ───────────────────────────────────────────────────────────────

/// action ext id → value
type ActionValues = FxHashMap<u64, f64>;

/// Read-only `(state, action) → value` lookup.
///
/// Nested by current node, then uncovered set, then action, so a lookup
/// borrows the live bitset's words instead of building an owned key.
#[derive(Clone, Debug, Default)]
pub struct PolicyTable {
    subdivision: String,
    values:      FxHashMap<u64, FxHashMap<Vec<u64>, ActionValues>>,
    len:         usize,
}

impl PolicyTable {
    /// A table with no entries; every lookup yields `0.0`.
    pub fn empty(subdivision: impl Into<String>) -> Self {
        Self { subdivision: subdivision.into(), ..Self::default() }
    }

    pub fn subdivision(&self) -> &str {
        &self.subdivision
    }

    /// Number of `(state, action)` entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value of taking `action` from state `(node, unplowed)`.
    ///
    /// `unplowed` must be in trimmed form
    /// ([`EdgeBitset::trimmed_words`](crate::EdgeBitset::trimmed_words)).
    pub fn get(&self, node: u64, unplowed: &[u64], action: u64) -> f64 {
        self.values
            .get(&node)
            .and_then(|by_set| by_set.get(unplowed))
            .and_then(|actions| actions.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Add or replace one entry.  Used when assembling tables offline.
    pub fn insert(&mut self, node: u64, unplowed: &[u64], action: u64, value: f64) {
        let end = unplowed.iter().rposition(|&w| w != 0).map_or(0, |i| i + 1);
        let previous = self
            .values
            .entry(node)
            .or_default()
            .entry(unplowed[..end].to_vec())
            .or_default()
            .insert(action, value);
        if previous.is_none() {
            self.len += 1;
        }
    }

    /// Build from a decoded artifact, checking its version.
    pub fn from_artifact(artifact: PolicyArtifact) -> CoverageResult<Self> {
        if artifact.format_version != POLICY_FORMAT_VERSION {
            return Err(CoverageError::PolicyFormat(format!(
                "unsupported policy format version {} (expected {POLICY_FORMAT_VERSION})",
                artifact.format_version
            )));
        }
        let mut table = PolicyTable::empty(artifact.subdivision);
        for e in artifact.entries {
            let words = hex_to_words(&e.state_unplowed)?;
            table.insert(e.state_node, &words, e.action, e.value);
        }
        Ok(table)
    }

    /// Flatten into the portable artifact form.  Entry order is unspecified.
    pub fn to_artifact(&self) -> PolicyArtifact {
        let mut entries = Vec::with_capacity(self.len);
        for (&node, by_set) in &self.values {
            for (words, actions) in by_set {
                let hex = words_to_hex(words);
                for (&action, &value) in actions {
                    entries.push(PolicyEntry {
                        state_node: node,
                        state_unplowed: hex.clone(),
                        action,
                        value,
                    });
                }
            }
        }
        PolicyArtifact {
            format_version: POLICY_FORMAT_VERSION,
            subdivision:    self.subdivision.clone(),
            entries,
        }
    }

    /// Decode an artifact from any `Read` source.
    pub fn load_reader<R: Read>(reader: R) -> CoverageResult<Self> {
        let artifact: PolicyArtifact = serde_json::from_reader(reader)
            .map_err(|e| CoverageError::PolicyFormat(e.to_string()))?;
        Self::from_artifact(artifact)
    }

    pub fn load_path(path: &Path) -> CoverageResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::load_reader(std::io::BufReader::new(file))
    }
}

// ── PolicyStore ───────────────────────────────────────────────────────────────

/// Per-subdivision policy tables, loaded lazily from a directory and kept
/// for the life of the store.
///
/// Safe to share between threads: lookups take a read lock, and the write
/// lock is only held to insert a freshly loaded table.
pub struct PolicyStore {
    dir:   PathBuf,
    cache: RwLock<HashMap<String, Arc<PolicyTable>>>,
}

impl PolicyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), cache: RwLock::new(HashMap::new()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact path for `subdivision`.
    pub fn path_for(&self, subdivision: &str) -> PathBuf {
        self.dir.join(format!("q_table_{subdivision}.json"))
    }

    /// Register an already-built table under its subdivision name.
    pub fn insert(&self, table: PolicyTable) -> Arc<PolicyTable> {
        let table = Arc::new(table);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.subdivision().to_owned(), Arc::clone(&table));
        table
    }

    /// `true` if a table for `subdivision` is already loaded.
    pub fn is_loaded(&self, subdivision: &str) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(subdivision)
    }

    /// The table for `subdivision`, loading it on first use.
    ///
    /// A missing artifact is [`CoverageError::ModelUnavailable`].
    pub fn get(&self, subdivision: &str) -> CoverageResult<Arc<PolicyTable>> {
        validate_subdivision(subdivision)?;

        if let Some(t) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subdivision)
        {
            return Ok(Arc::clone(t));
        }

        let path = self.path_for(subdivision);
        if !path.is_file() {
            log::warn!("no policy model for {subdivision:?} at {}", path.display());
            return Err(CoverageError::ModelUnavailable {
                subdivision: Some(subdivision.to_owned()),
            });
        }

        let mut table = PolicyTable::load_path(&path)?;
        if table.subdivision() != subdivision {
            log::warn!(
                "policy artifact {} names subdivision {:?}; registering it as {subdivision:?}",
                path.display(),
                table.subdivision()
            );
            table.subdivision = subdivision.to_owned();
        }
        log::info!("loaded policy for {subdivision:?}: {} entries", table.len());

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another request may have loaded it while we were reading the file.
        let entry = cache
            .entry(subdivision.to_owned())
            .or_insert_with(|| Arc::new(table));
        Ok(Arc::clone(entry))
    }
}

/// Subdivision names become file names; keep them to a single path
/// component.
fn validate_subdivision(name: &str) -> CoverageResult<()> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if ok {
        Ok(())
    } else {
        Err(CoverageError::InvalidSubdivision(name.to_owned()))
    }
}
