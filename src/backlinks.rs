//! Backlink registry.
//!
//! Every resolved wikilink between two published articles is recorded under
//! the target's publish path. The registry lives for one run: created empty,
//! filled during conversion, written once as JSON for the Hugo templates to
//! render "referenced by" lists:
//!
//! ```json
//! {
//!   "/wiki/ownership/": [
//!     {
//!       "source_path": "/post/other-post/",
//!       "source_title": "Other Post",
//!       "target_anchor": "#borrowing",
//!       "target_anchor_title": "Borrowing"
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One reference from a source article to a target article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklinkEntry {
    pub source_path: String,
    pub source_title: String,
    pub target_anchor: String,
    pub target_anchor_title: String,
}

/// Target publish path → entries in recording order.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BacklinkRegistry {
    targets: BTreeMap<String, Vec<BacklinkEntry>>,
}

impl BacklinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry under `target`, unless an entry with the same
    /// `(source_path, target_anchor)` is already there.
    ///
    /// Returns whether the entry was added.
    pub fn record(&mut self, target: &str, entry: BacklinkEntry) -> bool {
        let entries = self.targets.entry(target.to_string()).or_default();
        let duplicate = entries.iter().any(|e| {
            e.source_path == entry.source_path && e.target_anchor == entry.target_anchor
        });
        if duplicate {
            return false;
        }
        entries.push(entry);
        true
    }

    /// Entries recorded for a target, in recording order.
    pub fn entries(&self, target: &str) -> &[BacklinkEntry] {
        self.targets.get(target).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of targets with at least one backlink.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Serialize as pretty JSON, keys sorted by target path.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the registry to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = self.to_json().map_err(std::io::Error::other)?;
        fs::write(path, json + "\n")
    }
}
