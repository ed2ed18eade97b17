//! Article index: wikilink basename → source file.
//!
//! Only pages that get published are indexed: the `§ ` articles themselves
//! and the plain notes sitting next to one. A link to any other note degrades
//! to literal text instead of pointing at a page Hugo never sees.
//!
//! The index starts empty. The first lookup that misses triggers one full
//! scan of the vault, after which the index is never rescanned: files added
//! during a run are not seen by that run.

use crate::vault::Vault;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("cannot scan vault {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug, Default)]
pub struct ArticleIndex {
    entries: HashMap<String, PathBuf>,
    scanned: bool,
}

impl ArticleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an article by basename (file stem), scanning the vault on the
    /// first miss.
    pub fn lookup(&mut self, vault: &Vault, basename: &str) -> Result<Option<&Path>, IndexError> {
        if !self.entries.contains_key(basename) && !self.scanned {
            self.scan(vault)?;
        }
        Ok(self.entries.get(basename).map(PathBuf::as_path))
    }

    /// Register an article without scanning.
    pub fn insert(&mut self, basename: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(basename.into(), path.into());
    }

    /// Whether the full scan has already happened.
    pub fn is_scanned(&self) -> bool {
        self.scanned
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk the whole vault once, indexing every markdown file in a directory
    /// that holds a publishable article. Later files win on basename collisions.
    fn scan(&mut self, vault: &Vault) -> Result<(), IndexError> {
        self.scanned = true;
        if !vault.root().exists() {
            debug!(root = %vault.root().display(), "vault root missing, index stays empty");
            return Ok(());
        }

        let mut bundles = HashSet::new();
        let mut notes = Vec::new();
        for entry in WalkDir::new(vault.root()).sort_by_file_name() {
            let entry = entry.map_err(|source| IndexError::Walk {
                root: vault.root().to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || !vault.is_markdown_in_root(path) {
                continue;
            }
            if vault.is_publishable(path)
                && let Some(dir) = path.parent()
            {
                bundles.insert(dir.to_path_buf());
            }
            notes.push(entry.into_path());
        }

        for path in notes {
            if !path.parent().is_some_and(|dir| bundles.contains(dir)) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let stem = stem.to_string();
            if let Some(previous) = self.entries.insert(stem.clone(), path) {
                debug!(
                    basename = stem,
                    previous = %previous.display(),
                    "duplicate article basename"
                );
            }
        }
        debug!(articles = self.entries.len(), "article index built");
        Ok(())
    }
}
