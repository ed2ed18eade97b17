//! Run-wide state shared by every conversion of one publish run.
//!
//! The article index and the backlink registry are mutable and owned here;
//! conversions borrow the site mutably, one article at a time.

use crate::backlinks::BacklinkRegistry;
use crate::config::SiteConfig;
use crate::index::{ArticleIndex, IndexError};
use crate::vault::Vault;
use std::path::PathBuf;

#[derive(Debug)]
pub struct Site {
    pub config: SiteConfig,
    vault: Vault,
    pub index: ArticleIndex,
    pub backlinks: BacklinkRegistry,
}

impl Site {
    pub fn new(config: SiteConfig) -> Self {
        let vault = Vault::from_config(&config);
        Self {
            config,
            vault,
            index: ArticleIndex::new(),
            backlinks: BacklinkRegistry::new(),
        }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Find an article by basename, building the index on the first miss.
    pub fn lookup_article(&mut self, basename: &str) -> Result<Option<PathBuf>, IndexError> {
        Ok(self
            .index
            .lookup(&self.vault, basename)?
            .map(|p| p.to_path_buf()))
    }
}
