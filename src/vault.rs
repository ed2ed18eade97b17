//! Placement of vault directories in the Hugo content tree.
//!
//! A directory below a publishable root maps to one Hugo page bundle:
//!
//! ```text
//! vault/§ Blog/Posts/2023 - Other Post/§ Other Post.md
//!       ^^^^^^ ^^^^^ ^^^^^^^^^^^^^^^^^
//!       root   |     slug: other-post (date prefix dropped)
//!              section: post (singular slug, or [sections] override)
//!
//! vault/§ Tickler/Rust/Ownership/§ Ownership.md
//!       ^^^^^^^^^               section: wiki (fixed by the root)
//! ```
//!
//! The publish path `/{section}/{slug}/` is the page's URL path and keys the
//! backlink registry.

use crate::config::{RootConfig, SiteConfig};
use crate::naming::{self, INDEX_MARKER};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// The vault layout: its location and which subtrees are published.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    roots: Vec<RootConfig>,
    sections: BTreeMap<String, String>,
}

/// Where a vault directory lands in the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Hugo section (first URL segment).
    pub section: String,
    /// Directory name with the date prefix removed; variants must be named after it.
    pub basename: String,
    /// URL-safe form of `basename`.
    pub slug: String,
}

impl Placement {
    /// The page's URL path, `/{section}/{slug}/`.
    pub fn publish_path(&self) -> String {
        format!("/{}/{}/", self.section, self.slug)
    }

    /// Path of the page for a Hugo `relref`, `/{section}/{slug}.md`.
    pub fn relref_path(&self) -> String {
        format!("/{}/{}.md", self.section, self.slug)
    }

    /// The page bundle directory below the content root.
    pub fn bundle_dir(&self, content_dir: &Path) -> PathBuf {
        content_dir.join(&self.section).join(&self.slug)
    }
}

impl Vault {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            root: config.source_dir.clone(),
            roots: config.roots.clone(),
            sections: config.sections.clone(),
        }
    }

    /// Root directory of the vault.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The publishable root containing `path` and the components below it.
    fn split_root<'p>(&self, path: &'p Path) -> Option<(&RootConfig, Vec<&'p str>)> {
        let components: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        components.iter().enumerate().find_map(|(i, name)| {
            self.roots
                .iter()
                .find(|r| r.dir == *name)
                .map(|root| (root, components[i + 1..].to_vec()))
        })
    }

    /// Whether `path` lies below one of the publishable roots.
    pub fn in_publishable_root(&self, path: &Path) -> bool {
        self.split_root(path)
            .is_some_and(|(_, rest)| !rest.is_empty())
    }

    /// Whether `path` is a markdown file below a publishable root.
    pub fn is_markdown_in_root(&self, path: &Path) -> bool {
        path.extension().is_some_and(|e| e == "md") && self.in_publishable_root(path)
    }

    /// Only `§ ` markdown files in a directory below a publishable root are
    /// published. The root's own index article has no page.
    pub fn is_publishable(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(INDEX_MARKER))
            && self.is_markdown_in_root(path)
            && self.split_root(path).is_some_and(|(_, rest)| rest.len() >= 2)
    }

    /// Place a directory (an article's parent) in the content tree.
    ///
    /// Returns `None` when the directory is not strictly below a publishable root.
    pub fn place_dir(&self, dir: &Path) -> Option<Placement> {
        let (root, rest) = self.split_root(dir)?;
        let first = rest.first()?;
        let last = rest.last()?;

        let section = match &root.section {
            Some(section) => section.clone(),
            None => self
                .sections
                .get(*first)
                .cloned()
                .unwrap_or_else(|| naming::slugify(&naming::singularize(first))),
        };
        let basename = naming::strip_date_prefix(last).to_string();
        let slug = naming::slugify(&basename);

        Some(Placement {
            section,
            basename,
            slug,
        })
    }

    /// Place an article file by its parent directory.
    pub fn place_article(&self, path: &Path) -> Option<Placement> {
        self.place_dir(path.parent()?)
    }
}
