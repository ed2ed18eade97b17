//! Breadcrumb navigation from directory nesting.
//!
//! A directory with its own index article (`Rust/§ Rust.md`) is a navigable
//! page. For an article in `Rust/Ownership/`, every enclosing directory that
//! has an index article is an ancestor, and every subdirectory that has one
//! is a descendant:
//!
//! ```text
//! § Tickler/Rust/§ Rust.md                       ancestor  ../rust/
//! § Tickler/Rust/Ownership/§ Ownership.md        current article
//! § Tickler/Rust/Ownership/Borrowing/§ Borrowing.md  descendant ../borrowing/
//! ```
//!
//! Translated variants look for translated index articles only.
//! Fields already present in the front matter are left untouched.

use crate::frontmatter::{BREADCRUMB_ANCESTORS, BREADCRUMB_DESCENDANTS, FrontMatter};
use crate::naming::{self, Lang};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

fn has_index_article(dir: &Path, lang: Lang) -> bool {
    dir.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| dir.join(naming::index_file_name(name, lang)).is_file())
}

fn rellink(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_str()?;
    Some(format!("../{}/", naming::slugify(name)))
}

/// Links to enclosing index articles, root first.
pub fn ancestors(article: &Path, lang: Lang) -> Vec<String> {
    let mut links = Vec::new();
    let mut dir = article.parent().and_then(Path::parent);
    while let Some(current) = dir {
        if !has_index_article(current, lang) {
            break;
        }
        if let Some(link) = rellink(current) {
            links.push(link);
        }
        dir = current.parent();
    }
    links.reverse();
    links
}

/// Links to subdirectories that have their own index article, sorted by path.
pub fn descendants(article: &Path, lang: Lang) -> std::io::Result<Vec<String>> {
    let Some(dir) = article.parent() else {
        return Ok(Vec::new());
    };
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            subdirs.push(path);
        }
    }
    subdirs.sort();
    Ok(subdirs
        .iter()
        .filter(|d| has_index_article(d, lang))
        .filter_map(|d| rellink(d))
        .collect())
}

/// Fill in missing breadcrumb fields for the article at `path`.
///
/// Empty results leave the field absent.
pub fn resolve(path: &Path, front_matter: &mut FrontMatter) -> std::io::Result<()> {
    let lang = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(Lang::from_file_name)
        .unwrap_or(Lang::En);

    if !front_matter.contains(BREADCRUMB_ANCESTORS) {
        let links = ancestors(path, lang);
        if !links.is_empty() {
            front_matter.insert(BREADCRUMB_ANCESTORS, to_sequence(links));
        }
    }
    if !front_matter.contains(BREADCRUMB_DESCENDANTS) {
        let links = descendants(path, lang)?;
        if !links.is_empty() {
            front_matter.insert(BREADCRUMB_DESCENDANTS, to_sequence(links));
        }
    }
    Ok(())
}

fn to_sequence(links: Vec<String>) -> Value {
    Value::Sequence(links.into_iter().map(Value::String).collect())
}
