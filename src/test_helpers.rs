//! Shared test utilities for the notepress test suite.
//!
//! Tests build small vaults in a temp directory and run the converter or the
//! publisher against them.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_file(tmp.path(), "vault/§ Blog/Posts/Hello/§ Hello.md", "# Hello\n");
//! let mut site = test_site(tmp.path());
//!
//! let doc = convert_file(&mut site, "vault/§ Blog/Posts/Hello/§ Hello.md");
//! assert!(doc.starts_with("---\ntitle: Hello\n---"));
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::convert::convert_article;
use crate::site::Site;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Config for a workspace at `root`: vault in `root/vault`, Hugo content in
/// `root/content`, `Posts` mapped to the `posts` section.
pub fn test_config(root: &Path) -> SiteConfig {
    let mut config = SiteConfig {
        source_dir: root.join("vault"),
        content_dir: root.join("content"),
        backlinks_file: root.join("data/backlinks.json"),
        ..SiteConfig::default()
    };
    config.sections.insert("Posts".into(), "posts".into());
    config
}

/// A fresh site over [`test_config`].
pub fn test_site(root: &Path) -> Site {
    Site::new(test_config(root))
}

/// Convert `root/rel` and return the rendered document. Panics on error.
pub fn convert_file(site: &mut Site, rel: &str) -> String {
    let path = site.vault().root().parent().unwrap().join(rel);
    convert_article(site, &path)
        .unwrap_or_else(|e| panic!("converting {rel} failed: {e}"))
        .document
}

/// Read `root/rel` to a string. Panics with the path on failure.
pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
}

/// Body of a rendered document: everything after the closing front matter
/// delimiter and the blank line that follows it.
pub fn body_of(document: &str) -> &str {
    let rest = document
        .strip_prefix("---\n")
        .unwrap_or_else(|| panic!("document has no front matter:\n{document}"));
    let end = rest
        .find("\n---\n")
        .unwrap_or_else(|| panic!("front matter not closed:\n{document}"));
    rest[end + 5..].trim_start_matches('\n')
}
