//! Publisher configuration module.
//!
//! Handles loading, validating, and merging `notepress.toml`. Stock defaults
//! are overridden by the user file; the file is optional and sparse.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_dir = "vault"                      # Note vault to publish
//! content_dir = "content"                   # Hugo content tree to write
//! backlinks_file = "data/backlinks.json"    # Backlink registry output
//! external_vault_url = "https://kb.iany.me/para/lets"
//! forbidden_domain = "blog.iany.me/"        # Reject absolute links to the site itself ("" disables)
//! allowed_domain_prefixes = ["blog.iany.me/uploads"]  # ...except these prefixes
//!
//! [[roots]]
//! dir = "§ Blog"                            # Section derived from the first subdirectory
//!
//! [[roots]]
//! dir = "§ Tickler"
//! section = "wiki"                          # Fixed section for the whole root
//!
//! [sections]
//! # Posts = "posts"                         # Override a derived section name
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Publisher configuration loaded from `notepress.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Root of the note vault.
    pub source_dir: PathBuf,
    /// Hugo `content/` directory receiving the page bundles.
    pub content_dir: PathBuf,
    /// Where the backlink registry JSON is written after a full run.
    pub backlinks_file: PathBuf,
    /// Base URL of the published knowledge base, used for `♯` links that
    /// don't resolve to a published article.
    pub external_vault_url: String,
    /// Absolute links to this domain are rejected in converted output. Empty
    /// disables the check.
    pub forbidden_domain: String,
    /// Prefixes of the forbidden domain that remain allowed (e.g. uploads).
    pub allowed_domain_prefixes: Vec<String>,
    /// Publishable subtrees of the vault.
    pub roots: Vec<RootConfig>,
    /// Overrides for derived section names, keyed by source directory name.
    pub sections: BTreeMap<String, String>,
}

/// A publishable subtree, identified by a directory name inside the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootConfig {
    /// Directory name, e.g. `§ Blog`.
    pub dir: String,
    /// Fixed Hugo section for every article below this root. When absent the
    /// section is derived from the first subdirectory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("vault"),
            content_dir: PathBuf::from("content"),
            backlinks_file: PathBuf::from("data/backlinks.json"),
            external_vault_url: "https://kb.iany.me/para/lets".to_string(),
            forbidden_domain: "blog.iany.me/".to_string(),
            allowed_domain_prefixes: vec!["blog.iany.me/uploads".to_string()],
            roots: vec![
                RootConfig {
                    dir: "§ Blog".to_string(),
                    section: None,
                },
                RootConfig {
                    dir: "§ Tickler".to_string(),
                    section: Some("wiki".to_string()),
                },
            ],
            sections: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::Validation(
                "roots must list at least one publishable directory".into(),
            ));
        }
        if let Some(root) = self.roots.iter().find(|r| r.dir.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "roots.dir must not be empty (section {:?})",
                root.section
            )));
        }
        if self
            .roots
            .iter()
            .filter_map(|r| r.section.as_deref())
            .chain(self.sections.values().map(String::as_str))
            .any(|s| s.is_empty() || s.contains('/'))
        {
            return Err(ConfigError::Validation(
                "section names must be non-empty and must not contain '/'".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so a user
///   `[[roots]]` list replaces the stock roots.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file path.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `notepress.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# notepress configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# source_dir and content_dir can also be set with --source/--content or the
# KB_SRC_DIR/KB_CONTENT_DIR environment variables.

# Root of the note vault.
source_dir = "vault"

# Hugo content directory. Each article becomes a page bundle
# content/<section>/<slug>/index.md (index.zh.md for Chinese variants).
content_dir = "content"

# Backlink registry written at the end of every full publish run.
backlinks_file = "data/backlinks.json"

# Base URL of the knowledge base. Links to unpublished "♯ " notes point here.
external_vault_url = "https://kb.iany.me/para/lets"

# Fail the run when converted output links to the site's own domain.
# Set to "" to disable the check.
forbidden_domain = "blog.iany.me/"

# Prefixes of the forbidden domain that are still allowed.
allowed_domain_prefixes = ["blog.iany.me/uploads"]

# ---------------------------------------------------------------------------
# Publishable roots
# ---------------------------------------------------------------------------
# Only "§ " articles below one of these directories are published.
# Without a fixed section, the section is the singular slug of the first
# subdirectory: "§ Blog/Posts/..." -> "post".
[[roots]]
dir = "§ Blog"

[[roots]]
dir = "§ Tickler"
section = "wiki"

# ---------------------------------------------------------------------------
# Section overrides
# ---------------------------------------------------------------------------
# Map a first-level directory name to an explicit section.
[sections]
# Posts = "posts"
"##
}
