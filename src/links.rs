//! Wikilink resolution.
//!
//! A wikilink body has the form `basename[|display title][#anchor]` where the
//! anchor is either a heading (`#Some Heading`, slugified) or a block id
//! (`#^block-id`, kept verbatim). Resolution outcomes:
//!
//! | Reference | Output |
//! |-----------|--------|
//! | `#^ref-1` | `<sup id="fnxref:1">[1](#fnx:1)</sup> ` |
//! | `#Heading` | `[Heading](#heading)` |
//! | indexed article | `[title]({{< relref path="/section/slug.md" lang="en" >}}#anchor)` |
//! | unindexed `♯ Note` | `[♯ Note](https://…/n/Note/%E2%99%AF+Note)` |
//! | anything else | `[basename]` or `[title][basename]` |
//!
//! Every resolved link made from a published article is recorded in the
//! site's backlink registry.

use crate::backlinks::BacklinkEntry;
use crate::index::IndexError;
use crate::naming::{self, EXTERNAL_MARKER, INDEX_MARKER, Lang, TRANSLATION_SUFFIX};
use crate::site::Site;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;
use url::form_urlencoded;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    #[error("Link target is outside the publishable roots: {0}")]
    NotPublishable(PathBuf),
}

/// A parsed wikilink body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub basename: String,
    pub title: String,
    /// `#anchor` including the hash, or empty.
    pub anchor: String,
}

/// Split a wikilink body into basename, display title and anchor.
pub fn parse_reference(raw: &str) -> Reference {
    let mut title = match raw.strip_prefix(INDEX_MARKER) {
        Some(rest) => format!("{EXTERNAL_MARKER}{rest}"),
        None => raw.to_string(),
    };
    let mut basename = raw;
    if let Some((name, display)) = raw.split_once('|') {
        basename = name;
        title = display.to_string();
    }

    let mut anchor = String::new();
    if let Some((name, block)) = basename.split_once("#^") {
        basename = name;
        anchor = format!("#{block}");
    }
    if let Some((name, heading)) = basename.split_once('#') {
        basename = name;
        anchor = format!("#{}", naming::slugify(heading));
    }

    Reference {
        basename: basename.to_string(),
        title,
        anchor,
    }
}

/// The article a conversion runs for, when it is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub publish_path: String,
    pub title: String,
}

/// Resolves wikilinks for one article against the site's index.
pub struct LinkResolver<'a> {
    site: &'a mut Site,
    source: Option<SourceRef>,
}

impl<'a> LinkResolver<'a> {
    pub fn new(site: &'a mut Site, source: Option<SourceRef>) -> Self {
        Self { site, source }
    }

    /// Render the markdown for one wikilink body.
    pub fn resolve(&mut self, raw: &str) -> Result<String, LinkError> {
        let reference = parse_reference(raw);
        if reference.basename.is_empty() {
            return Ok(local_link(&reference));
        }

        let Some(path) = self.site.lookup_article(&reference.basename)? else {
            return Ok(self.unresolved(&reference));
        };
        let placement = self
            .site
            .vault()
            .place_article(&path)
            .ok_or_else(|| LinkError::NotPublishable(path.clone()))?;

        let Reference {
            basename,
            title,
            mut anchor,
        } = reference;

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if anchor.is_empty() && !naming::is_index_article(file_name) {
            let stem = file_name.strip_suffix(".md").unwrap_or(file_name);
            let stem = stem
                .strip_suffix(TRANSLATION_SUFFIX.trim_start())
                .unwrap_or(stem);
            anchor = format!("#{}", naming::slugify(stem));
        }
        let lang = Lang::from_stem(&basename);

        if let Some(source) = &self.source {
            self.site.backlinks.record(
                &placement.publish_path(),
                BacklinkEntry {
                    source_path: source.publish_path.clone(),
                    source_title: source.title.clone(),
                    target_anchor: anchor.clone(),
                    target_anchor_title: title.clone(),
                },
            );
        }

        Ok(format!(
            "[{title}]({{{{< relref path=\"{}\" lang=\"{}\" >}}}}{anchor})",
            placement.relref_path(),
            lang.as_str()
        ))
    }

    fn unresolved(&self, reference: &Reference) -> String {
        let Reference {
            basename, title, ..
        } = reference;
        if let Some(name) = basename.strip_prefix(EXTERNAL_MARKER) {
            let url = external_vault_link(&self.site.config.external_vault_url, name, basename);
            return format!("[{title}]({url})");
        }
        warn!(basename = %basename, "unresolved wikilink");
        if basename == title {
            format!("[{basename}]")
        } else {
            format!("[{title}][{basename}]")
        }
    }
}

/// Links inside the current document.
fn local_link(reference: &Reference) -> String {
    let title = &reference.title;
    if let Some(id) = title.strip_prefix("#^") {
        let id = id.strip_prefix("ref-").unwrap_or(id);
        return format!("<sup id=\"fnxref:{id}\">[{id}](#fnx:{id})</sup> ");
    }
    let title = title.strip_prefix('#').unwrap_or(title);
    format!("[{title}]({})", reference.anchor)
}

/// Deep link into the published knowledge base, bucketed by first letter:
/// `{base}/f/Final+Cut+Pro/%E2%99%AF+Final+Cut+Pro`.
pub fn external_vault_link(base: &str, name: &str, basename: &str) -> String {
    let bucket = name
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase())
        .filter(char::is_ascii_lowercase)
        .map_or_else(|| "_".to_string(), String::from);
    format!(
        "{}/{bucket}/{}/{}",
        base.trim_end_matches('/'),
        quote_plus(name),
        quote_plus(basename)
    )
}

/// Form-encode like the knowledge base expects: spaces as `+`, with `~` kept
/// and `*` escaped, which `form_urlencoded` treats the other way round.
fn quote_plus(s: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(s.as_bytes()).collect();
    encoded.replace('*', "%2A").replace("%7E", "~")
}
