//! # notepress
//!
//! Publishes a personal note vault written in Obsidian / iA Writer flavoured
//! markdown as a Hugo content tree. The vault stays the source of truth: every
//! article marked with a leading `§ ` below a publishable root is converted
//! into a Hugo page bundle, and every published document is regenerated from
//! its source on each run.
//!
//! # Architecture: One Pass Per Article
//!
//! ```text
//! vault/…/§ Name.md
//!   → frontmatter   load, validate, normalize the YAML header
//!   → breadcrumb    ancestor/descendant links from directory nesting
//!   → convert       line state machine + inline rewrites
//!       → links     wikilinks via the article index, backlinks recorded
//!   → publish       content/{section}/{slug}/index[.zh].md + media
//! ```
//!
//! A run owns a [`site::Site`]: the config, the lazily scanned article index
//! and the backlink registry. Conversions borrow it mutably one at a time, so
//! the index is scanned at most once per run and the registry collects links
//! from every article before it is written.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `notepress.toml` loading, stock defaults, merging and validation |
//! | [`naming`] | File-name conventions: `§ ` markers, translations, slugs, sections |
//! | [`vault`] | Publishable roots and the placement of directories in the content tree |
//! | [`index`] | Basename → file index, scanned once on the first miss |
//! | [`backlinks`] | Registry of inbound links, written as JSON for Hugo data |
//! | [`site`] | Run-wide state: config, index and registry |
//! | [`frontmatter`] | Article loading: printable check, YAML header, title and tag line |
//! | [`breadcrumb`] | Ancestor and descendant links from index articles |
//! | [`links`] | Wikilink parsing and resolution |
//! | [`convert`] | Body conversion: block state machine and inline rewrites |
//! | [`publish`] | Full and incremental publishing, dry-run checking |
//! | [`vectors`] | `.in.md` → `.out.md` conversion test vectors |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fail Loudly on Structure, Degrade on Links
//!
//! A missing title, an unclosed code block or an unknown callout kind aborts
//! the run with the file and the reason: publishing a half-converted article
//! is worse than publishing nothing. A wikilink that does not resolve only
//! logs a warning and renders as literal text, since notes routinely link to
//! private or unwritten pages.
//!
//! ## Hugo Does the Rendering
//!
//! The output is still markdown. Everything the vault dialect expresses that
//! plain markdown cannot (cards, galleries, callouts, cross-page references)
//! becomes a Hugo shortcode, so the theme decides how it looks and `relref`
//! makes Hugo verify every internal link at build time.

pub mod backlinks;
pub mod breadcrumb;
pub mod config;
pub mod convert;
pub mod frontmatter;
pub mod index;
pub mod links;
pub mod naming;
pub mod output;
pub mod publish;
pub mod site;
pub mod vault;
pub mod vectors;

#[cfg(test)]
pub(crate) mod test_helpers;
