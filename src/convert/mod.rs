//! Note dialect → Hugo markdown conversion.
//!
//! [`convert_article`] turns one vault article into a complete Hugo document:
//!
//! 1. Load the article and normalize its front matter ([`crate::frontmatter`]).
//! 2. Fill in breadcrumbs ([`crate::breadcrumb`]).
//! 3. Run the body through the line state machine ([`state`]), resolving
//!    wikilinks and recording backlinks on the way.
//! 4. Render front matter, body and the trailing index of descendants.
//!
//! ## Body dialect
//!
//! | Source | Output |
//! |--------|--------|
//! | `[[Note]]` | `[Note]({{< relref path="/section/slug.md" lang="en" >}})` |
//! | `![[a.png\|Caption]]` | `{{< image-card src="a.png" caption="Caption" >}}` |
//! | consecutive image blocks | `{{< gallery-card "a.png" "b.png" >}}` |
//! | `![[Part]]` | contents of `Part.md`, converted in place |
//! | `> [!info] Title` + `> ` lines | `{{< callout … >}}` … `{{< /callout >}}` |
//! | `$$ … $$` (with `katex: true`) | fenced `katex` block with `\[ … \]` |
//! | `%% … %%` | dropped |
//! | `**key**:: value` up to a blank line | dropped |
//! | `^id` line | `<a name="id"></a>` |
//! | trailing ` ^id` | footnote target with a back reference |
//! | `[Vimeo - Caption](url)` | `{{< vimeo-card … >}}` |
//! | ```` ```dataviewx ```` block | dropped |

pub mod blocks;
pub mod cursor;
pub mod inline;
pub mod patterns;
pub mod state;

use crate::breadcrumb;
use crate::config::SiteConfig;
use crate::frontmatter::{self, BREADCRUMB_DESCENDANTS, FrontMatter, FrontMatterError, TOC};
use crate::links::{LinkError, LinkResolver, SourceRef};
use crate::naming::Lang;
use crate::site::Site;
use crate::vault::Placement;
use cursor::{LineCursor, Output};
use state::{Machine, State};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Kind of block left open at the end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    FencedCode,
    Math,
    Comment,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockKind::FencedCode => "fenced code block",
            BlockKind::Math => "math block",
            BlockKind::Comment => "comment block",
        })
    }
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    FrontMatter(#[from] FrontMatterError),
    #[error("{0}")]
    Link(#[from] LinkError),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unexpected end of input: open {0}")]
    UnexpectedEof(BlockKind),
    #[error("Unknown callout type: {0}")]
    UnknownCallout(String),
    #[error("Cannot include {path}: {source}")]
    Include {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File {0} contains full domain link")]
    FullDomainLink(PathBuf),
    #[error("{path}: {source}")]
    Article {
        path: PathBuf,
        #[source]
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    /// The underlying error, without the article context.
    pub fn root(&self) -> &ConvertError {
        match self {
            ConvertError::Article { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A converted article, ready to be written.
#[derive(Debug, Clone)]
pub struct ConvertedArticle {
    pub title: String,
    pub lang: Lang,
    /// Where the article is published, if it lies in a publishable root.
    pub placement: Option<Placement>,
    pub document: String,
}

/// Convert a body with the line state machine.
///
/// `dir` is the directory content-block includes are read from. Returns the
/// raw output; callers trim trailing whitespace.
pub fn convert_body(
    body: &str,
    dir: &Path,
    katex: bool,
    links: LinkResolver<'_>,
) -> Result<String, ConvertError> {
    let mut machine = Machine {
        cursor: LineCursor::new(body.trim()),
        out: Output::new(),
        dir: dir.to_path_buf(),
        katex,
        links,
    };
    let mut state = Some(State::Normal);
    while let Some(current) = state {
        let line = machine.cursor.advance();
        state = current.step(line.as_deref(), &mut machine)?;
    }
    Ok(machine.out.into_string())
}

/// Convert one vault article into a Hugo document.
pub fn convert_article(site: &mut Site, path: &Path) -> Result<ConvertedArticle, ConvertError> {
    debug!(article = %path.display(), "converting");
    let article = frontmatter::load(path)?;
    let mut front_matter = article.front_matter;
    breadcrumb::resolve(path, &mut front_matter)?;
    let descendants = front_matter.take_string_list(BREADCRUMB_DESCENDANTS);
    if article.body.contains("%%TOC%%") {
        front_matter.insert(TOC, true);
    }

    let lang = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(Lang::En, Lang::from_file_name);
    let placement = if site.vault().is_publishable(path) {
        site.vault().place_article(path)
    } else {
        None
    };
    front_matter.set_publish_path(placement.as_ref().map(Placement::publish_path));

    let title = front_matter.title().unwrap_or_default().to_string();
    let source = front_matter.publish_path().map(|publish_path| SourceRef {
        publish_path: publish_path.to_string(),
        title: title.clone(),
    });
    let dir = path.parent().unwrap_or(Path::new("."));
    let body = convert_body(
        &article.body,
        dir,
        front_matter.katex(),
        LinkResolver::new(site, source),
    )
    .map_err(|e| ConvertError::Article {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let document = render_document(&front_matter, &body, &descendants, lang)?;
    check_full_domain(&site.config, path, &document)?;

    Ok(ConvertedArticle {
        title,
        lang,
        placement,
        document,
    })
}

/// Front matter, converted body and the index of descendant pages.
pub fn render_document(
    front_matter: &FrontMatter,
    body: &str,
    descendants: &[String],
    lang: Lang,
) -> Result<String, ConvertError> {
    let mut document = front_matter.render()?;
    document.push('\n');
    document.push_str(body.trim_end());
    document.push('\n');
    if !descendants.is_empty() {
        document.push_str(match lang {
            Lang::En => "\n## Index\n\n",
            Lang::Zh => "\n## 索引\n\n",
        });
        for link in descendants {
            document.push_str(&format!("* {{{{< rellink path=\"{link}\" >}}}}\n"));
        }
    }
    Ok(document)
}

/// Reject absolute links to the configured site domain.
fn check_full_domain(config: &SiteConfig, path: &Path, document: &str) -> Result<(), ConvertError> {
    let domain = config.forbidden_domain.as_str();
    if domain.is_empty() {
        return Ok(());
    }
    let scrubbed = config
        .allowed_domain_prefixes
        .iter()
        .fold(document.to_string(), |doc, prefix| doc.replace(prefix.as_str(), ""));
    if scrubbed.contains(domain) {
        return Err(ConvertError::FullDomainLink(path.to_path_buf()));
    }
    Ok(())
}
