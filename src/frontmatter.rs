//! Article loading and front matter normalization.
//!
//! A source article looks like:
//!
//! ```text
//! ---
//! katex: true
//! aliases: [Old Name]
//! ---
//! # Title
//! #tag #other-tag
//!
//! Body...
//! ```
//!
//! The front matter block is optional. The `# ` heading is required and is
//! removed from the body; it becomes `title` unless the front matter sets one.
//! A `#tag` line right after the heading replaces `tags`.
//!
//! Field rewrites applied on load:
//!
//! | Source key | Written as |
//! |------------|------------|
//! | `aliases` | `obsidian_aliases` |
//! | `hugo_aliases` | `aliases` |
//! | `banner: "![[x.jpg]]"` | `banner: x.jpg` |
//!
//! Keys are rendered sorted, so the YAML output is deterministic.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use unicode_general_category::{GeneralCategory, get_general_category};

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File {path} contains nonprintable char at {offset}: {ch:?}({context:?})")]
    NonPrintable {
        path: PathBuf,
        offset: usize,
        ch: char,
        context: String,
    },
    #[error("Invalid file content: {0} (front matter is not closed)")]
    Unterminated(PathBuf),
    #[error("Invalid front matter in {0}: {1}")]
    Yaml(PathBuf, serde_yaml::Error),
    #[error("Invalid front matter in {0}: expected a mapping")]
    NotAMapping(PathBuf),
    #[error("{0} does not have a title")]
    MissingTitle(PathBuf),
}

/// A loaded source article: front matter plus the body after the title and
/// tag lines.
#[derive(Debug, Clone)]
pub struct Article {
    pub path: PathBuf,
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Ordered front matter fields plus values computed for the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: BTreeMap<String, Value>,
    publish_path: Option<String>,
}

pub const TITLE: &str = "title";
pub const TAGS: &str = "tags";
pub const KATEX: &str = "katex";
pub const TOC: &str = "toc";
pub const BREADCRUMB_ANCESTORS: &str = "breadcrumbAncestors";
pub const BREADCRUMB_DESCENDANTS: &str = "breadcrumbDescendants";

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a YAML mapping. Non-string keys are stringified.
    pub fn from_mapping(mapping: Mapping) -> Self {
        let fields = mapping
            .into_iter()
            .map(|(k, v)| (key_string(k), v))
            .collect();
        Self {
            fields,
            publish_path: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Move a field to a new key, overwriting any existing value there.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.fields.remove(from) {
            self.fields.insert(to.to_string(), value);
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.get(TITLE).and_then(Value::as_str)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.string_list(TAGS)
    }

    /// Whether math rendering is enabled. Any truthy value counts.
    pub fn katex(&self) -> bool {
        self.get(KATEX).is_some_and(is_truthy)
    }

    /// Elements of a sequence field that are strings.
    pub fn string_list(&self, key: &str) -> Vec<&str> {
        match self.get(key) {
            Some(Value::Sequence(seq)) => seq.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Remove a sequence field, returning its string elements.
    pub fn take_string_list(&mut self, key: &str) -> Vec<String> {
        match self.remove(key) {
            Some(Value::Sequence(seq)) => seq
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Target site path of the article, if it is published.
    pub fn publish_path(&self) -> Option<&str> {
        self.publish_path.as_deref()
    }

    pub fn set_publish_path(&mut self, path: Option<String>) {
        self.publish_path = path;
    }

    /// The fields as YAML, keys sorted. `publish_path` is not rendered.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.fields)
    }

    /// The full front matter block, delimiters included.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        Ok(format!("---\n{}\n---\n", self.to_yaml()?.trim()))
    }
}

fn key_string(key: Value) -> String {
    match key {
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Read an article from disk, reject invisible characters, and parse it.
pub fn load(path: &Path) -> Result<Article, FrontMatterError> {
    let raw = fs::read_to_string(path)?;
    check_printable(path, &raw)?;
    parse(path, &raw)
}

/// Characters that never belong in an article: everything outside the
/// printable set except line breaks and tabs. Non-printable means controls,
/// format characters (bidi overrides, zero-width marks), surrogates, private
/// use, unassigned code points and every separator but the plain space.
fn is_disallowed(c: char) -> bool {
    if matches!(c, '\n' | '\r' | '\t' | ' ') {
        return false;
    }
    matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}

/// Fail on the first disallowed character, reporting its byte offset and the
/// text around it.
pub fn check_printable(path: &Path, raw: &str) -> Result<(), FrontMatterError> {
    let Some((offset, ch)) = raw.char_indices().find(|(_, c)| is_disallowed(*c)) else {
        return Ok(());
    };
    let chars_before = raw[..offset].chars().count();
    let context: String = raw
        .chars()
        .skip(chars_before.saturating_sub(10))
        .take(20)
        .collect();
    Err(FrontMatterError::NonPrintable {
        path: path.to_path_buf(),
        offset,
        ch,
        context,
    })
}

/// Split `---` front matter from the rest. Returns `(yaml, rest)`.
fn split_front_matter<'a>(
    path: &Path,
    raw: &'a str,
) -> Result<Option<(&'a str, &'a str)>, FrontMatterError> {
    let Some(rest) = raw.strip_prefix("---\n") else {
        return Ok(None);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Ok(Some((&rest[..offset], &rest[offset + line.len()..])));
        }
        offset += line.len();
    }
    Err(FrontMatterError::Unterminated(path.to_path_buf()))
}

fn parse_mapping(path: &Path, yaml: &str) -> Result<Mapping, FrontMatterError> {
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontMatterError::Yaml(path.to_path_buf(), e))?;
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(FrontMatterError::NotAMapping(path.to_path_buf())),
    }
}

/// Split off the first line of `text`, returning it and the trimmed rest.
fn split_first_line(text: &str) -> (&str, &str) {
    match text.split_once('\n') {
        Some((first, rest)) => (first, rest.trim()),
        None => (text, ""),
    }
}

/// Parse article text into normalized front matter and body.
pub fn parse(path: &Path, raw: &str) -> Result<Article, FrontMatterError> {
    let (mut front_matter, body) = match split_front_matter(path, raw)? {
        Some((yaml, rest)) => (
            FrontMatter::from_mapping(parse_mapping(path, yaml)?),
            rest.trim(),
        ),
        None => (FrontMatter::new(), raw),
    };

    if !body.starts_with("# ") {
        return Err(FrontMatterError::MissingTitle(path.to_path_buf()));
    }
    let (title_line, mut body) = split_first_line(body);

    if !front_matter.contains(TITLE) {
        front_matter.insert(TITLE, title_line[2..].trim());
    }

    front_matter.rename("aliases", "obsidian_aliases");
    front_matter.rename("hugo_aliases", "aliases");
    if let Some(Value::String(banner)) = front_matter.get("banner")
        && let Some(inner) = banner.strip_prefix("![[")
    {
        let unwrapped = inner.strip_suffix("]]").unwrap_or(inner).to_string();
        front_matter.insert("banner", unwrapped);
    }

    if starts_with_tag(body) {
        let (tag_line, rest) = split_first_line(body);
        body = rest;
        front_matter.insert(TAGS, parse_tags(tag_line));
    }

    Ok(Article {
        path: path.to_path_buf(),
        front_matter,
        body: body.to_string(),
    })
}

/// `#` immediately followed by an ASCII letter.
fn starts_with_tag(body: &str) -> bool {
    let mut chars = body.chars();
    chars.next() == Some('#') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Tags of a `#tag #other` line.
///
/// Anything from the first ` [[` on is dropped, so a wikilink on the tag line
/// is lost. Kept as is: existing articles depend on it.
fn parse_tags(line: &str) -> Vec<Value> {
    let line = line.trim();
    let line = line.strip_prefix('#').unwrap_or(line);
    let line = line.split(" [[").next().unwrap_or(line);
    line.split(" #").map(|t| Value::String(t.to_string())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use tempfile::TempDir;

    fn parse_str(raw: &str) -> Result<Article, FrontMatterError> {
        parse(Path::new("note.md"), raw)
    }

    #[test]
    fn title_and_tags_from_body() {
        let article = parse_str("# Hello\n#draft #blog\n\nSee [[Other Post]].\n").unwrap();
        assert_eq!(article.front_matter.title(), Some("Hello"));
        assert_eq!(article.front_matter.tags(), vec!["draft", "blog"]);
        assert_eq!(article.body, "See [[Other Post]].");
    }

    #[test]
    fn front_matter_title_wins() {
        let article = parse_str("---\ntitle: Custom\n---\n# Heading\n\nBody\n").unwrap();
        assert_eq!(article.front_matter.title(), Some("Custom"));
        assert_eq!(article.body, "Body");
    }

    #[test]
    fn title_only_article_has_empty_body() {
        let article = parse_str("# Only Title").unwrap();
        assert_eq!(article.front_matter.title(), Some("Only Title"));
        assert_eq!(article.body, "");
    }

    #[test]
    fn missing_title_is_fatal() {
        let err = parse_str("No heading here\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::MissingTitle(_)));
        assert_eq!(err.to_string(), "note.md does not have a title");
    }

    #[test]
    fn level_two_heading_is_not_a_title() {
        assert!(matches!(
            parse_str("## Section\n"),
            Err(FrontMatterError::MissingTitle(_))
        ));
    }

    #[test]
    fn unterminated_front_matter_is_fatal() {
        assert!(matches!(
            parse_str("---\ntitle: x\n# Heading\n"),
            Err(FrontMatterError::Unterminated(_))
        ));
    }

    #[test]
    fn scalar_front_matter_is_fatal() {
        assert!(matches!(
            parse_str("---\njust a string\n---\n# T\n"),
            Err(FrontMatterError::NotAMapping(_))
        ));
    }

    #[test]
    fn empty_front_matter_block() {
        let article = parse_str("---\n---\n# T\n").unwrap();
        assert_eq!(article.front_matter.title(), Some("T"));
    }

    #[test]
    fn tag_line_drops_trailing_wikilink() {
        let article = parse_str("# T\n#rust #notes [[Other]]\nbody\n").unwrap();
        assert_eq!(article.front_matter.tags(), vec!["rust", "notes"]);
        assert_eq!(article.body, "body");
    }

    #[test]
    fn heading_like_line_is_not_tags() {
        let article = parse_str("# T\n## Section\n").unwrap();
        assert!(!article.front_matter.contains(TAGS));
        assert_eq!(article.body, "## Section");
    }

    #[test]
    fn alias_rewrites() {
        let article =
            parse_str("---\naliases: [Old]\nhugo_aliases: [/old/]\n---\n# T\n").unwrap();
        let fm = &article.front_matter;
        assert_eq!(fm.string_list("obsidian_aliases"), vec!["Old"]);
        assert_eq!(fm.string_list("aliases"), vec!["/old/"]);
        assert!(!fm.contains("hugo_aliases"));
    }

    #[test]
    fn banner_embed_is_unwrapped() {
        let article = parse_str("---\nbanner: \"![[cover.jpg]]\"\n---\n# T\n").unwrap();
        assert_eq!(
            article.front_matter.get("banner").and_then(Value::as_str),
            Some("cover.jpg")
        );
    }

    #[test]
    fn katex_flag() {
        assert!(parse_str("---\nkatex: true\n---\n# T\n").unwrap().front_matter.katex());
        assert!(!parse_str("---\nkatex: false\n---\n# T\n").unwrap().front_matter.katex());
        assert!(!parse_str("# T\n").unwrap().front_matter.katex());
    }

    #[test]
    fn render_sorts_keys_and_skips_publish_path() {
        let mut fm = FrontMatter::new();
        fm.insert(TITLE, "Hello");
        fm.insert(
            TAGS,
            vec![Value::from("draft"), Value::from("blog")],
        );
        fm.insert("author", "Ian");
        fm.set_publish_path(Some("/post/hello/".into()));
        assert_eq!(
            fm.render().unwrap(),
            "---\nauthor: Ian\ntags:\n- draft\n- blog\ntitle: Hello\n---\n"
        );
    }

    #[test]
    fn nonprintable_reports_offset_and_context() {
        let raw = "# Title\nsome\u{200B}text\n";
        let err = check_printable(Path::new("a.md"), raw).unwrap_err();
        match err {
            FrontMatterError::NonPrintable {
                offset, ch, context, ..
            } => {
                assert_eq!(offset, 12);
                assert_eq!(ch, '\u{200B}');
                assert!(context.contains("some"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn tabs_and_cjk_are_printable() {
        assert!(check_printable(Path::new("a.md"), "# 标题\n\tindent\r\n| a | b |\n").is_ok());
    }

    #[test]
    fn bidi_override_is_rejected() {
        let err = check_printable(Path::new("a.md"), "# T\nabc\u{202E}def\n").unwrap_err();
        assert!(matches!(
            err,
            FrontMatterError::NonPrintable { offset: 7, ch: '\u{202E}', .. }
        ));
    }

    #[test]
    fn unusual_spaces_are_rejected() {
        for c in ['\u{00A0}', '\u{3000}', '\u{2028}', '\u{2066}', '\u{E000}'] {
            let raw = format!("# T\nx{c}y\n");
            assert!(
                check_printable(Path::new("a.md"), &raw).is_err(),
                "{c:?} should be rejected"
            );
        }
    }

    #[test]
    fn load_reads_and_checks_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "bad.md", "# T\nbell\u{7}\n");
        assert!(matches!(
            load(&path),
            Err(FrontMatterError::NonPrintable { .. })
        ));

        let path = write_file(tmp.path(), "good.md", "# T\nfine\n");
        assert_eq!(load(&path).unwrap().body, "fine");
    }
}
