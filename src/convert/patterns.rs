//! Line patterns of the note dialect.
//!
//! Patterns that must match a whole line are applied to the line without its
//! terminator.

use regex::Regex;
use std::sync::LazyLock;

/// Block anchor alone on a line: `^block-id` (applied to the trimmed line).
pub static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\^[a-zA-Z0-9][-a-zA-Z0-9]*$").unwrap());

/// Block anchor ending a line: ` ^block-id`.
///
/// - `1`: block id
pub static INLINE_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\^([a-zA-Z0-9][-a-zA-Z0-9]*)$").unwrap());

/// Ordered or unordered list item marker, including the following space.
pub static LIST_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9]+\.|[-*]) ").unwrap());

/// Embed card: `[Vimeo - Caption](https://vimeo.com/123 "title")`.
///
/// - `1`: kind
/// - `2`: caption
/// - `3`: URL
/// - `4`: optional title, passed through as raw shortcode arguments
pub static EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[(\w+) - (.*)\]\((.*[^\s'"])(?:\s+["'](.*)["'])?\)"#).unwrap()
});

/// Callout opener: `> [!info]- Optional title`.
///
/// - `1`: kind
/// - `2`: fold marker, `-`, `+` or empty
/// - `3`: optional title
pub static CALLOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^> \[!([^\]]*)\]([-+]?)(?: (.*))?").unwrap());

/// Content block in wikilink form: `![[path|caption|width?query|gallery caption]]`.
///
/// - `1`: directive body
pub static CONTENT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*!\[\[(.*)\]\]$").unwrap());

/// Content block in iA Writer form: `/path/to/file.png|caption`.
///
/// Only markdown and image targets are recognized, so prose starting with a
/// slash is left alone.
///
/// - `1`: directive body without the leading slash
pub static IA_CONTENT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*/([^|\s][^|]*\.(?i:md|jpe?g|png|gif)(?:\|.*)?)$").unwrap()
});

/// Dataview backlink field: `(Backlinks:: [[A]], [[B]])`.
///
/// - `1`: field value
pub static BACKLINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(Backlinks:: (.+)\)").unwrap());

/// Wikilink: `[[basename|title#anchor]]`. The body must not start with a space.
///
/// - `1`: link body
pub static WIKILINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^ ].*?)\]\]").unwrap());

/// Image next to the article: `![alt](./file.png "title")`.
///
/// - `1`: alt text
/// - `2`: file name without the `./`
/// - `3`: optional title
pub static RELATIVE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[(.*?)\]\(\./([^)]*\.(?:jpe?g|png))(?:\s+"(.*)")?\)"#).unwrap()
});

/// Inline math span `$…$` not touching a word character, `$` or `\`.
///
/// - `1`: preceding character or empty at line start
/// - `2`: the span including both dollars
/// - `3`: following character or empty at line end
pub static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\w$\\])(\$.*?[^\\]\$)(\W|$)").unwrap());
