//! Inline rewriting of a single body line.
//!
//! Rewrites run in a fixed order. Links and images come before inline math so
//! a `$` inside link text is never wrapped.

use super::cursor::content_of;
use super::patterns::{
    BACKLINK, INLINE_ANCHOR, INLINE_MATH, LIST_PREFIX, RELATIVE_IMAGE, WIKILINK,
};
use crate::links::{LinkError, LinkResolver};
use regex::Captures;

/// Convert one line, keeping its terminator.
pub fn convert_line(
    line: &str,
    katex: bool,
    links: &mut LinkResolver<'_>,
) -> Result<String, LinkError> {
    let line = BACKLINK.replace_all(line, "➫ $1");
    let line = replace_wikilinks(&line, links)?;
    let line = RELATIVE_IMAGE
        .replace_all(&line, |caps: &Captures<'_>| {
            format!(
                "{{{{< img src=\"{}\" alt=\"{}\" title=\"{}\" >}}}}",
                &caps[2],
                &caps[1],
                caps.get(3).map_or("", |m| m.as_str())
            )
        })
        .into_owned();
    let line = rewrite_inline_anchor(&line);
    if katex {
        Ok(INLINE_MATH.replace_all(&line, "${1}`${2}`${3}").into_owned())
    } else {
        Ok(line)
    }
}

fn replace_wikilinks(line: &str, links: &mut LinkResolver<'_>) -> Result<String, LinkError> {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for caps in WIKILINK.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&line[last..whole.start()]);
        out.push_str(&links.resolve(&caps[1])?);
        last = whole.end();
    }
    out.push_str(&line[last..]);
    Ok(out)
}

/// Turn a trailing ` ^id` into a footnote target:
///
/// ```text
/// - The claim. ^ref-3
/// - <a name="fnx:3"></a> The claim.&#160;[↩︎](#fnxref:3)
/// ```
///
/// The line ending is kept on purpose. Dropping it would glue the footnote
/// target onto the following line.
fn rewrite_inline_anchor(line: &str) -> String {
    let content = content_of(line);
    let ending = &line[content.len()..];
    let Some(caps) = INLINE_ANCHOR.captures(content) else {
        return line.to_string();
    };
    let Some(whole) = caps.get(0) else {
        return line.to_string();
    };
    let id = &caps[1];
    let id = id.strip_prefix("ref-").unwrap_or(id);

    let text = format!("{}&#160;[↩︎](#fnxref:{id})", &content[..whole.start()]);
    let anchor = format!("<a name=\"fnx:{id}\"></a> ");
    let stripped = text.trim_start();
    let indentation = &text[..text.len() - stripped.len()];

    match LIST_PREFIX.find(stripped) {
        Some(prefix) => format!(
            "{indentation}{}{anchor}{}{ending}",
            prefix.as_str(),
            stripped[prefix.end()..].trim_start()
        ),
        None => format!("{indentation}{anchor}{stripped}{ending}"),
    }
}
