//! Shortcode rendering for content blocks, embeds and callouts.

use super::ConvertError;
use regex::Captures;

/// Width hint of an image card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KgWidth {
    Fit,
    Normal,
    Wide,
    Full,
}

impl KgWidth {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fit" => Some(KgWidth::Fit),
            "normal" => Some(KgWidth::Normal),
            "wide" => Some(KgWidth::Wide),
            "full" => Some(KgWidth::Full),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KgWidth::Fit => "fit",
            KgWidth::Normal => "normal",
            KgWidth::Wide => "wide",
            KgWidth::Full => "full",
        }
    }
}

/// One content block directive: `path|caption|width?query|gallery caption`.
///
/// A fourth field ends the gallery row after this image and carries the
/// gallery caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBlock {
    pub path: String,
    pub caption: String,
    pub gallery_caption: String,
    pub query: String,
    pub kg_width: Option<KgWidth>,
    pub end_row: bool,
}

impl ContentBlock {
    pub fn parse(body: &str) -> Self {
        let parts: Vec<&str> = body.split('|').collect();
        let path = parts[0];
        let mut block = ContentBlock {
            path: path.strip_prefix("./").unwrap_or(path).to_string(),
            ..ContentBlock::default()
        };

        if let Some(caption) = parts.get(1) {
            block.caption = caption.to_string();
        }
        if let Some(query) = parts.get(2) {
            let (head, tail) = match query.split_once('?') {
                Some((head, tail)) => (head, Some(tail)),
                None => (*query, None),
            };
            block.query = query.to_string();
            if let Some(width) = KgWidth::parse(head.trim()) {
                block.kg_width = Some(width);
                block.query = tail.map(str::trim).unwrap_or_default().to_string();
            }
        }
        if let Some(gallery_caption) = parts.get(3) {
            block.end_row = true;
            block.gallery_caption = gallery_caption.to_string();
        }
        block
    }

    /// Image source with the query string appended.
    pub fn src(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

/// Target path of a directive body, the part before the first `|`.
pub fn directive_path(body: &str) -> &str {
    body.split('|').next().unwrap_or(body)
}

/// JSON string literal, used for shortcode attributes.
pub fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Go-style quoted string contents (without the surrounding quotes).
pub fn go_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.push_str(&format!("\\x{:02x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Render accumulated image directives as one card.
///
/// `convert` renders captions through inline conversion.
pub fn render_cards<F>(blocks: &[ContentBlock], mut convert: F) -> Result<String, ConvertError>
where
    F: FnMut(&str) -> Result<String, ConvertError>,
{
    let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
        return Ok(String::new());
    };

    if blocks.len() == 1 {
        let mut card = format!("{{{{< image-card src={}", quote(&first.src()));
        if let Some(width) = first.kg_width {
            card.push_str(&format!(" kg-width={}", quote(width.as_str())));
        }
        if !first.caption.is_empty() {
            card.push_str(&format!(" caption={}", quote(&convert(&first.caption)?)));
        }
        card.push_str(" >}}");
        return Ok(card);
    }

    let mut card = String::from("{{< gallery-card");
    if let Some(width) = first.kg_width {
        card.push_str(" kg_width=");
        card.push_str(width.as_str());
    }
    let mut row_ended = false;
    for block in blocks {
        if row_ended {
            card.push_str(" \"|\"");
        }
        row_ended = block.end_row;

        let mut src = block.src();
        if !block.caption.is_empty() {
            src.push('|');
            src.push_str(&block.caption);
        }
        card.push(' ');
        card.push_str(&quote(&src));
    }
    if !last.gallery_caption.is_empty() {
        let caption = format!("|{}", convert(&last.gallery_caption)?);
        card.push(' ');
        card.push_str(&quote(&caption));
    }
    card.push_str(" >}}");
    Ok(card)
}

/// Render an embed card line matched by [`super::patterns::EMBED`].
///
/// Only Vimeo embeds become shortcodes; other kinds are copied.
pub fn render_embed(line: &str, caps: &Captures<'_>) -> String {
    if &caps[1] != "Vimeo" {
        return line.to_string();
    }
    let url = &caps[3];
    let id = url.split_once("vimeo.com/").map_or(url, |(_, id)| id);
    let args = caps
        .get(4)
        .map(|m| m.as_str())
        .filter(|a| !a.is_empty())
        .map(|a| format!(" {a}"))
        .unwrap_or_default();
    let line_end = &line[line.trim_end().len()..];
    format!(
        "{{{{< vimeo-card id={} caption={}{args} >}}}}{line_end}",
        quote(id),
        quote(&caps[2])
    )
}

/// Font Awesome icon of each callout kind.
pub fn callout_icon(kind: &str) -> Option<&'static str> {
    match kind {
        "example" => Some("list"),
        "code" => Some("code"),
        "file" => Some("file"),
        "info" => Some("circle-info"),
        "hint" => Some("fire"),
        "attention" => Some("exclamation-triangle"),
        _ => None,
    }
}

/// Opening callout shortcode followed by a blank line.
pub fn callout_open(kind: &str, fold: &str, title: &str) -> Result<String, ConvertError> {
    let icon = callout_icon(kind).ok_or_else(|| ConvertError::UnknownCallout(kind.to_string()))?;
    Ok(format!(
        "{{{{< callout type=\"{kind}\" icon=\"fas fa-{icon}\" title=\"{}\" fold=\"{fold}\" >}}}}\n\n",
        go_escape(title)
    ))
}

pub const CALLOUT_CLOSE: &str = "\n{{< /callout >}}\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::patterns::EMBED;

    fn same(s: &str) -> Result<String, ConvertError> {
        Ok(s.to_string())
    }

    #[test]
    fn parse_path_and_caption() {
        let block = ContentBlock::parse("./images/a.png|A caption");
        assert_eq!(block.path, "images/a.png");
        assert_eq!(block.caption, "A caption");
        assert_eq!(block.kg_width, None);
        assert!(!block.end_row);
    }

    #[test]
    fn parse_width_and_query() {
        let block = ContentBlock::parse("a.png||wide?w=800");
        assert_eq!(block.kg_width, Some(KgWidth::Wide));
        assert_eq!(block.query, "w=800");
        assert_eq!(block.src(), "a.png?w=800");
    }

    #[test]
    fn parse_query_without_width() {
        let block = ContentBlock::parse("a.png||w=800");
        assert_eq!(block.kg_width, None);
        assert_eq!(block.query, "w=800");
    }

    #[test]
    fn parse_width_only() {
        let block = ContentBlock::parse("a.png|| full ");
        assert_eq!(block.kg_width, Some(KgWidth::Full));
        assert_eq!(block.query, "");
    }

    #[test]
    fn fourth_field_ends_row() {
        let block = ContentBlock::parse("a.png|||Trip");
        assert!(block.end_row);
        assert_eq!(block.gallery_caption, "Trip");
    }

    #[test]
    fn single_block_is_image_card() {
        let blocks = [ContentBlock::parse("a.png|Sunset|wide")];
        assert_eq!(
            render_cards(&blocks, same).unwrap(),
            r#"{{< image-card src="a.png" kg-width="wide" caption="Sunset" >}}"#
        );
    }

    #[test]
    fn image_card_caption_is_converted() {
        let blocks = [ContentBlock::parse("a.png|see [[X]]")];
        let card = render_cards(&blocks, |s| Ok(s.replace("[[X]]", "[X]"))).unwrap();
        assert_eq!(card, r#"{{< image-card src="a.png" caption="see [X]" >}}"#);
    }

    #[test]
    fn gallery_breaks_rows_after_end_row_blocks() {
        let blocks = [
            ContentBlock::parse("a.png|A|wide"),
            ContentBlock::parse("b.png|||"),
            ContentBlock::parse("c.png"),
            ContentBlock::parse("d.png|D||Trip"),
        ];
        assert_eq!(
            render_cards(&blocks, same).unwrap(),
            r#"{{< gallery-card kg_width=wide "a.png|A" "b.png" "|" "c.png" "d.png|D" "|Trip" >}}"#
        );
    }

    #[test]
    fn gallery_row_tokens_skip_last_block() {
        let blocks = [
            ContentBlock::parse("a.png|||"),
            ContentBlock::parse("b.png|||"),
        ];
        let card = render_cards(&blocks, same).unwrap();
        assert_eq!(card.matches("\"|\"").count(), 1);
    }

    #[test]
    fn vimeo_embed_becomes_shortcode() {
        let line = "[Vimeo - Demo](https://vimeo.com/12345 \"autoplay\")\n";
        let caps = EMBED.captures(line).unwrap();
        assert_eq!(
            render_embed(line, &caps),
            "{{< vimeo-card id=\"12345\" caption=\"Demo\" autoplay >}}\n"
        );
    }

    #[test]
    fn other_embeds_are_copied() {
        let line = "[YouTube - Demo](https://youtu.be/x)\n";
        let caps = EMBED.captures(line).unwrap();
        assert_eq!(render_embed(line, &caps), line);
    }

    #[test]
    fn callout_header_escapes_title() {
        assert_eq!(
            callout_open("info", "-", "Say \"hi\"").unwrap(),
            "{{< callout type=\"info\" icon=\"fas fa-circle-info\" title=\"Say \\\"hi\\\"\" fold=\"-\" >}}\n\n"
        );
    }

    #[test]
    fn unknown_callout_kind_is_fatal() {
        assert!(matches!(
            callout_open("warning", "", "Warning"),
            Err(ConvertError::UnknownCallout(kind)) if kind == "warning"
        ));
    }

    #[test]
    fn quote_keeps_unicode() {
        assert_eq!(quote("图 \"1\""), "\"图 \\\"1\\\"\"");
    }
}
