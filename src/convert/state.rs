//! The line-rewriting state machine.
//!
//! Each state consumes one input line (or the end of input) and returns the
//! next state. `None` ends the run. Only `Normal` and `Metadata` may see the
//! end of input; every other open block either flushes or fails.

use super::blocks::{self, CALLOUT_CLOSE, ContentBlock};
use super::cursor::{LineCursor, Output, content_of, squash_blank_lines};
use super::inline;
use super::patterns::{ANCHOR, CALLOUT, CONTENT_BLOCK, EMBED, IA_CONTENT_BLOCK};
use super::{BlockKind, ConvertError};
use crate::links::LinkResolver;
use crate::naming;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a state transition may touch.
pub struct Machine<'a> {
    pub cursor: LineCursor,
    pub out: Output,
    /// Directory that content-block includes are resolved against.
    pub dir: PathBuf,
    pub katex: bool,
    pub links: LinkResolver<'a>,
}

impl Machine<'_> {
    fn convert_line(&mut self, line: &str) -> Result<String, ConvertError> {
        Ok(inline::convert_line(line, self.katex, &mut self.links)?)
    }

    fn squash_blank_lines(&mut self) {
        squash_blank_lines(&mut self.cursor, &mut self.out);
    }

    /// Splice the markdown file named by a directive into the input.
    fn include(&mut self, target: &str) -> Result<(), ConvertError> {
        let mut name = target.strip_prefix("./").unwrap_or(target).to_string();
        if !name.ends_with(".md") {
            name.push_str(".md");
        }
        let path = self.dir.join(&name);
        let mut text = fs::read_to_string(&path).map_err(|source| ConvertError::Include {
            path: path.clone(),
            source,
        })?;
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        debug!(include = %path.display(), "splicing content block");
        self.cursor.splice(&text);
        Ok(())
    }
}

#[derive(Debug)]
pub enum State {
    Normal,
    FencedCodeBlock,
    IgnoredFencedCodeBlock,
    MathBlock { indentation: String },
    Comment,
    Metadata,
    Callout { inner: Box<State> },
    ContentBlockImage { blocks: Vec<ContentBlock> },
}

/// Body of a content block directive on this line, in either syntax.
fn content_block(line: &str) -> Option<&str> {
    let content = content_of(line);
    CONTENT_BLOCK
        .captures(content)
        .or_else(|| IA_CONTENT_BLOCK.captures(content))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn is_image(body: &str) -> bool {
    Path::new(blocks::directive_path(body))
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(naming::is_image_extension)
}

impl State {
    /// Feed one line, or `None` at the end of input.
    pub fn step(self, line: Option<&str>, m: &mut Machine<'_>) -> Result<Option<State>, ConvertError> {
        match self {
            State::Normal => normal(line, m),
            State::FencedCodeBlock => {
                let line = line.ok_or(ConvertError::UnexpectedEof(BlockKind::FencedCode))?;
                m.out.push(line);
                Ok(Some(if line.trim() == "```" {
                    State::Normal
                } else {
                    State::FencedCodeBlock
                }))
            }
            State::IgnoredFencedCodeBlock => {
                let line = line.ok_or(ConvertError::UnexpectedEof(BlockKind::FencedCode))?;
                Ok(Some(if line.trim() == "```" {
                    State::Normal
                } else {
                    State::IgnoredFencedCodeBlock
                }))
            }
            State::MathBlock { indentation } => math_line(indentation, line, m),
            State::Comment => {
                let line = line.ok_or(ConvertError::UnexpectedEof(BlockKind::Comment))?;
                if line.trim().ends_with("%%") {
                    m.squash_blank_lines();
                    Ok(Some(State::Normal))
                } else {
                    Ok(Some(State::Comment))
                }
            }
            State::Metadata => match line {
                None => Ok(None),
                Some(line) if line.trim().is_empty() => {
                    m.squash_blank_lines();
                    Ok(Some(State::Normal))
                }
                Some(_) => Ok(Some(State::Metadata)),
            },
            State::Callout { inner } => callout_line(*inner, line, m),
            State::ContentBlockImage { blocks } => content_block_line(blocks, line, m),
        }
    }
}

fn normal(line: Option<&str>, m: &mut Machine<'_>) -> Result<Option<State>, ConvertError> {
    let Some(line) = line else {
        return Ok(None);
    };
    let trimmed = line.trim();

    if trimmed.is_empty() {
        m.out.push(line);
        return Ok(Some(State::Normal));
    }
    if trimmed == "%%TOC%%" {
        m.squash_blank_lines();
        return Ok(Some(State::Normal));
    }
    if ANCHOR.is_match(trimmed)
        && let Some((indentation, name)) = line.split_once('^')
    {
        m.out
            .push(&format!("{indentation}<a name=\"{}\"></a>\n", name.trim()));
        return Ok(Some(State::Normal));
    }
    if let Some(caps) = EMBED.captures(line) {
        m.out.push(&blocks::render_embed(line, &caps));
        return Ok(Some(State::Normal));
    }
    if trimmed.starts_with("```dataviewx") {
        return Ok(Some(State::IgnoredFencedCodeBlock));
    }
    if trimmed.starts_with("```") {
        m.out.push(line);
        return Ok(Some(State::FencedCodeBlock));
    }
    if m.katex
        && trimmed.starts_with("$$")
        && let Some((indentation, rest)) = line.split_once("$$")
    {
        m.out.push(&format!("{indentation}``` katex\n{indentation}\\["));
        return math_line(indentation.to_string(), Some(rest), m);
    }
    if let Some(after) = trimmed.strip_prefix("%%") {
        if after.ends_with("%%") {
            m.squash_blank_lines();
            return Ok(Some(State::Normal));
        }
        return Ok(Some(State::Comment));
    }
    if trimmed.starts_with("**") && line.contains("**:: ") {
        return Ok(Some(State::Metadata));
    }
    if let Some(caps) = CALLOUT.captures(line) {
        let kind = &caps[1];
        let title = caps
            .get(3)
            .map_or_else(|| naming::capitalize(kind), |t| t.as_str().to_string());
        m.out.push(&blocks::callout_open(kind, &caps[2], &title)?);
        return Ok(Some(State::Callout {
            inner: Box::new(State::Normal),
        }));
    }
    if let Some(body) = content_block(line) {
        if is_image(body) {
            return Ok(Some(State::ContentBlockImage {
                blocks: vec![ContentBlock::parse(body)],
            }));
        }
        m.include(blocks::directive_path(body))?;
        return Ok(Some(State::Normal));
    }

    let converted = m.convert_line(line)?;
    m.out.push(&converted);
    Ok(Some(State::Normal))
}

fn math_line(
    indentation: String,
    line: Option<&str>,
    m: &mut Machine<'_>,
) -> Result<Option<State>, ConvertError> {
    let line = line.ok_or(ConvertError::UnexpectedEof(BlockKind::Math))?;
    if !line.trim().ends_with("$$") {
        m.out.push(line);
        return Ok(Some(State::MathBlock { indentation }));
    }
    let closed = match line.rsplit_once("$$") {
        Some((head, tail)) => format!("{head}\\]{tail}"),
        None => line.to_string(),
    };
    m.out.push(&closed);
    if !line.ends_with('\n') {
        m.out.push("\n");
    }
    m.out.push(&format!("{indentation}```\n"));
    Ok(Some(State::Normal))
}

fn callout_line(
    inner: State,
    line: Option<&str>,
    m: &mut Machine<'_>,
) -> Result<Option<State>, ConvertError> {
    let unwrapped = line.and_then(|l| match l.strip_prefix("> ") {
        Some(rest) => Some(rest),
        None if l.trim_end() == ">" => Some(&l[1..]),
        None => None,
    });
    if let Some(rest) = unwrapped {
        let inner = inner.step(Some(rest), m)?.unwrap_or(State::Normal);
        return Ok(Some(State::Callout {
            inner: Box::new(inner),
        }));
    }

    // Close whatever the callout body left open before leaving it.
    inner.step(None, m)?;
    m.out.push(CALLOUT_CLOSE);
    normal(line, m)
}

fn content_block_line(
    mut blocks: Vec<ContentBlock>,
    line: Option<&str>,
    m: &mut Machine<'_>,
) -> Result<Option<State>, ConvertError> {
    if let Some(body) = line.and_then(content_block)
        && is_image(body)
    {
        blocks.push(ContentBlock::parse(body));
        return Ok(Some(State::ContentBlockImage { blocks }));
    }

    let card = blocks::render_cards(&blocks, |caption| m.convert_line(caption))?;
    m.out.push(&card);
    if line.is_some() {
        m.out.push("\n");
    }
    normal(line, m)
}
