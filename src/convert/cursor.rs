//! Input cursor and output buffer of the conversion machine.

/// Strip the line terminator (`\n` or `\r\n`).
pub fn content_of(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// A line with nothing but its terminator.
pub fn is_blank_line(line: &str) -> bool {
    content_of(line).is_empty()
}

/// Forward-only cursor over input lines. Lines keep their terminators.
///
/// Included files are spliced in at the cursor, ahead of the lines not yet
/// consumed.
#[derive(Debug, Default)]
pub struct LineCursor {
    lines: Vec<String>,
    pos: usize,
}

impl LineCursor {
    pub fn new(text: &str) -> Self {
        Self {
            lines: split_lines(text),
            pos: 0,
        }
    }

    /// Consume and return the next line.
    pub fn advance(&mut self) -> Option<String> {
        let line = self.lines.get_mut(self.pos).map(std::mem::take)?;
        self.pos += 1;
        Some(line)
    }

    pub fn peek(&self) -> Option<&str> {
        self.lines.get(self.pos).map(String::as_str)
    }

    /// Insert the lines of `text` before the unconsumed remainder.
    pub fn splice(&mut self, text: &str) {
        self.lines.drain(..self.pos);
        self.pos = 0;
        self.lines.splice(0..0, split_lines(text));
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

/// Output buffer that remembers whether the last fragment was blank.
#[derive(Debug)]
pub struct Output {
    buf: String,
    last_blank: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            buf: String::new(),
            last_blank: true,
        }
    }
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: &str) {
        self.buf.push_str(fragment);
        self.last_blank = is_blank_line(fragment);
    }

    /// True when nothing was written yet or the last fragment was blank.
    pub fn ends_blank(&self) -> bool {
        self.last_blank
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Skip blank input lines, copying one of them unless the output already
/// ends with a blank fragment.
pub fn squash_blank_lines(cursor: &mut LineCursor, out: &mut Output) {
    let mut have_blank = out.ends_blank();
    while let Some(line) = cursor.peek() {
        if !is_blank_line(line) {
            break;
        }
        if !have_blank {
            out.push(line);
            have_blank = true;
        }
        cursor.advance();
    }
}
