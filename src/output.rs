//! CLI output formatting for every command.
//!
//! Output is **article-centric**: each entry leads with a positional index and
//! the article title, followed by where it went. Source files are secondary
//! context on indented `Source:` lines.
//!
//! # Output Format
//!
//! ## Publish
//!
//! ```text
//! 001 Hello → posts/hello/index.md
//!     Source: § Blog/Posts/2023 - Hello/§ Hello.md
//! 002 你好 [zh] → posts/hello/index.zh.md
//!     Source: § Blog/Posts/2023 - Hello/§ Hello - Chinese.md
//!
//! Stubs
//!     wiki/borrowing/index.md
//!
//! Published 2 articles, 1 stub, 3 media files
//! Backlinks: 1 target → data/backlinks.json
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 Hello → /posts/hello/
//!     Source: § Blog/Posts/2023 - Hello/§ Hello.md
//!
//! Checked 1 article
//! ```
//!
//! ## Verify
//!
//! ```text
//! pass basic.in.md
//! FAIL callout.in.md
//!     line 3
//!     expected: {{< /callout >}}
//!     actual:   > tail
//!
//! 1 of 2 vectors failed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::naming::Lang;
use crate::publish::{PublishReport, PublishedArticle};
use crate::vectors::{Outcome, VerifyReport};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `base` when it lies below it.
fn relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}

/// `1 article`, `2 articles`.
fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Title with a language tag for translations.
///
/// ```text
/// 001 Hello
/// 002 你好 [zh]
/// ```
fn article_header(index: usize, article: &PublishedArticle) -> String {
    match article.lang {
        Lang::En => format!("{} {}", format_index(index), article.title),
        Lang::Zh => format!("{} {} [zh]", format_index(index), article.title),
    }
}

// ============================================================================
// Publish
// ============================================================================

/// Format the result of a publish run.
///
/// `vault_root` and `content_root` shorten the source and target paths.
pub fn format_publish_output(
    report: &PublishReport,
    vault_root: &Path,
    content_root: &Path,
) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, article) in report.articles.iter().enumerate() {
        lines.push(format!(
            "{} → {}",
            article_header(i + 1, article),
            relative(&article.target, content_root)
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            relative(&article.source, vault_root)
        ));
    }

    if !report.stubs.is_empty() {
        lines.push(String::new());
        lines.push("Stubs".to_string());
        for stub in &report.stubs {
            lines.push(format!("{}{}", indent(1), relative(stub, content_root)));
        }
    }

    lines.push(String::new());
    let mut summary = format!("Published {}", count(report.articles.len(), "article"));
    if !report.stubs.is_empty() {
        summary.push_str(&format!(", {}", count(report.stubs.len(), "stub")));
    }
    if !report.media.is_empty() {
        summary.push_str(&format!(", {}", count(report.media.len(), "media file")));
    }
    lines.push(summary);

    if let Some(backlinks) = &report.backlinks {
        lines.push(format!(
            "Backlinks: {} → {}",
            count(backlinks.targets, "target"),
            backlinks.path.display()
        ));
    }
    lines
}

pub fn print_publish_output(report: &PublishReport, vault_root: &Path, content_root: &Path) {
    for line in format_publish_output(report, vault_root, content_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the result of a dry run: every article with its page path.
pub fn format_check_output(report: &PublishReport, vault_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, article) in report.articles.iter().enumerate() {
        lines.push(format!(
            "{} → {}",
            article_header(i + 1, article),
            article.publish_path
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            relative(&article.source, vault_root)
        ));
    }
    lines.push(String::new());
    lines.push(format!("Checked {}", count(report.articles.len(), "article")));
    lines
}

pub fn print_check_output(report: &PublishReport, vault_root: &Path) {
    for line in format_check_output(report, vault_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Verify
// ============================================================================

/// First line where two documents differ: 1-based number and both lines.
/// A missing line shows as empty.
fn first_difference<'a>(expected: &'a str, actual: &'a str) -> Option<(usize, &'a str, &'a str)> {
    let mut expected_lines = expected.split('\n');
    let mut actual_lines = actual.split('\n');
    let mut number = 0;
    loop {
        number += 1;
        match (expected_lines.next(), actual_lines.next()) {
            (None, None) => return None,
            (e, a) if e == a => continue,
            (e, a) => return Some((number, e.unwrap_or_default(), a.unwrap_or_default())),
        }
    }
}

/// Format vector results, with the first differing line of each failure.
pub fn format_verify_output(report: &VerifyReport, dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for result in &report.results {
        let name = relative(&result.input, dir);
        match &result.outcome {
            Outcome::Pass => lines.push(format!("pass {name}")),
            Outcome::Fail { expected, actual } => {
                lines.push(format!("FAIL {name}"));
                if let Some((number, e, a)) = first_difference(expected, actual) {
                    lines.push(format!("{}line {number}", indent(1)));
                    lines.push(format!("{}expected: {e}", indent(1)));
                    lines.push(format!("{}actual:   {a}", indent(1)));
                }
            }
        }
    }

    lines.push(String::new());
    let failed = report.failures().count();
    if failed == 0 {
        lines.push(format!("{} passed", count(report.results.len(), "vector")));
    } else {
        lines.push(format!(
            "{failed} of {} failed",
            count(report.results.len(), "vector")
        ));
    }
    lines
}

pub fn print_verify_output(report: &VerifyReport, dir: &Path) {
    for line in format_verify_output(report, dir) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::BacklinksSummary;
    use crate::vectors::VectorResult;
    use std::path::PathBuf;

    fn article(title: &str, lang: Lang, source: &str, target: &str) -> PublishedArticle {
        PublishedArticle {
            title: title.to_string(),
            lang,
            publish_path: "/posts/hello/".to_string(),
            source: PathBuf::from("/vault").join(source),
            target: PathBuf::from("/content").join(target),
        }
    }

    fn report() -> PublishReport {
        PublishReport {
            articles: vec![
                article("Hello", Lang::En, "Posts/§ Hello.md", "posts/hello/index.md"),
                article(
                    "你好",
                    Lang::Zh,
                    "Posts/§ Hello - Chinese.md",
                    "posts/hello/index.zh.md",
                ),
            ],
            ..PublishReport::default()
        }
    }

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn count_pluralizes() {
        assert_eq!(count(1, "stub"), "1 stub");
        assert_eq!(count(0, "stub"), "0 stubs");
        assert_eq!(count(3, "media file"), "3 media files");
    }

    #[test]
    fn publish_lists_articles_with_sources() {
        let lines = format_publish_output(&report(), Path::new("/vault"), Path::new("/content"));
        assert_eq!(lines[0], "001 Hello → posts/hello/index.md");
        assert_eq!(lines[1], "    Source: Posts/§ Hello.md");
        assert_eq!(lines[2], "002 你好 [zh] → posts/hello/index.zh.md");
        assert_eq!(lines.last().unwrap(), "Published 2 articles");
    }

    #[test]
    fn publish_summary_with_stubs_media_and_backlinks() {
        let mut report = report();
        report.stubs.push(PathBuf::from("/content/wiki/b/index.md"));
        report.media.push(PathBuf::from("/content/posts/hello/a.png"));
        report.backlinks = Some(BacklinksSummary {
            path: PathBuf::from("data/backlinks.json"),
            targets: 2,
        });

        let lines = format_publish_output(&report, Path::new("/vault"), Path::new("/content"));
        assert!(lines.contains(&"Stubs".to_string()));
        assert!(lines.contains(&"    wiki/b/index.md".to_string()));
        assert!(lines.contains(&"Published 2 articles, 1 stub, 1 media file".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Backlinks: 2 targets → data/backlinks.json"
        );
    }

    #[test]
    fn check_shows_page_paths() {
        let lines = format_check_output(&report(), Path::new("/vault"));
        assert_eq!(lines[0], "001 Hello → /posts/hello/");
        assert_eq!(lines.last().unwrap(), "Checked 2 articles");
    }

    #[test]
    fn first_difference_finds_line() {
        assert_eq!(first_difference("a\nb\nc", "a\nx\nc"), Some((2, "b", "x")));
        assert_eq!(first_difference("a\n", "a\nb"), Some((2, "", "b")));
        assert_eq!(first_difference("same\n", "same\n"), None);
    }

    #[test]
    fn verify_reports_failures() {
        let report = VerifyReport {
            results: vec![
                VectorResult {
                    input: PathBuf::from("/v/basic.in.md"),
                    outcome: Outcome::Pass,
                },
                VectorResult {
                    input: PathBuf::from("/v/deep/bad.in.md"),
                    outcome: Outcome::Fail {
                        expected: "a\nb\n".to_string(),
                        actual: "a\nc\n".to_string(),
                    },
                },
            ],
        };
        let lines = format_verify_output(&report, Path::new("/v"));
        assert_eq!(
            lines,
            vec![
                "pass basic.in.md",
                "FAIL deep/bad.in.md",
                "    line 2",
                "    expected: b",
                "    actual:   c",
                "",
                "1 of 2 vectors failed",
            ]
        );
    }

    #[test]
    fn verify_all_passed() {
        let report = VerifyReport {
            results: vec![VectorResult {
                input: PathBuf::from("/v/basic.in.md"),
                outcome: Outcome::Pass,
            }],
        };
        let lines = format_verify_output(&report, Path::new("/v"));
        assert_eq!(lines.last().unwrap(), "1 vector passed");
    }
}
