//! Centralized naming conventions of the vault and the Hugo site.
//!
//! Every component agrees on the same handful of rules, so they live here:
//!
//! - **Index marker**: a directory's own article is named `§ {dir name}.md`.
//!   Only files carrying the marker are published.
//! - **External marker**: notes named `♯ …` live in the private knowledge base;
//!   links to them point at the external vault site when they are not published.
//! - **Translations**: `§ Name - Chinese.md` is the Chinese variant of `§ Name.md`.
//! - **Date prefix**: blog directories may be named `2023 - Title`; the year is
//!   dropped from the slug.
//!
//! ## Slugs
//!
//! Slugs are lower-cased, accents are stripped from Latin letters, and every
//! non-word character becomes a dash. Leading and trailing dashes produced by
//! punctuation are trimmed, but runs of dashes are kept:
//! - `Other Post` → `other-post`
//! - `Café, Bar` → `cafe--bar`
//! - `读书笔记` → `读书笔记`

use inflector::string::singularize::to_singular;
use unicode_normalization::UnicodeNormalization;

/// Prefix of publishable directory-index articles.
pub const INDEX_MARKER: &str = "§ ";
/// Prefix of notes that live in the external knowledge-base vault.
pub const EXTERNAL_MARKER: &str = "♯ ";
/// Stem suffix of the Chinese variant of an article.
pub const TRANSLATION_SUFFIX: &str = " - Chinese";

/// Image extensions recognized in content blocks and copied as media.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Language of an article variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Zh,
}

impl Lang {
    /// Detect the language from a file stem or wikilink basename.
    pub fn from_stem(stem: &str) -> Self {
        if stem.ends_with(TRANSLATION_SUFFIX.trim_start()) {
            Lang::Zh
        } else {
            Lang::En
        }
    }

    /// Detect the language from a full file name like `§ Name - Chinese.md`.
    pub fn from_file_name(name: &str) -> Self {
        Self::from_stem(name.strip_suffix(".md").unwrap_or(name))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Zh => "zh",
        }
    }

    /// Extension of the directory-index article for this language.
    pub fn index_extension(self) -> &'static str {
        match self {
            Lang::En => ".md",
            Lang::Zh => " - Chinese.md",
        }
    }

    /// Output file name inside the Hugo page bundle.
    pub fn bundle_file(self) -> &'static str {
        match self {
            Lang::En => "index.md",
            Lang::Zh => "index.zh.md",
        }
    }
}

/// Whether a file name is a directory-index article (`§ …`).
pub fn is_index_article(file_name: &str) -> bool {
    file_name.starts_with(INDEX_MARKER)
}

/// Name of the index article for a directory named `dir_name`.
pub fn index_file_name(dir_name: &str, lang: Lang) -> String {
    format!("{INDEX_MARKER}{dir_name}{}", lang.index_extension())
}

/// Whether the extension (without dot) denotes an image we publish, in any case.
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// Strip a `YYYY - ` date prefix from a directory name.
///
/// - `"2023 - Rust Notes"` → `"Rust Notes"`
/// - `"Rust Notes"` → `"Rust Notes"`
pub fn strip_date_prefix(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 7
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && name.get(4..7) == Some(" - ")
    {
        &name[7..]
    } else {
        name
    }
}

/// URL-safe form of a name: lower-cased, unaccented, non-word characters as dashes.
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(unaccent)
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    slug.trim_matches('_').replace('_', "-")
}

/// Map an accented Latin letter to its base ASCII letter, leaving others alone.
fn unaccent(c: char) -> char {
    if c.is_ascii() {
        return c;
    }
    match std::iter::once(c).nfd().next() {
        Some(base) if base.is_ascii_alphabetic() => base,
        _ => c,
    }
}

/// Lower-cased singular form of an English plural noun, used for section names.
///
/// - `Posts` → `post`, `Movies` → `movie`, `Analyses` → `analysis`
/// - `Series` and other uncountables only lose their capitals
pub fn singularize(word: &str) -> String {
    to_singular(&word.to_lowercase())
}

/// First character upper-cased, the rest lower-cased (`hINT` → `Hint`).
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_spaces_become_dashes() {
        assert_eq!(slugify("Other Post"), "other-post");
    }

    #[test]
    fn slugify_keeps_dash_runs_and_trims_edges() {
        assert_eq!(slugify("Hello, World!"), "hello--world");
        assert_eq!(slugify("  padded  "), "padded");
    }

    #[test]
    fn slugify_strips_accents() {
        assert_eq!(slugify("Café Crème"), "cafe-creme");
    }

    #[test]
    fn slugify_keeps_cjk() {
        assert_eq!(slugify("读书 笔记"), "读书-笔记");
    }

    #[test]
    fn slugify_underscores_become_dashes() {
        assert_eq!(slugify("snake_case"), "snake-case");
    }

    #[test]
    fn strip_date_prefix_removes_year() {
        assert_eq!(strip_date_prefix("2023 - Rust Notes"), "Rust Notes");
    }

    #[test]
    fn strip_date_prefix_leaves_plain_names() {
        assert_eq!(strip_date_prefix("Rust Notes"), "Rust Notes");
        assert_eq!(strip_date_prefix("202 - Short"), "202 - Short");
    }

    #[test]
    fn singularize_regular_plurals() {
        assert_eq!(singularize("Posts"), "post");
        assert_eq!(singularize("notes"), "note");
        assert_eq!(singularize("Stories"), "story");
    }

    #[test]
    fn singularize_section_names_with_special_endings() {
        assert_eq!(singularize("Movies"), "movie");
        assert_eq!(singularize("Archives"), "archive");
        assert_eq!(singularize("Statuses"), "status");
        assert_eq!(singularize("Quizzes"), "quiz");
        assert_eq!(singularize("Aliases"), "alias");
        assert_eq!(singularize("Analyses"), "analysis");
    }

    #[test]
    fn singularize_leaves_uncountable_and_singular() {
        assert_eq!(singularize("Series"), "series");
        assert_eq!(singularize("class"), "class");
    }

    #[test]
    fn image_extensions_ignore_case() {
        assert!(is_image_extension("png"));
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("Jpeg"));
        assert!(!is_image_extension("md"));
    }

    #[test]
    fn lang_detection() {
        assert_eq!(Lang::from_stem("Other Post - Chinese"), Lang::Zh);
        assert_eq!(Lang::from_stem("Other Post"), Lang::En);
        assert_eq!(Lang::from_file_name("§ Foo - Chinese.md"), Lang::Zh);
    }

    #[test]
    fn index_file_name_per_language() {
        assert_eq!(index_file_name("Rust", Lang::En), "§ Rust.md");
        assert_eq!(index_file_name("Rust", Lang::Zh), "§ Rust - Chinese.md");
    }

    #[test]
    fn capitalize_lowers_the_rest() {
        assert_eq!(capitalize("info"), "Info");
        assert_eq!(capitalize("hINT"), "Hint");
        assert_eq!(capitalize(""), "");
    }
}
