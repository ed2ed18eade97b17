//! Publishing the vault into the Hugo content tree.
//!
//! Every directory below a publishable root that holds `§ ` articles becomes
//! one page bundle:
//!
//! ```text
//! vault/§ Blog/Posts/2023 - Hello/          content/post/hello/
//! ├── § Hello.md                     →      ├── index.md
//! ├── § Hello - Chinese.md           →      ├── index.zh.md
//! ├── cover.jpg                      →      ├── cover.jpg
//! └── assets/diagram.png             →      └── assets/diagram.png
//! ```
//!
//! A full run converts every bundle and then writes the backlink registry.
//! An incremental run converts only the bundles touched by changed files and
//! leaves the registry alone, since it only saw part of the links.

use crate::convert::{ConvertError, convert_article};
use crate::frontmatter::{FrontMatter, TITLE};
use crate::naming::{self, Lang};
use crate::site::Site;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{0}")]
    Convert(#[from] ConvertError),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid version file: {0}")]
    InvalidVersion(PathBuf),
    #[error("Unknown root: {0}")]
    UnknownRoot(PathBuf),
}

/// Directories whose images are copied along with the articles.
const MEDIA_DIRS: &[&str] = &["assets", "images"];

/// Environment variables watchexec sets with the changed paths.
const WATCHEXEC_PATH_VARS: &[&str] = &[
    "WATCHEXEC_CREATED_PATH",
    "WATCHEXEC_RENAMED_PATH",
    "WATCHEXEC_WRITTEN_PATH",
];
const WATCHEXEC_OTHER_VARS: &[&str] = &["WATCHEXEC_REMOVED_PATH", "WATCHEXEC_META_CHANGED_PATH"];
const WATCHEXEC_COMMON_PATH: &str = "WATCHEXEC_COMMON_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Write,
    Check,
}

/// One converted article variant.
#[derive(Debug, Clone)]
pub struct PublishedArticle {
    pub title: String,
    pub lang: Lang,
    pub publish_path: String,
    pub source: PathBuf,
    pub target: PathBuf,
}

/// The written backlink registry.
#[derive(Debug, Clone)]
pub struct BacklinksSummary {
    pub path: PathBuf,
    pub targets: usize,
}

/// What a run did, for CLI output.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub articles: Vec<PublishedArticle>,
    /// Default-language stubs written for bundles with only a translation.
    pub stubs: Vec<PathBuf>,
    /// Copied media files, as target paths.
    pub media: Vec<PathBuf>,
    pub backlinks: Option<BacklinksSummary>,
}

// =============================================================================
// Entry points
// =============================================================================

/// Publish the whole vault and write the backlink registry.
pub fn publish_all(site: &mut Site) -> Result<PublishReport, PublishError> {
    let groups = group_by_dir(all_publishable(site)?);
    let mut report = PublishReport::default();
    for (dir, versions) in &groups {
        publish_group(site, dir, versions, Mode::Write, &mut report)?;
    }

    let path = site.config.backlinks_file.clone();
    site.backlinks.write(&path)?;
    info!(path = %path.display(), targets = site.backlinks.target_count(), "backlinks written");
    report.backlinks = Some(BacklinksSummary {
        path,
        targets: site.backlinks.target_count(),
    });
    Ok(report)
}

/// Convert every article without writing anything.
pub fn check_all(site: &mut Site) -> Result<PublishReport, PublishError> {
    let groups = group_by_dir(all_publishable(site)?);
    let mut report = PublishReport::default();
    for (dir, versions) in &groups {
        publish_group(site, dir, versions, Mode::Check, &mut report)?;
    }
    Ok(report)
}

/// Publish the bundles affected by `changed` files.
///
/// A changed `§ ` article is republished. Any other changed markdown file
/// republishes the `§ ` articles next to it, since they may include it.
pub fn publish_changed(site: &mut Site, changed: &[PathBuf]) -> Result<PublishReport, PublishError> {
    let mut affected = BTreeSet::new();
    for path in changed {
        if site.vault().is_publishable(path) && path.is_file() {
            affected.insert(path.clone());
        } else if path.extension().is_some_and(|e| e == "md")
            && let Some(dir) = path.parent()
            && dir.is_dir()
        {
            affected.extend(publishable_in(site, dir)?);
        } else {
            debug!(path = %path.display(), "ignoring change");
        }
    }

    let mut report = PublishReport::default();
    for (dir, versions) in &group_by_dir(affected) {
        publish_group(site, dir, versions, Mode::Write, &mut report)?;
    }
    Ok(report)
}

// =============================================================================
// watchexec integration
// =============================================================================

/// Whether the process runs under watchexec, judged by its variables.
pub fn is_watchexec(lookup: impl Fn(&str) -> Option<String>) -> bool {
    WATCHEXEC_PATH_VARS
        .iter()
        .chain(WATCHEXEC_OTHER_VARS)
        .any(|var| lookup(var).is_some())
}

/// Changed paths reported by watchexec.
///
/// Each variable holds `:`-separated paths relative to
/// `WATCHEXEC_COMMON_PATH` when that is set.
pub fn changed_paths_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let common = lookup(WATCHEXEC_COMMON_PATH).filter(|c| !c.is_empty());
    let mut paths = BTreeSet::new();
    for var in WATCHEXEC_PATH_VARS {
        let Some(value) = lookup(var) else {
            continue;
        };
        for changed in value.split(':').filter(|p| !p.is_empty()) {
            let path = match &common {
                Some(common) if changed.starts_with('/') => PathBuf::from(format!("{common}{changed}")),
                Some(common) => Path::new(common).join(changed),
                None => PathBuf::from(changed),
            };
            paths.insert(path);
        }
    }
    paths.into_iter().collect()
}

// =============================================================================
// Bundles
// =============================================================================

fn all_publishable(site: &Site) -> Result<BTreeSet<PathBuf>, PublishError> {
    let mut files = BTreeSet::new();
    for entry in WalkDir::new(site.vault().root()).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && site.vault().is_publishable(entry.path()) {
            files.insert(entry.into_path());
        }
    }
    Ok(files)
}

fn publishable_in(site: &Site, dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && site.vault().is_publishable(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn group_by_dir(files: impl IntoIterator<Item = PathBuf>) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        if let Some(dir) = file.parent() {
            groups.entry(dir.to_path_buf()).or_default().push(file);
        }
    }
    groups
}

/// Convert the variants of one bundle, write them and copy its media.
fn publish_group(
    site: &mut Site,
    dir: &Path,
    versions: &[PathBuf],
    mode: Mode,
    report: &mut PublishReport,
) -> Result<(), PublishError> {
    let placement = site
        .vault()
        .place_dir(dir)
        .ok_or_else(|| PublishError::UnknownRoot(dir.to_path_buf()))?;
    info!(dir = %dir.display(), path = %placement.publish_path(), "publish");

    let valid_names = [
        naming::index_file_name(&placement.basename, Lang::En),
        naming::index_file_name(&placement.basename, Lang::Zh),
    ];
    for version in versions {
        let name = version.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if !valid_names.iter().any(|valid| valid == name) {
            return Err(PublishError::InvalidVersion(version.clone()));
        }
    }

    let bundle = placement.bundle_dir(&site.config.content_dir);
    let mut translated_title = None;
    for version in versions {
        let converted = convert_article(site, version)?;
        let target = bundle.join(converted.lang.bundle_file());
        if mode == Mode::Write {
            save_file(&target, &converted.document)?;
        }
        if converted.lang == Lang::Zh {
            translated_title = Some(converted.title.clone());
        }
        report.articles.push(PublishedArticle {
            title: converted.title,
            lang: converted.lang,
            publish_path: placement.publish_path(),
            source: version.clone(),
            target,
        });
    }

    // Hugo needs a default-language page for the translation to show up.
    let default_source = dir.join(&valid_names[0]);
    if let Some(title) = translated_title
        && !default_source.exists()
    {
        let mut stub = FrontMatter::new();
        stub.insert(TITLE, title);
        let target = bundle.join(Lang::En.bundle_file());
        if mode == Mode::Write {
            save_file(&target, &stub.render()?)?;
        }
        report.stubs.push(target);
    }

    if mode == Mode::Write {
        copy_media(dir, &bundle, report)?;
    }
    Ok(())
}

fn save_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(naming::is_image_extension)
}

/// Copy images next to the articles and the media directories into the bundle.
fn copy_media(dir: &Path, bundle: &Path, report: &mut PublishReport) -> Result<(), PublishError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();

    for path in entries {
        let Some(name) = path.file_name() else {
            continue;
        };
        if path.is_file() && is_image(&path) {
            fs::create_dir_all(bundle)?;
            let target = bundle.join(name);
            fs::copy(&path, &target)?;
            report.media.push(target);
        } else if path.is_dir() && MEDIA_DIRS.iter().any(|d| name == *d) {
            copy_tree(&path, &bundle.join(name), report)?;
        }
    }
    Ok(())
}

fn copy_tree(src: &Path, dst: &Path, report: &mut PublishReport) -> Result<(), PublishError> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            report.media.push(target);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{read, test_site, write_file};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn vault() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_file(
            root,
            "vault/§ Blog/Posts/2023 - Hello/§ Hello.md",
            "# Hello\n\nSee [[§ Ownership]].\n",
        );
        write_file(
            root,
            "vault/§ Blog/Posts/2023 - Hello/§ Hello - Chinese.md",
            "# 你好\n\n见 [[§ Ownership]]。\n",
        );
        write_file(root, "vault/§ Blog/Posts/2023 - Hello/cover.jpg", "jpg");
        write_file(root, "vault/§ Blog/Posts/2023 - Hello/notes.txt", "txt");
        write_file(root, "vault/§ Blog/Posts/2023 - Hello/assets/d/diagram.png", "png");
        write_file(root, "vault/§ Tickler/Rust/Ownership/§ Ownership.md", "# Ownership\n");
        write_file(
            root,
            "vault/§ Tickler/Rust/Borrowing/§ Borrowing - Chinese.md",
            "# 借用\n",
        );
        write_file(root, "vault/Inbox/§ Private.md", "# Private\n");
        tmp
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn full_run_writes_bundles() {
        let tmp = vault();
        let mut site = test_site(tmp.path());
        let report = publish_all(&mut site).unwrap();

        assert_eq!(report.articles.len(), 4);
        let en = read(tmp.path(), "content/posts/hello/index.md");
        assert!(en.starts_with("---\ntitle: Hello\n---\n"));
        assert!(en.contains("{{< relref path=\"/wiki/ownership.md\" lang=\"en\" >}}"));
        let zh = read(tmp.path(), "content/posts/hello/index.zh.md");
        assert!(zh.starts_with("---\ntitle: 你好\n---\n"));
    }

    #[test]
    fn full_run_copies_media() {
        let tmp = vault();
        let mut site = test_site(tmp.path());
        publish_all(&mut site).unwrap();

        let bundle = tmp.path().join("content/posts/hello");
        assert!(bundle.join("cover.jpg").is_file());
        assert!(bundle.join("assets/d/diagram.png").is_file());
        assert!(!bundle.join("notes.txt").exists());
    }

    #[test]
    fn translation_only_bundle_gets_stub() {
        let tmp = vault();
        let mut site = test_site(tmp.path());
        let report = publish_all(&mut site).unwrap();

        assert_eq!(
            read(tmp.path(), "content/wiki/borrowing/index.md"),
            "---\ntitle: 借用\n---\n"
        );
        assert!(tmp.path().join("content/wiki/borrowing/index.zh.md").is_file());
        assert!(!tmp.path().join("content/wiki/ownership/index.zh.md").exists());
        assert_eq!(report.stubs.len(), 1);
    }

    #[test]
    fn unpublished_dirs_are_skipped() {
        let tmp = vault();
        let mut site = test_site(tmp.path());
        let report = publish_all(&mut site).unwrap();
        assert!(report.articles.iter().all(|a| !a.source.ends_with("§ Private.md")));
    }

    #[test]
    fn full_run_writes_backlinks() {
        let tmp = vault();
        let mut site = test_site(tmp.path());
        let report = publish_all(&mut site).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&read(tmp.path(), "data/backlinks.json")).unwrap();
        let entries = json["/wiki/ownership/"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["source_path"], "/posts/hello/");
        assert_eq!(report.backlinks.unwrap().targets, 1);
    }

    #[test]
    fn misnamed_version_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "vault/§ Blog/Posts/Hello/§ Goodbye.md", "# Goodbye\n");
        let mut site = test_site(tmp.path());
        assert!(matches!(
            publish_all(&mut site),
            Err(PublishError::InvalidVersion(_))
        ));
    }

    #[test]
    fn conversion_errors_abort_the_run() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "vault/§ Blog/Posts/Hello/§ Hello.md", "no title\n");
        let mut site = test_site(tmp.path());
        assert!(matches!(publish_all(&mut site), Err(PublishError::Convert(_))));
        assert!(!tmp.path().join("data/backlinks.json").exists());
    }

    #[test]
    fn check_writes_nothing() {
        let tmp = vault();
        let mut site = test_site(tmp.path());
        let report = check_all(&mut site).unwrap();
        assert_eq!(report.articles.len(), 4);
        assert!(!tmp.path().join("content").exists());
        assert!(!tmp.path().join("data").exists());
    }

    #[test]
    fn changed_article_republishes_only_its_bundle() {
        let tmp = vault();
        let mut site = test_site(tmp.path());
        let changed = tmp.path().join("vault/§ Blog/Posts/2023 - Hello/§ Hello.md");
        let report = publish_changed(&mut site, &[changed]).unwrap();

        assert_eq!(report.articles.len(), 1);
        assert!(tmp.path().join("content/posts/hello/index.md").is_file());
        assert!(!tmp.path().join("content/wiki").exists());
        assert!(!tmp.path().join("data/backlinks.json").exists());
    }

    #[test]
    fn changed_include_republishes_neighbours() {
        let tmp = vault();
        let part = write_file(tmp.path(), "vault/§ Blog/Posts/2023 - Hello/Part.md", "part\n");
        let mut site = test_site(tmp.path());
        let report = publish_changed(&mut site, &[part]).unwrap();
        assert_eq!(report.articles.len(), 2);
    }

    #[test]
    fn changed_non_markdown_is_ignored() {
        let tmp = vault();
        let mut site = test_site(tmp.path());
        let changed = tmp.path().join("vault/§ Blog/Posts/2023 - Hello/cover.jpg");
        let report = publish_changed(&mut site, &[changed]).unwrap();
        assert!(report.articles.is_empty());
    }

    #[test]
    fn watchexec_paths_joined_with_common_path() {
        let lookup = env(&[
            ("WATCHEXEC_COMMON_PATH", "/home/me/vault"),
            ("WATCHEXEC_WRITTEN_PATH", "/a/§ A.md:b/§ B.md"),
            ("WATCHEXEC_CREATED_PATH", "/a/§ A.md"),
        ]);
        assert_eq!(
            changed_paths_from(lookup),
            vec![
                PathBuf::from("/home/me/vault/a/§ A.md"),
                PathBuf::from("/home/me/vault/b/§ B.md"),
            ]
        );
    }

    #[test]
    fn watchexec_paths_without_common_path() {
        let lookup = env(&[("WATCHEXEC_RENAMED_PATH", "/x/§ X.md::")]);
        assert_eq!(changed_paths_from(lookup), vec![PathBuf::from("/x/§ X.md")]);
    }

    #[test]
    fn watchexec_detection() {
        assert!(is_watchexec(env(&[("WATCHEXEC_REMOVED_PATH", "/x")])));
        assert!(!is_watchexec(env(&[("HOME", "/root")])));
    }
}
