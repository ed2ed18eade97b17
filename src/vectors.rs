//! Conversion test vectors.
//!
//! A vector is a pair of files in a directory tree: `name.in.md` is the
//! source article and `name.out.md` the exact expected document. Each run
//! converts the input and, when asked, saves the actual output next to it as
//! `name.real.md` for diffing.

use crate::convert::{ConvertError, convert_article};
use crate::site::Site;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

const INPUT_SUFFIX: &str = ".in.md";
const EXPECTED_SUFFIX: &str = ".out.md";
const ACTUAL_SUFFIX: &str = ".real.md";

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{0}")]
    Convert(#[from] ConvertError),
    #[error("Missing expected output: {0}")]
    MissingExpected(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail { expected: String, actual: String },
}

#[derive(Debug, Clone)]
pub struct VectorResult {
    /// The `.in.md` file.
    pub input: PathBuf,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct VerifyReport {
    pub results: Vec<VectorResult>,
}

impl VerifyReport {
    pub fn failures(&self) -> impl Iterator<Item = &VectorResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Fail { .. }))
    }

    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Sibling of a vector input with another suffix.
fn sibling(input: &Path, suffix: &str) -> PathBuf {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(INPUT_SUFFIX).unwrap_or(name);
    input.with_file_name(format!("{stem}{suffix}"))
}

/// Run every vector below `dir`, in path order.
///
/// With `save_actual` the converted output is written as `.real.md`.
pub fn verify_dir(site: &mut Site, dir: &Path, save_actual: bool) -> Result<VerifyReport, VectorError> {
    let mut report = VerifyReport::default();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let is_input = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.ends_with(INPUT_SUFFIX));
        if !entry.file_type().is_file() || !is_input {
            continue;
        }
        report.results.push(verify_one(site, entry.path(), save_actual)?);
    }
    Ok(report)
}

fn verify_one(site: &mut Site, input: &Path, save_actual: bool) -> Result<VectorResult, VectorError> {
    debug!(vector = %input.display(), "verify");
    let expected_path = sibling(input, EXPECTED_SUFFIX);
    if !expected_path.is_file() {
        return Err(VectorError::MissingExpected(expected_path));
    }

    let actual = convert_article(site, input)?.document;
    if save_actual {
        fs::write(sibling(input, ACTUAL_SUFFIX), &actual)?;
    }
    let expected = fs::read_to_string(&expected_path)?;

    let outcome = if expected == actual {
        Outcome::Pass
    } else {
        Outcome::Fail { expected, actual }
    };
    Ok(VectorResult {
        input: input.to_path_buf(),
        outcome,
    })
}
