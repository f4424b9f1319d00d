//! Pipeline orchestration and fluent API.
//!
//! Wires the stages together: collect → read + extract per file (in
//! parallel, each file independent) → re-sort into collector order →
//! assemble. Completion timing never reaches the document; the explicit
//! re-sort restores the deterministic path order before rendering.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use rayon::prelude::*;

use crate::errors::MarrowError;
use crate::extract::{extract_file, FileReport, ParseFailure};
use crate::report::{render, to_json, ReportOptions};
use crate::walker::{collect, path_order, CollectOptions, SourceFile};

/// Builder for producing a context document from a source tree.
///
/// # Examples
///
/// ```no_run
/// use marrow::builder::Marrow;
///
/// let doc = Marrow::new("./my-project")
///     .include_source(true)
///     .build()
///     .unwrap();
///
/// println!("{}", doc.text);
/// ```
pub struct Marrow {
    root: PathBuf,
    options: CollectOptions,
    include_source: bool,
}

impl Marrow {
    /// Create a builder for the given root path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: CollectOptions::default(),
            include_source: false,
        }
    }

    /// Restrict collection to these extensions (lowercased, no dot).
    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.options.extensions = Some(
            extensions
                .iter()
                .map(|e| CompactString::from(e.trim_start_matches('.').to_lowercase()))
                .collect(),
        );
        self
    }

    /// Skip an additional directory name entirely.
    pub fn exclude_dir(mut self, name: &str) -> Self {
        self.options.exclude_dirs.push(CompactString::from(name));
        self
    }

    /// Only collect files whose relative path matches the pattern.
    pub fn include_glob(mut self, pattern: glob::Pattern) -> Self {
        self.options.include_globs.push(pattern);
        self
    }

    /// Include hidden files and directories.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.options.include_hidden = include;
        self
    }

    /// Respect .gitignore patterns (default: true).
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.options.respect_gitignore = respect;
        self
    }

    /// Append each file's raw text to the document.
    pub fn include_source(mut self, include: bool) -> Self {
        self.include_source = include;
        self
    }

    /// Collect candidate files without extracting.
    pub fn collect(&self) -> Result<Vec<SourceFile>, MarrowError> {
        Ok(collect(&self.root, &self.options)?)
    }

    /// Collect and extract, returning per-file reports in collector order.
    pub fn reports(&self) -> Result<Vec<FileReport>, MarrowError> {
        let files = self.collect()?;
        let include_source = self.include_source;

        let mut reports: Vec<FileReport> = files
            .into_par_iter()
            .map(|file| match std::fs::read_to_string(&file.path) {
                Ok(content) => {
                    let mut report = extract_file(&file, &content);
                    report.lines = bytecount::count(content.as_bytes(), b'\n');
                    if include_source {
                        report.source = Some(content);
                    }
                    report
                }
                Err(e) => FileReport::with_error(
                    file,
                    ParseFailure::message(format!("failed to read: {e}")),
                ),
            })
            .collect();

        reports.sort_by(|a, b| path_order(&a.file.relative, &b.file.relative));
        Ok(reports)
    }

    /// Run the full pipeline and assemble the document.
    pub fn build(self) -> Result<ContextDocument, MarrowError> {
        let root = root_label(&self.root);
        let include_source = self.include_source;
        let reports = self.reports()?;
        let text = render(
            &root,
            &reports,
            &ReportOptions { include_source },
        );
        Ok(ContextDocument {
            root,
            text,
            reports,
        })
    }
}

/// The assembled artifact plus the model it was rendered from.
#[derive(Debug)]
pub struct ContextDocument {
    /// Display name of the root directory.
    pub root: String,
    /// The full five-section text document.
    pub text: String,
    /// Per-file extraction results, in collector order.
    pub reports: Vec<FileReport>,
}

impl ContextDocument {
    pub fn file_count(&self) -> usize {
        self.reports.len()
    }

    /// Files that failed to parse (or read).
    pub fn error_count(&self) -> usize {
        self.reports.iter().filter(|r| r.error.is_some()).count()
    }

    /// The structured model as pretty JSON.
    pub fn to_json(&self) -> Result<String, MarrowError> {
        Ok(to_json(&self.root, &self.reports)?)
    }
}

fn root_label(root: &Path) -> String {
    let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| canonical.to_string_lossy().into_owned())
}

/// Render a context document with default options.
pub fn render_context(root: impl AsRef<Path>) -> Result<String, MarrowError> {
    Ok(Marrow::new(root.as_ref()).build()?.text)
}
