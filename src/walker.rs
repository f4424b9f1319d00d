//! Source file collection.
//!
//! Walks the project root with the `ignore` crate (so `.gitignore`,
//! `.git/info/exclude` and the global gitignore are respected), skips the
//! always-excluded directory names, filters by extension allow-list and
//! optional include globs, and returns relative paths in a deterministic
//! order. Filesystem iteration order is untrusted input; an explicit sort
//! happens before anything downstream sees the list.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use ignore::WalkBuilder;
use thiserror::Error;

use crate::extract::Language;

/// Directory names never descended into, regardless of gitignore content.
pub const SKIP_ALWAYS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".venv",
    "venv",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".idea",
    ".vscode",
    "node_modules",
    "dist",
    "build",
    "target",
];

/// Errors that can occur while collecting files.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("root not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for file collection.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Extension allow-list (lowercase, no dot). `None` means every
    /// extension with a registered grammar.
    pub extensions: Option<Vec<CompactString>>,
    /// Directory names skipped entirely (not descended into).
    pub exclude_dirs: Vec<CompactString>,
    /// When non-empty, a file's relative path must match at least one.
    pub include_globs: Vec<glob::Pattern>,
    /// Respect .gitignore patterns.
    pub respect_gitignore: bool,
    /// Include hidden files and directories.
    pub include_hidden: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            extensions: None,
            exclude_dirs: SKIP_ALWAYS.iter().map(|d| CompactString::from(*d)).collect(),
            include_globs: Vec::new(),
            respect_gitignore: true,
            include_hidden: false,
        }
    }
}

/// A collected candidate file. Identity is the `/`-normalized relative
/// path; the absolute path is what gets read later.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the collection root, `/`-separated on every platform.
    pub relative: String,
    /// On-disk path.
    pub path: PathBuf,
    /// Grammar responsible for this file, if any is registered for its
    /// extension. `None` surfaces as an unsupported-file-type failure at
    /// extraction time, never silently.
    pub language: Option<Language>,
}

/// Collect candidate files under `root`.
///
/// Unreadable files are NOT errors here; they are reported per file by the
/// extraction stage. The only fatal condition is a missing or non-directory
/// root.
///
/// # Examples
///
/// ```no_run
/// use marrow::walker::{collect, CollectOptions};
/// use std::path::Path;
///
/// let files = collect(Path::new("./project"), &CollectOptions::default()).unwrap();
/// for file in &files {
///     println!("{}", file.relative);
/// }
/// ```
pub fn collect(root: &Path, options: &CollectOptions) -> Result<Vec<SourceFile>, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .follow_links(false);

    let excluded = options.exclude_dirs.clone();
    builder.filter_entry(move |entry| {
        // Never filter the root itself, whatever it is named.
        if entry.depth() == 0 {
            return true;
        }
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        if !is_dir {
            return true;
        }
        entry
            .file_name()
            .to_str()
            .map_or(true, |name| !excluded.iter().any(|d| d == name))
    });

    let mut files = Vec::new();

    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            // Per-entry walk errors (unreadable subdirectories and the
            // like) are skipped; the files we did reach still get reported.
            Err(_) => continue,
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let allowed = match (&options.extensions, &extension) {
            (Some(allow), Some(ext)) => allow.iter().any(|a| a == ext.as_str()),
            (Some(_), None) => false,
            (None, Some(ext)) => Language::from_extension(ext).is_some(),
            (None, None) => false,
        };
        if !allowed {
            continue;
        }

        let relative = relative_path(path, root);

        if !options.include_globs.is_empty()
            && !options.include_globs.iter().any(|p| p.matches(&relative))
        {
            continue;
        }

        let language = extension.as_deref().and_then(Language::from_extension);

        files.push(SourceFile {
            relative,
            path: path.to_path_buf(),
            language,
        });
    }

    files.sort_by(|a, b| path_order(&a.relative, &b.relative));
    Ok(files)
}

/// Relative path from `root`, joined with `/` regardless of platform.
fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

/// Deterministic ordering over `/`-separated relative paths: parents come
/// before their children, directories sort before files at the same level,
/// names compare bytewise within a level. This is exactly the depth-first
/// order of the rendered tree, so the combined-source section and the tree
/// agree without further coordination.
pub(crate) fn path_order(a: &str, b: &str) -> Ordering {
    let av: Vec<&str> = a.split('/').collect();
    let bv: Vec<&str> = b.split('/').collect();

    for i in 0.. {
        match (av.get(i), bv.get(i)) {
            (Some(x), Some(y)) => {
                let a_dir = i + 1 < av.len();
                let b_dir = i + 1 < bv.len();
                if x == y {
                    if a_dir == b_dir {
                        continue;
                    }
                    // A name cannot be both a file and a directory in one
                    // tree, but order it anyway: directories first.
                    return if a_dir { Ordering::Less } else { Ordering::Greater };
                }
                return match (a_dir, b_dir) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => x.cmp(y),
                };
            }
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
        }
    }

    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/app.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("src/util.py"), "y = 2\n").unwrap();
        fs::write(dir.path().join("main.py"), "z = 3\n").unwrap();
        fs::write(dir.path().join("README.md"), "# readme\n").unwrap();
        dir
    }

    #[test]
    fn collect_filters_to_supported_extensions() {
        let dir = create_test_dir();
        let files = collect(dir.path(), &CollectOptions::default()).unwrap();
        let rels: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(rels, ["src/app.py", "src/util.py", "main.py"]);
    }

    #[test]
    fn collect_nonexistent_root() {
        let result = collect(Path::new("/nonexistent/path"), &CollectOptions::default());
        assert!(matches!(result, Err(WalkError::NotFound { .. })));
    }

    #[test]
    fn collect_root_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("single.py");
        fs::write(&file, "x = 1\n").unwrap();
        let result = collect(&file, &CollectOptions::default());
        assert!(matches!(result, Err(WalkError::NotADirectory { .. })));
    }

    #[test]
    fn collect_skips_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("__pycache__")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("__pycache__/cached.py"), "").unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(dir.path().join("kept.py"), "").unwrap();

        let files = collect(dir.path(), &CollectOptions::default()).unwrap();
        let rels: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(rels, ["kept.py"]);
    }

    #[test]
    fn collect_respects_gitignore() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("visible.py"), "").unwrap();
        fs::write(dir.path().join("generated.py"), "").unwrap();
        fs::write(dir.path().join(".gitignore"), "generated.py\n").unwrap();

        let files = collect(dir.path(), &CollectOptions::default()).unwrap();
        let rels: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(rels, ["visible.py"]);
    }

    #[test]
    fn collect_extension_allow_list() {
        let dir = create_test_dir();
        let options = CollectOptions {
            extensions: Some(vec![CompactString::from("md")]),
            ..Default::default()
        };
        let files = collect(dir.path(), &options).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, "README.md");
        // No grammar registered for markdown.
        assert!(files[0].language.is_none());
    }

    #[test]
    fn collect_include_globs() {
        let dir = create_test_dir();
        let options = CollectOptions {
            include_globs: vec![glob::Pattern::new("src/*").unwrap()],
            ..Default::default()
        };
        let files = collect(dir.path(), &options).unwrap();
        let rels: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(rels, ["src/app.py", "src/util.py"]);
    }

    #[test]
    fn path_order_is_tree_depth_first() {
        let mut paths = vec!["b.py", "a/z.py", "z/a.py", "a/b/c.py", "a.py", "a/a.py"];
        paths.sort_by(|a, b| path_order(a, b));
        assert_eq!(
            paths,
            ["a/b/c.py", "a/a.py", "a/z.py", "z/a.py", "a.py", "b.py"]
        );
    }

    #[test]
    fn collect_order_is_stable() {
        let dir = create_test_dir();
        let first = collect(dir.path(), &CollectOptions::default()).unwrap();
        let second = collect(dir.path(), &CollectOptions::default()).unwrap();
        let a: Vec<&str> = first.iter().map(|f| f.relative.as_str()).collect();
        let b: Vec<&str> = second.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(a, b);
    }
}
