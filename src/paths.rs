//! Resolution of document references against the input file's directory

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resolves relative references against a fixed base directory
///
/// The process working directory is never consulted or changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base_dir: PathBuf,
}

impl PathResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolver rooted at the directory containing `file`
    pub fn for_file(file: &Path) -> Self {
        match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::new(parent),
            _ => Self::new("."),
        }
    }

    /// Join a reference onto the base directory; absolute references pass through
    pub fn resolve(&self, reference: impl AsRef<Path>) -> PathBuf {
        let reference = reference.as_ref();
        if reference.is_absolute() {
            reference.to_path_buf()
        } else {
            self.base_dir.join(reference)
        }
    }

    /// Path of an imported document (`<document>.otx` next to the importer)
    pub fn document(&self, document: &str) -> PathBuf {
        self.resolve(format!("{}.otx", document))
    }

    /// Root directory of a dotted package
    ///
    /// Walks one directory up per package component, then descends into the
    /// first component: a file in `root/a/b` with package `a.b` yields `root/a`.
    pub fn package_root(&self, package: &str) -> Option<PathBuf> {
        let components: Vec<&str> = package.split('.').collect();
        let first = components.first().filter(|c| !c.is_empty())?;

        let mut root = self.base_dir.clone();
        for _ in &components {
            root.push("..");
        }
        root.push(first);
        Some(root)
    }
}

/// All `.otx` files below a directory, sorted for stable ordering
pub fn find_otx_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("otx"))
        .collect();
    files.sort();
    files
}

/// Whether two paths name the same file
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
