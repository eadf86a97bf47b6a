//! Test file discovery
//!
//! Resolves a [`Request`] into the files to load: the explicit file, every match of a directory
//! pattern, or every match of the default pattern under the configured test root.

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::config::RunnerConfig;
use super::request::Request;
use super::test_interfaces::TestError;

/// A recursive file pattern, `<root>/**/*<suffix>`.
///
/// Like a shell glob, hidden files and directories are not matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPattern {
    root: PathBuf,
    suffix: String,
}

impl TestPattern {
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether `path` would be produced by [`TestPattern::expand`], ignoring existence.
    pub fn matches(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        let mut names = relative.components().map(|c| c.as_os_str().to_string_lossy());
        let Some(file_name) = relative.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        !names.any(|name| name.starts_with('.')) && file_name.ends_with(self.suffix.as_str())
    }

    /// Every matching file on disk, in directory-walk order sorted by file name.
    ///
    /// A missing root yields no files.
    pub fn expand(&self) -> Result<Vec<PathBuf>, TestError> {
        if !self.root.is_dir() {
            tracing::debug!(root = %self.root.display(), "pattern root is not a directory");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if entry.depth() > 0 && path.is_file() && self.matches(path) {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }
}

impl fmt::Display for TestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/**/*{}", self.root.display(), self.suffix)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// The pattern used when no target was given.
pub fn default_pattern(config: &RunnerConfig, cwd: &Path) -> TestPattern {
    TestPattern::new(path_clean::clean(cwd.join(&config.test_root)), config.test_suffix.as_str())
}

/// Resolve the candidate files for a request.
///
/// An explicit filename is returned as-is without checking that it exists; the loader reports
/// missing files. An empty result is not an error.
#[tracing::instrument(skip_all)]
pub fn resolve(request: &Request, config: &RunnerConfig, cwd: &Path) -> Result<Vec<PathBuf>, TestError> {
    if let Some(filename) = &request.filename {
        return Ok(vec![filename.clone()]);
    }

    let pattern = match &request.pattern {
        Some(pattern) => pattern.clone(),
        None => default_pattern(config, cwd),
    };

    let files = pattern.expand()?;
    if files.is_empty() {
        tracing::info!("no test files match {}", pattern);
    } else {
        tracing::debug!(count = files.len(), "resolved test files from {}", pattern);
    }
    Ok(files)
}
