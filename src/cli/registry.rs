//! In-process registry of loaded test suites
//!
//! Loaders populate the registry; the method locator only reads it. Each method carries its
//! declaring file, starting line and line count so spans never have to be recomputed from source.

use std::path::{Path, PathBuf};

/// A single declared test method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMethod {
    pub name: String,
    /// Absolute path of the file declaring the method
    pub file: PathBuf,
    /// 1-based line of the declaration
    pub start_line: u32,
    /// Number of source lines the declaration occupies (at least 1)
    pub line_count: u32,
}

impl TestMethod {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, start_line: u32, line_count: u32) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            start_line,
            line_count: line_count.max(1),
        }
    }
}

/// A group of test methods (a test class)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub name: String,
    pub methods: Vec<TestMethod>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: TestMethod) -> Self {
        self.methods.push(method);
        self
    }
}

/// All suites loaded for the current run, in load order
#[derive(Debug, Default)]
pub struct Registry {
    suites: Vec<Suite>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suite. Suites without methods are kept; they simply never match.
    pub fn add_suite(&mut self, suite: Suite) {
        tracing::trace!(suite = %suite.name, methods = suite.methods.len(), "registered suite");
        self.suites.push(suite);
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    pub fn method_count(&self) -> usize {
        self.suites.iter().map(|s| s.methods.len()).sum()
    }

    /// Methods declared in `file`, across all suites.
    pub fn methods_in<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a TestMethod> + 'a {
        self.suites
            .iter()
            .flat_map(|s| s.methods.iter())
            .filter(move |m| m.file == file)
    }
}
