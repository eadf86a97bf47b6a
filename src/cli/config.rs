//! Runner configuration
//!
//! Defaults follow the Rails layout: tests live under `test/` and are named `*_test.rb`.
//! Every field can be overridden from the environment via [`RunnerConfig::from_env`].

use std::env;
use std::path::PathBuf;

use super::locator::SuiteOrder;

/// Environment variable overriding [`RunnerConfig::test_root`].
pub const ENV_TEST_ROOT: &str = "TESTSEL_TEST_ROOT";
/// Environment variable overriding [`RunnerConfig::test_suffix`].
pub const ENV_TEST_SUFFIX: &str = "TESTSEL_TEST_SUFFIX";
/// Environment variable overriding [`RunnerConfig::ruby`].
pub const ENV_RUBY: &str = "TESTSEL_RUBY";
/// Environment variable overriding [`RunnerConfig::suite_order`] (`shuffled` or `declared`).
pub const ENV_SUITE_ORDER: &str = "TESTSEL_SUITE_ORDER";

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Conventional test directory, relative to the working directory
    pub test_root: PathBuf,
    /// File-name suffix identifying test files
    pub test_suffix: String,
    /// Ruby interpreter used by the command executor
    pub ruby: String,
    /// Directories added to Ruby's load path (`-I`)
    pub load_paths: Vec<PathBuf>,
    /// Order in which suites are visited when locating a test by line
    pub suite_order: SuiteOrder,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            test_root: PathBuf::from("test"),
            test_suffix: "_test.rb".to_string(),
            ruby: "ruby".to_string(),
            load_paths: vec![PathBuf::from("test")],
            suite_order: SuiteOrder::Shuffled,
        }
    }
}

impl RunnerConfig {
    /// Defaults with any `TESTSEL_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(root) = get(ENV_TEST_ROOT) {
            config = config.with_test_root(root);
        }
        if let Some(suffix) = get(ENV_TEST_SUFFIX) {
            config.test_suffix = suffix;
        }
        if let Some(ruby) = get(ENV_RUBY) {
            config.ruby = ruby;
        }
        if let Some(order) = get(ENV_SUITE_ORDER) {
            match order.parse::<SuiteOrder>() {
                Ok(order) => config.suite_order = order,
                Err(e) => tracing::warn!("ignoring {}: {}", ENV_SUITE_ORDER, e),
            }
        }
        config
    }

    /// Set the test root. The load path follows it.
    pub fn with_test_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.load_paths = vec![root.clone()];
        self.test_root = root;
        self
    }

    /// Set the test-file suffix
    pub fn with_test_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.test_suffix = suffix.into();
        self
    }

    /// Set the suite order used by the method locator
    pub fn with_suite_order(mut self, order: SuiteOrder) -> Self {
        self.suite_order = order;
        self
    }
}
