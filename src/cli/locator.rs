//! Method locator: maps a `(file, line)` pair to the test method whose span contains it.
//!
//! Suites are visited in randomized order by default, mirroring minitest's own randomized
//! suite order. Spans of well-formed test methods never overlap, so the order only decides the
//! winner when a registry holds overlapping spans; callers must not rely on that winner.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rand::seq::SliceRandom;

use super::registry::{Registry, Suite, TestMethod};

/// Order in which suites are visited while locating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuiteOrder {
    /// Freshly shuffled on every lookup
    #[default]
    Shuffled,
    /// Registry (load) order
    Declared,
}

impl FromStr for SuiteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shuffled" | "random" => Ok(SuiteOrder::Shuffled),
            "declared" | "sorted" => Ok(SuiteOrder::Declared),
            other => Err(format!("unknown suite order '{}' (expected 'shuffled' or 'declared')", other)),
        }
    }
}

impl fmt::Display for SuiteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteOrder::Shuffled => write!(f, "shuffled"),
            SuiteOrder::Declared => write!(f, "declared"),
        }
    }
}

/// A discoverable test method with its inclusive source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnableUnit<'a> {
    pub declaring_file: &'a Path,
    pub test_name: &'a str,
    pub start_line: u32,
    pub end_line: u32,
}

impl<'a> RunnableUnit<'a> {
    /// Whether `line` falls inside `[start_line, end_line]`.
    pub fn contains(&self, line: u32) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }

    pub fn matches(&self, file: &Path, line: u32) -> bool {
        self.declaring_file == file && self.contains(line)
    }
}

impl<'a> From<&'a TestMethod> for RunnableUnit<'a> {
    fn from(method: &'a TestMethod) -> Self {
        let end_line = method.start_line.saturating_add(method.line_count.max(1) - 1);
        RunnableUnit {
            declaring_file: &method.file,
            test_name: &method.name,
            start_line: method.start_line,
            end_line,
        }
    }
}

/// Every runnable unit in the registry, suites visited in `order`.
pub fn runnable_units(registry: &Registry, order: SuiteOrder) -> Vec<RunnableUnit<'_>> {
    ordered_suites(registry, order)
        .into_iter()
        .flat_map(|suite| suite.methods.iter().map(RunnableUnit::from))
        .collect()
}

/// Find the name of the test declared in `file` whose span contains `line`.
///
/// Returns `None` when nothing matches; the caller then runs the whole file unfiltered.
#[tracing::instrument(skip(registry), fields(suites = registry.suites().len()))]
pub fn locate(registry: &Registry, file: &Path, line: u32, order: SuiteOrder) -> Option<String> {
    let found = runnable_units(registry, order)
        .into_iter()
        .find(|unit| unit.matches(file, line))
        .map(|unit| unit.test_name.to_string());

    match &found {
        Some(name) => tracing::debug!(test = %name, "located test by line"),
        None => tracing::debug!("no test spans the requested line"),
    }
    found
}

fn ordered_suites(registry: &Registry, order: SuiteOrder) -> Vec<&Suite> {
    let mut suites: Vec<&Suite> = registry.suites().iter().collect();
    if order == SuiteOrder::Shuffled {
        suites.shuffle(&mut rand::rng());
    }
    suites
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const USER_TEST: &str = "/app/test/models/user_test.rb";

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.add_suite(
            Suite::new("UserTest")
                .with_method(TestMethod::new("test_validates_email", USER_TEST, 5, 4))
                .with_method(TestMethod::new("test_creates_user", USER_TEST, 20, 11)),
        );
        registry.add_suite(
            Suite::new("PostTest").with_method(TestMethod::new("test_publishes", "/app/test/models/post_test.rb", 20, 11)),
        );
        registry
    }

    #[test]
    fn test_span_end_line() {
        let method = TestMethod::new("test_x", USER_TEST, 20, 11);
        let unit = RunnableUnit::from(&method);
        assert_eq!(unit.start_line, 20);
        assert_eq!(unit.end_line, 30);
    }

    #[test]
    fn test_span_boundaries_are_inclusive() {
        let method = TestMethod::new("test_x", USER_TEST, 20, 11);
        let unit = RunnableUnit::from(&method);
        assert!(!unit.contains(19));
        assert!(unit.contains(20));
        assert!(unit.contains(30));
        assert!(!unit.contains(31));
    }

    #[test]
    fn test_single_line_span() {
        let method = TestMethod::new("test_one_liner", USER_TEST, 7, 1);
        let unit = RunnableUnit::from(&method);
        assert_eq!(unit.end_line, 7);
        assert!(unit.contains(7));
        assert!(!unit.contains(8));
    }

    #[test]
    fn test_locate_by_line() {
        let registry = registry();
        let found = locate(&registry, Path::new(USER_TEST), 27, SuiteOrder::Declared);
        assert_eq!(found.as_deref(), Some("test_creates_user"));
    }

    #[test]
    fn test_locate_requires_matching_file() {
        let registry = registry();
        let found = locate(&registry, Path::new("/app/test/models/post_test.rb"), 27, SuiteOrder::Declared);
        assert_eq!(found.as_deref(), Some("test_publishes"));

        let found = locate(&registry, Path::new("/app/test/models/other_test.rb"), 27, SuiteOrder::Declared);
        assert_eq!(found, None);
    }

    #[test]
    fn test_locate_outside_any_span() {
        let registry = registry();
        assert_eq!(locate(&registry, Path::new(USER_TEST), 999, SuiteOrder::Declared), None);
        assert_eq!(locate(&registry, Path::new(USER_TEST), 12, SuiteOrder::Declared), None);
    }

    #[test]
    fn test_locate_shuffled_is_stable_for_disjoint_spans() {
        let registry = registry();
        for _ in 0..32 {
            let found = locate(&registry, Path::new(USER_TEST), 6, SuiteOrder::Shuffled);
            assert_eq!(found.as_deref(), Some("test_validates_email"));
        }
    }

    #[test]
    fn test_locate_overlapping_spans_returns_a_valid_match() {
        let mut registry = Registry::new();
        registry.add_suite(Suite::new("A").with_method(TestMethod::new("test_a", USER_TEST, 1, 10)));
        registry.add_suite(Suite::new("B").with_method(TestMethod::new("test_b", USER_TEST, 5, 10)));

        for _ in 0..16 {
            let found = locate(&registry, Path::new(USER_TEST), 7, SuiteOrder::Shuffled).unwrap();
            assert!(found == "test_a" || found == "test_b");
        }
        assert_eq!(
            locate(&registry, Path::new(USER_TEST), 7, SuiteOrder::Declared).as_deref(),
            Some("test_a")
        );
    }

    #[test]
    fn test_runnable_units_declared_order() {
        let registry = registry();
        let names: Vec<_> = runnable_units(&registry, SuiteOrder::Declared)
            .iter()
            .map(|u| u.test_name)
            .collect();
        assert_eq!(names, vec!["test_validates_email", "test_creates_user", "test_publishes"]);
        assert_eq!(runnable_units(&registry, SuiteOrder::Shuffled).len(), 3);
    }

    #[test]
    fn test_suite_order_parse() {
        assert_eq!("declared".parse::<SuiteOrder>().unwrap(), SuiteOrder::Declared);
        assert_eq!("Shuffled".parse::<SuiteOrder>().unwrap(), SuiteOrder::Shuffled);
        assert!("sideways".parse::<SuiteOrder>().is_err());
        assert_eq!(SuiteOrder::Declared.to_string(), "declared");
    }
}
