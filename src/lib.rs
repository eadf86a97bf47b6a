#![forbid(unsafe_code)]
//! testsel: run tests by file, directory, `file:line` or name
//!
//! Resolves a command-line test invocation into the minimal set of test files to load and an
//! optional test-name filter. A `file:line` target is mapped to the test method whose source
//! span contains that line.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod version;

pub use cli::config::RunnerConfig;
pub use cli::locator::{RunnableUnit, SuiteOrder, locate};
pub use cli::registry::{Registry, Suite, TestMethod};
pub use cli::request::{Request, RequestError};
pub use cli::test_files::TestPattern;
pub use cli::test_interfaces::{CommandExecutor, RunOutcome, SourceLoader, TestError, TestExecutor, TestLoader};
pub use cli::test_runner::{ResolvedPlan, RunContext, TestRunner};
