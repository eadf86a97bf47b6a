//! Test runner I/O boundary interfaces
//!
//! This module defines trait-based abstractions for the collaborators the runner drives:
//! - Loading a test file into the registry
//! - Executing the resolved plan
//!
//! The default implementations scan Ruby test sources ([`SourceLoader`]) and hand the plan to
//! a `ruby` process ([`CommandExecutor`]).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use super::config::RunnerConfig;
use super::registry::Registry;
use super::source_scan::scan_suites;
use super::test_runner::RunContext;

/// Errors that occur while loading or running tests
#[derive(Debug, Error)]
pub enum TestError {
    #[error("cannot load such file -- {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to load {}: {}", .path.display(), .message)]
    Load { path: PathBuf, message: String },

    #[error("failed to discover test files: {0}")]
    Discovery(#[from] walkdir::Error),

    #[error("test execution failed: {0}")]
    Execution(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result of handing a plan to an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    /// At least one test failed; `code` is the executor's exit code
    Failed { code: i32 },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Passed)
    }
}

// ============================================================================
// Loader Interface
// ============================================================================

/// Load a test file, registering its suites.
///
/// Called once per resolved file, before any lookup. Errors are fatal to the run.
pub trait TestLoader {
    fn load(&mut self, path: &Path, registry: &mut Registry) -> Result<(), TestError>;
}

// ============================================================================
// Executor Interface
// ============================================================================

/// Execute a resolved plan.
///
/// The run context carries everything the executor may query: files, the effective name
/// filter and the backtrace preference.
pub trait TestExecutor {
    fn execute(&self, ctx: &RunContext<'_>) -> Result<RunOutcome, TestError>;
}

// ============================================================================
// Default Implementations
// ============================================================================

/// Loads Ruby test files by scanning their declarations.
#[derive(Debug, Default)]
pub struct SourceLoader {
    loaded: Vec<PathBuf>,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files loaded so far, in load order
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }
}

impl TestLoader for SourceLoader {
    fn load(&mut self, path: &Path, registry: &mut Registry) -> Result<(), TestError> {
        if !path.is_file() {
            return Err(TestError::FileNotFound(path.to_path_buf()));
        }

        let source = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => TestError::Load {
                path: path.to_path_buf(),
                message: "file is not valid UTF-8".to_string(),
            },
            _ => TestError::Io(e),
        })?;

        let suites = scan_suites(path, &source);
        tracing::debug!(file = %path.display(), suites = suites.len(), "loaded test file");
        for suite in suites {
            registry.add_suite(suite);
        }
        self.loaded.push(path.to_path_buf());
        Ok(())
    }
}

/// Requires each file, then leaves the remaining arguments to minitest's autorun.
const RUBY_BOOTSTRAP: &str = r#"files = ARGV.take_while { |arg| arg != "--" }
ARGV.shift(files.size + 1)
files.each { |file| require file }"#;

/// Runs the plan in a `ruby` subprocess, inheriting stdio.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    ruby: String,
    load_paths: Vec<PathBuf>,
}

impl CommandExecutor {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            ruby: config.ruby.clone(),
            load_paths: config.load_paths.clone(),
        }
    }

    /// The command that would run `ctx`.
    pub fn command(&self, ctx: &RunContext<'_>) -> Command {
        let mut cmd = Command::new(&self.ruby);
        for dir in &self.load_paths {
            cmd.arg(format!("-I{}", dir.display()));
        }
        cmd.arg("-e").arg(RUBY_BOOTSTRAP).arg("--");
        cmd.args(ctx.files());
        cmd.arg("--");
        if let Some(name) = ctx.find_method() {
            cmd.arg("-n").arg(name);
        }
        if ctx.show_backtrace() {
            cmd.env("BACKTRACE", "1");
        }
        cmd
    }
}

impl TestExecutor for CommandExecutor {
    fn execute(&self, ctx: &RunContext<'_>) -> Result<RunOutcome, TestError> {
        let mut cmd = self.command(ctx);
        tracing::debug!(?cmd, "spawning test process");

        let status = cmd
            .status()
            .map_err(|e| TestError::Execution(format!("failed to run '{}': {}", self.ruby, e)))?;

        if status.success() {
            Ok(RunOutcome::Passed)
        } else {
            Ok(RunOutcome::Failed {
                code: status.code().unwrap_or(1),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::request::Request;
    use crate::cli::test_runner::ResolvedPlan;
    use std::ffi::OsStr;

    #[test]
    fn test_source_loader_registers_suites() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("user_test.rb");
        fs::write(&file, "class UserTest < Minitest::Test\n  def test_a\n    assert true\n  end\nend\n").unwrap();

        let mut loader = SourceLoader::new();
        let mut registry = Registry::new();
        loader.load(&file, &mut registry).unwrap();

        assert_eq!(registry.method_count(), 1);
        assert_eq!(loader.loaded(), &[file]);
    }

    #[test]
    fn test_source_loader_missing_file() {
        let mut registry = Registry::new();
        let err = SourceLoader::new()
            .load(Path::new("/definitely/not/here_test.rb"), &mut registry)
            .unwrap_err();
        assert!(matches!(err, TestError::FileNotFound(_)));
        assert!(err.to_string().contains("/definitely/not/here_test.rb"));
    }

    #[test]
    fn test_source_loader_rejects_binary() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bin_test.rb");
        fs::write(&file, [0xff, 0xfe, 0x00]).unwrap();

        let err = SourceLoader::new().load(&file, &mut Registry::new()).unwrap_err();
        assert!(matches!(err, TestError::Load { .. }));
    }

    #[test]
    fn test_command_includes_files_filter_and_backtrace() {
        let request = Request {
            backtrace: true,
            ..Request::default()
        };
        let plan = ResolvedPlan {
            files_to_load: vec![PathBuf::from("/app/test/a_test.rb")],
            effective_name_filter: Some("test_login".to_string()),
        };
        let registry = Registry::new();
        let ctx = RunContext::new(&request, &plan, &registry);

        let executor = CommandExecutor::new(&RunnerConfig::default());
        let cmd = executor.command(&ctx);

        assert_eq!(cmd.get_program(), OsStr::new("ruby"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args[0], "-Itest");
        assert_eq!(args[1], "-e");
        assert_eq!(&args[3..], &["--", "/app/test/a_test.rb", "--", "-n", "test_login"]);

        let backtrace = cmd.get_envs().find(|(k, _)| *k == OsStr::new("BACKTRACE"));
        assert_eq!(backtrace, Some((OsStr::new("BACKTRACE"), Some(OsStr::new("1")))));
    }

    #[test]
    fn test_command_without_filter() {
        let request = Request::default();
        let plan = ResolvedPlan {
            files_to_load: vec![PathBuf::from("/a_test.rb"), PathBuf::from("/b_test.rb")],
            effective_name_filter: None,
        };
        let registry = Registry::new();
        let ctx = RunContext::new(&request, &plan, &registry);

        let cmd = CommandExecutor::new(&RunnerConfig::default()).command(&ctx);
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args.last().map(String::as_str), Some("--"));
        assert!(!args.iter().any(|a| a == "-n"));
        assert_eq!(cmd.get_envs().count(), 0);
    }
}
