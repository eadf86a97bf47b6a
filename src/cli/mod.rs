//! CLI module for testsel
//!
//! `testsel [options] [path[:line]]` resolves a test invocation into the files to load and an
//! optional test-name filter, then runs them.
//!
//! ## Modules
//!
//! - `request` - Option parsing into a normalized `Request`
//! - `test_files` - Candidate file discovery
//! - `registry` / `source_scan` - Loaded suites and the default source loader
//! - `locator` - Line-to-test lookup
//! - `test_runner` - Orchestration and the run context
//! - `test_interfaces` - Loader/executor traits and default implementations
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod config;
pub mod locator;
pub mod registry;
pub mod request;
pub mod source_scan;
pub mod test_files;
pub mod test_interfaces;
pub mod test_runner;

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::process;

use clap::Parser;

use crate::version::TESTSEL_VERSION;
use config::RunnerConfig;
use request::{Request, RequestError};
use test_interfaces::{CommandExecutor, RunOutcome, SourceLoader, TestError};
use test_runner::TestRunner;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<RequestError> for CliError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Usage(message) => CliError::failure(message),
            other => CliError::failure(format!("error: {}\n\nFor more information, try '--help'.", other)),
        }
    }
}

impl From<TestError> for CliError {
    fn from(err: TestError) -> Self {
        CliError::failure(format!("error: {}", err))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

const FILTER_HELP: &str = "\
You can run a single test by appending the line number to filename:

    testsel test/models/user_test.rb:27";

/// Run tests by file, directory, file:line or name
#[derive(Parser, Debug)]
#[command(name = "testsel")]
#[command(version = TESTSEL_VERSION)]
#[command(about = "Run tests by file, directory, file:line or name", long_about = None)]
#[command(after_help = FILTER_HELP)]
pub struct Cli {
    /// Only run tests matching NAME
    #[arg(short = 'n', long = "name", value_name = "NAME", help_heading = "Filter options")]
    pub name: Option<String>,

    /// Show the complete backtrace
    #[arg(short = 'b', long = "backtrace", help_heading = "Output options")]
    pub backtrace: bool,

    /// Print the resolved plan as JSON instead of running it
    #[arg(long = "plan", help_heading = "Output options")]
    pub plan: bool,

    /// Test file (optionally file:line) or directory
    ///
    /// Option parsing stops at the first positional; everything after it is collected as is.
    #[arg(value_name = "PATH", num_args = 1.., trailing_var_arg = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// The first positional argument.
    pub fn target(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Tokens after the target. They are not interpreted.
    pub fn rest(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    match execute(env::args_os()) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Parse `args` (program name first), resolve and run.
pub fn execute<I, T>(args: I) -> CliResult<ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match request::parse_args(args) {
        Ok(cli) => cli,
        Err(RequestError::DisplayInfo(text)) => {
            print!("{}", text);
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e.into()),
    };

    let config = RunnerConfig::from_env();
    let cwd = env::current_dir()
        .map_err(|e| CliError::failure(format!("error: cannot read working directory: {}", e)))?;
    let request = Request::from_cli(&cli, &cwd, &config)?;

    let runner = TestRunner::new(request, config, cwd);
    let mut loader = SourceLoader::new();

    if cli.plan {
        let (plan, _) = runner.plan(&mut loader)?;
        let json = serde_json::to_string_pretty(&plan)
            .map_err(|e| CliError::failure(format!("error: cannot serialize plan: {}", e)))?;
        println!("{}", json);
        return Ok(ExitCode::SUCCESS);
    }

    let executor = CommandExecutor::new(runner.config());
    match runner.run(&mut loader, &executor)? {
        RunOutcome::Passed => Ok(ExitCode::SUCCESS),
        // Tests failed - the executor already reported them
        RunOutcome::Failed { code } => Err(CliError::new("", ExitCode(code))),
    }
}

// ============================================================================
// Tests
// ============================================================================
