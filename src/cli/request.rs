//! Request parsing
//!
//! Turns raw command-line tokens into a normalized [`Request`]. Option syntax is handled by
//! clap; this module maps clap's failures onto [`RequestError`] and interprets the positional
//! target, which is either a directory or `path[:line]`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use thiserror::Error;

use super::Cli;
use super::config::RunnerConfig;
use super::test_files::TestPattern;

/// Errors produced while turning command-line tokens into a [`Request`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid option: {0}")]
    UnknownOption(String),

    #[error("invalid line number '{value}' in '{arg}'")]
    InvalidLineNumber { arg: String, value: String },

    #[error("{0}")]
    Usage(String),

    /// Help or version text was requested. Not a failure: print it and exit 0.
    #[error("{0}")]
    DisplayInfo(String),
}

impl From<clap::Error> for RequestError {
    fn from(err: clap::Error) -> Self {
        let rendered = err.render().to_string();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                RequestError::DisplayInfo(rendered)
            }
            ErrorKind::UnknownArgument => match err.get(ContextKind::InvalidArg) {
                Some(ContextValue::String(token)) if token.starts_with('-') => {
                    RequestError::UnknownOption(token.clone())
                }
                _ => RequestError::Usage(rendered.trim_end().to_string()),
            },
            _ => RequestError::Usage(rendered.trim_end().to_string()),
        }
    }
}

/// A normalized test invocation.
///
/// `filename` and `pattern` are never both set. `name`, when present, wins over `line`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub name: Option<String>,
    /// Absolute path of a single test file
    pub filename: Option<PathBuf>,
    pub line: Option<u32>,
    /// Recursive pattern built from a directory target
    pub pattern: Option<TestPattern>,
    pub backtrace: bool,
}

/// What the positional argument refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Directory(TestPattern),
    File { path: PathBuf, line: Option<u32> },
}

/// Parse raw tokens (program name first) into the CLI definition.
pub fn parse_args<I, T>(args: I) -> Result<Cli, RequestError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Ok(Cli::try_parse_from(args)?)
}

impl Request {
    /// Build a request from parsed options, resolving the target against `cwd`.
    pub fn from_cli(cli: &Cli, cwd: &Path, config: &RunnerConfig) -> Result<Self, RequestError> {
        if !cli.rest().is_empty() {
            tracing::warn!("ignoring extra arguments: {}", cli.rest().join(" "));
        }

        let mut request = Request {
            name: cli.name.clone(),
            backtrace: cli.backtrace,
            ..Request::default()
        };

        match cli.target().map(|arg| parse_target(arg, cwd, &config.test_suffix)) {
            Some(Ok(Target::Directory(pattern))) => request.pattern = Some(pattern),
            Some(Ok(Target::File { path, line })) => {
                request.filename = Some(path);
                request.line = line;
            }
            Some(Err(e)) => return Err(e),
            None => {}
        }

        tracing::debug!(?request, "parsed request");
        Ok(request)
    }

    /// Shorthand for [`parse_args`] followed by [`Request::from_cli`].
    pub fn parse<I, T>(args: I, cwd: &Path, config: &RunnerConfig) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = parse_args(args)?;
        Self::from_cli(&cli, cwd, config)
    }
}

/// Interpret the positional argument.
///
/// An existing directory becomes a recursive pattern. Anything else is `path[:line]`, split on
/// the last colon. An empty line part (`file.rb:`) means no line.
pub fn parse_target(arg: &str, cwd: &Path, test_suffix: &str) -> Result<Target, RequestError> {
    let candidate = cwd.join(arg);
    if candidate.is_dir() {
        return Ok(Target::Directory(TestPattern::new(
            path_clean::clean(&candidate),
            test_suffix,
        )));
    }

    let (path, line) = match arg.rsplit_once(':') {
        Some((path, "")) => (path, None),
        Some((path, line)) => (path, Some(parse_line(arg, line)?)),
        None => (arg, None),
    };

    Ok(Target::File {
        path: path_clean::clean(cwd.join(path)),
        line,
    })
}

fn parse_line(arg: &str, value: &str) -> Result<u32, RequestError> {
    let invalid = || RequestError::InvalidLineNumber {
        arg: arg.to_string(),
        value: value.to_string(),
    };
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse::<u32>().map_err(|_| invalid())
}
