//! Test runner facade
//!
//! Orchestrates one invocation: resolve the candidate files, load them into a fresh
//! [`Registry`], settle the name filter, then hand a [`RunContext`] to the executor.
//!
//! ## Run context
//!
//! Collaborators that need run-scoped state (the executor, a failure reporter) receive a
//! [`RunContext`] borrowed for the duration of [`TestRunner::run`]. Nothing is stored
//! globally, so a runner can be run again with a different loader or executor.

use std::path::PathBuf;

use serde::Serialize;

use super::config::RunnerConfig;
use super::locator::locate;
use super::registry::Registry;
use super::request::Request;
use super::test_files;
use super::test_interfaces::{RunOutcome, TestError, TestExecutor, TestLoader};

/// The files to load and the test-name filter to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedPlan {
    pub files_to_load: Vec<PathBuf>,
    pub effective_name_filter: Option<String>,
}

/// Run-scoped state handed to collaborators.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    request: &'a Request,
    plan: &'a ResolvedPlan,
    registry: &'a Registry,
}

impl<'a> RunContext<'a> {
    pub fn new(request: &'a Request, plan: &'a ResolvedPlan, registry: &'a Registry) -> Self {
        Self {
            request,
            plan,
            registry,
        }
    }

    /// The test name to run, if the run is filtered.
    pub fn find_method(&self) -> Option<&'a str> {
        self.plan.effective_name_filter.as_deref()
    }

    /// Whether failures should show full backtraces.
    pub fn show_backtrace(&self) -> bool {
        self.request.backtrace
    }

    pub fn files(&self) -> &'a [PathBuf] {
        &self.plan.files_to_load
    }

    pub fn plan(&self) -> &'a ResolvedPlan {
        self.plan
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }
}

/// Resolves and runs a single [`Request`].
#[derive(Debug)]
pub struct TestRunner {
    request: Request,
    config: RunnerConfig,
    working_dir: PathBuf,
}

impl TestRunner {
    pub fn new(request: Request, config: RunnerConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            request,
            config,
            working_dir: working_dir.into(),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Candidate files for this request.
    pub fn test_files(&self) -> Result<Vec<PathBuf>, TestError> {
        test_files::resolve(&self.request, &self.config, &self.working_dir)
    }

    /// The explicit name, else the test spanning the requested line.
    ///
    /// Must be called after every file has been loaded into `registry`. A line that no test
    /// spans yields `None`, which means "run everything that was loaded".
    pub fn find_method(&self, registry: &Registry) -> Option<String> {
        if let Some(name) = &self.request.name {
            return Some(name.clone());
        }
        let (Some(filename), Some(line)) = (&self.request.filename, self.request.line) else {
            return None;
        };
        locate(registry, filename, line, self.config.suite_order)
    }

    /// Resolve, load and settle the filter without executing anything.
    #[tracing::instrument(skip_all)]
    pub fn plan(&self, loader: &mut impl TestLoader) -> Result<(ResolvedPlan, Registry), TestError> {
        let files_to_load = self.test_files()?;

        let mut registry = Registry::new();
        for file in &files_to_load {
            loader.load(file, &mut registry)?;
        }
        tracing::debug!(
            files = files_to_load.len(),
            tests = registry.method_count(),
            "registry populated"
        );

        let effective_name_filter = self.find_method(&registry);
        Ok((
            ResolvedPlan {
                files_to_load,
                effective_name_filter,
            },
            registry,
        ))
    }

    /// Resolve the request and hand the plan to `executor`.
    ///
    /// Load errors abort the run before the executor is invoked.
    #[tracing::instrument(skip_all)]
    pub fn run(&self, loader: &mut impl TestLoader, executor: &impl TestExecutor) -> Result<RunOutcome, TestError> {
        let (plan, registry) = self.plan(loader)?;
        let ctx = RunContext::new(&self.request, &plan, &registry);
        executor.execute(&ctx)
    }
}
