//! Test runner - execute selected tests

use crate::testing::discovery::TestCase;
use crate::testing::reporter::Reporter;
use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

/// Result of running a single test
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    /// Test passed successfully
    Pass { duration: Duration },
    /// An assertion did not hold
    Fail {
        message: String,
        line: u32,
        duration: Duration,
    },
    /// The test raised or hit a runtime error
    Error {
        kind: String,
        message: String,
        line: u32,
        duration: Duration,
    },
}

impl TestResult {
    /// Check if this result is a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }

    /// Get the duration of this test
    pub fn duration(&self) -> Duration {
        match self {
            TestResult::Pass { duration }
            | TestResult::Fail { duration, .. }
            | TestResult::Error { duration, .. } => *duration,
        }
    }

    /// Progress mark: `.`, `F` or `E`
    pub fn mark(&self) -> char {
        match self {
            TestResult::Pass { .. } => '.',
            TestResult::Fail { .. } => 'F',
            TestResult::Error { .. } => 'E',
        }
    }

    /// Lowercase status name
    pub fn status(&self) -> &'static str {
        match self {
            TestResult::Pass { .. } => "passed",
            TestResult::Fail { .. } => "failed",
            TestResult::Error { .. } => "errored",
        }
    }
}

/// A completed test run
#[derive(Debug, Clone)]
pub struct TestRun {
    /// The test that was run
    pub test: TestCase,
    /// Result of running the test
    pub result: TestResult,
    /// Assertions made by the test
    pub assertions: usize,
}

/// Aggregated counts for a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Executed cases
    pub runs: usize,
    pub assertions: usize,
    pub failures: usize,
    pub errors: usize,
    /// Failed and errored runs in execution order
    pub failed_runs: Vec<TestRun>,
    pub elapsed: Duration,
    /// Stopped early by fail-fast
    pub interrupted: bool,
}

impl RunSummary {
    /// Fold one run into the counts
    pub fn record(&mut self, run: &TestRun) {
        self.runs += 1;
        self.assertions += run.assertions;
        match run.result {
            TestResult::Pass { .. } => {}
            TestResult::Fail { .. } => {
                self.failures += 1;
                self.failed_runs.push(run.clone());
            }
            TestResult::Error { .. } => {
                self.errors += 1;
                self.failed_runs.push(run.clone());
            }
        }
    }

    /// True when nothing failed, errored or was interrupted
    pub fn is_success(&self) -> bool {
        self.failures == 0 && self.errors == 0 && !self.interrupted
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} runs, {} assertions, {} failures",
            self.runs, self.assertions, self.failures
        )?;
        if self.errors > 0 {
            write!(f, ", {} errors", self.errors)?;
        }
        Ok(())
    }
}

/// Test runner with configuration
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    /// Stop scheduling after the first failed or errored test
    fail_fast: bool,
}

impl TestRunner {
    /// Create a new test runner with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fail-fast mode
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Run the cases in order, streaming progress to `reporter`
    pub fn run<R: Reporter + ?Sized>(&self, cases: &[TestCase], reporter: &mut R) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        reporter.on_run_start(cases.len());

        for case in cases {
            reporter.on_test_start(case);
            let run = self.run_single_test(case, reporter.output());
            summary.record(&run);
            reporter.on_test_complete(&run);

            if self.fail_fast && !run.result.is_pass() {
                tracing::debug!(test = %case.label(), "fail-fast triggered");
                summary.interrupted = true;
                reporter.on_interrupt(&run);
                break;
            }
        }

        summary.elapsed = start.elapsed();
        reporter.on_run_complete(&summary);
        summary
    }

    /// Run a single test
    fn run_single_test(&self, test: &TestCase, out: &mut dyn Write) -> TestRun {
        let start = Instant::now();
        let execution = test.run(out);
        let duration = start.elapsed();

        let result = match execution.result {
            Ok(()) => TestResult::Pass { duration },
            Err(error) => {
                // Span line 0 means the error has no location inside the body
                let line = match error.span().line {
                    0 => test.start_line,
                    line => line,
                };
                if error.is_assertion() {
                    TestResult::Fail {
                        message: error.to_string(),
                        line,
                        duration,
                    }
                } else {
                    TestResult::Error {
                        kind: error.kind_name().to_string(),
                        message: error.to_string(),
                        line,
                        duration,
                    }
                }
            }
        };

        TestRun {
            test: test.clone(),
            result,
            assertions: execution.assertions,
        }
    }
}
