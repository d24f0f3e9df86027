//! Test reporter - display test results

use crate::testing::discovery::TestCase;
use crate::testing::runner::{RunSummary, TestResult, TestRun};
use colored::*;
use std::io::{self, Write};

/// Receives progress events from the runner
///
/// `output` is where test bodies write what they print; the runner hands it
/// to each case as it executes.
pub trait Reporter {
    /// Stream for test output
    fn output(&mut self) -> &mut dyn Write;

    /// Called once before any test runs
    fn on_run_start(&mut self, _planned: usize) {}

    /// Called before a test executes
    fn on_test_start(&mut self, _test: &TestCase) {}

    /// Called after a test executes
    fn on_test_complete(&mut self, run: &TestRun);

    /// Called when fail-fast stops the run after `run`
    fn on_interrupt(&mut self, _run: &TestRun) {}

    /// Called once after the last test
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// Human-readable reporter
///
/// Headers, progress and the summary go to `out`; failure details and the
/// interrupt notice go to `err`.
pub struct ConsoleReporter<O: Write, E: Write> {
    out: O,
    err: E,
    /// Show name and timing for each test instead of a single mark
    verbose: bool,
    /// Print failure details after the run instead of inline
    defer_output: bool,
    color: bool,
}

impl ConsoleReporter<io::Stdout, io::Stderr> {
    /// Reporter writing to the process's stdout and stderr
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            verbose: false,
            defer_output: false,
            color: true,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_defer_output(mut self, defer_output: bool) -> Self {
        self.defer_output = defer_output;
        self
    }

    /// Enable or disable colored output
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Consume the reporter, returning its streams
    #[cfg(test)]
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn progress_mark(&self, result: &TestResult) -> String {
        let mark = result.mark().to_string();
        match result {
            TestResult::Pass { .. } => self.paint(&mark, |s| s.green()),
            TestResult::Fail { .. } => self.paint(&mark, |s| s.red().bold()),
            TestResult::Error { .. } => self.paint(&mark, |s| s.yellow().bold()),
        }
    }

    /// Write the detail block for a failed or errored run
    fn print_failure(&mut self, run: &TestRun) {
        let (title, line, body) = match &run.result {
            TestResult::Pass { .. } => return,
            TestResult::Fail { message, line, .. } => {
                (self.paint("Failure:", |s| s.red().bold()), *line, message.clone())
            }
            TestResult::Error {
                kind,
                message,
                line,
                ..
            } => (
                self.paint("Error:", |s| s.yellow().bold()),
                *line,
                format!("{}: {}", kind, message),
            ),
        };

        let path = run.test.file.display();
        // The failing line lies inside the case range
        let rerun = self.paint(&format!("tally {}:{}", path, line), |s| s.dimmed());

        let _ = writeln!(self.err);
        let _ = writeln!(self.err, "{}", title);
        let _ = writeln!(self.err, "{} [{}:{}]:", run.test.label(), path, line);
        let _ = writeln!(self.err, "{}", body);
        let _ = writeln!(self.err);
        let _ = writeln!(self.err, "{}", rerun);
        let _ = self.err.flush();
    }
}

impl<O: Write, E: Write> Reporter for ConsoleReporter<O, E> {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn on_run_start(&mut self, _planned: usize) {
        let _ = writeln!(self.out, "# Running:");
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }

    fn on_test_start(&mut self, test: &TestCase) {
        let _ = writeln!(self.out, "{}", test.label());
        let _ = self.out.flush();
    }

    fn on_test_complete(&mut self, run: &TestRun) {
        let mark = self.progress_mark(&run.result);
        if self.verbose {
            let _ = writeln!(
                self.out,
                "{} = {:.2} s = {}",
                run.test.label(),
                run.result.duration().as_secs_f64(),
                mark
            );
        } else {
            let _ = writeln!(self.out, "{}", mark);
        }
        let _ = self.out.flush();

        if !self.defer_output {
            self.print_failure(run);
        }
    }

    fn on_interrupt(&mut self, run: &TestRun) {
        let notice = self.paint("Interrupt:", |s| s.yellow().bold());
        let _ = writeln!(self.err);
        let _ = writeln!(
            self.err,
            "{} stopping after first failure in {} (--fail-fast)",
            notice,
            run.test.label()
        );
        let _ = self.err.flush();
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        if self.defer_output {
            for run in &summary.failed_runs {
                self.print_failure(run);
            }
        }

        let line = summary.to_string();
        let line = if summary.failures + summary.errors > 0 {
            self.paint(&line, |s| s.red())
        } else {
            self.paint(&line, |s| s.green())
        };

        let _ = writeln!(self.out);
        let _ = writeln!(
            self.out,
            "Finished in {:.6}s.",
            summary.elapsed.as_secs_f64()
        );
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}

/// Machine-readable reporter
///
/// Test output is captured per test and included in the final document.
pub struct JsonReporter<W: Write> {
    writer: W,
    captured: Vec<u8>,
    results: Vec<serde_json::Value>,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            captured: Vec::new(),
            results: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.captured
    }

    fn on_test_start(&mut self, _test: &TestCase) {
        self.captured.clear();
    }

    fn on_test_complete(&mut self, run: &TestRun) {
        let mut entry = serde_json::json!({
            "name": run.test.name,
            "suite": run.test.suite(),
            "file": run.test.file.display().to_string(),
            "start_line": run.test.start_line,
            "end_line": run.test.end_line,
            "status": run.result.status(),
            "assertions": run.assertions,
            "duration_ms": run.result.duration().as_secs_f64() * 1000.0,
            "output": String::from_utf8_lossy(&self.captured),
        });

        match &run.result {
            TestResult::Pass { .. } => {}
            TestResult::Fail { message, line, .. } => {
                entry["message"] = message.as_str().into();
                entry["line"] = (*line).into();
            }
            TestResult::Error {
                kind,
                message,
                line,
                ..
            } => {
                entry["kind"] = kind.as_str().into();
                entry["message"] = message.as_str().into();
                entry["line"] = (*line).into();
            }
        }

        self.results.push(entry);
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        let document = serde_json::json!({
            "runs": summary.runs,
            "assertions": summary.assertions,
            "failures": summary.failures,
            "errors": summary.errors,
            "interrupted": summary.interrupted,
            "elapsed_secs": summary.elapsed.as_secs_f64(),
            "results": std::mem::take(&mut self.results),
        });

        let _ = writeln!(self.writer, "{}", document);
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::testing::discovery::TestFile;
    use crate::testing::runner::TestRunner;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::time::Duration;

    /// Reporter that records the event sequence
    #[derive(Default)]
    pub(crate) struct RecordingReporter {
        pub events: Vec<String>,
        pub output: Vec<u8>,
    }

    impl Reporter for RecordingReporter {
        fn output(&mut self) -> &mut dyn Write {
            &mut self.output
        }

        fn on_run_start(&mut self, planned: usize) {
            self.events.push(format!("start {}", planned));
        }

        fn on_test_start(&mut self, test: &TestCase) {
            self.events.push(format!("begin {}", test.name));
        }

        fn on_test_complete(&mut self, run: &TestRun) {
            self.events
                .push(format!("end {} {}", run.test.name, run.result.mark()));
        }

        fn on_interrupt(&mut self, run: &TestRun) {
            self.events.push(format!("interrupt {}", run.test.name));
        }

        fn on_run_complete(&mut self, _summary: &RunSummary) {
            self.events.push("complete".to_string());
        }
    }

    const POST_TEST: &str = r#"fn test_post() {
    print("PostTest");
    assert(false, "wups!");
}

fn test_boom() {
    raise("boom");
}

fn test_fine() {
    assert(true);
}
"#;

    fn post_cases() -> Vec<TestCase> {
        TestFile::from_source(Path::new("test/post_test.tl"), POST_TEST)
            .unwrap()
            .cases
    }

    fn console(verbose: bool, defer: bool) -> ConsoleReporter<Vec<u8>, Vec<u8>> {
        ConsoleReporter::new(Vec::new(), Vec::new())
            .with_verbose(verbose)
            .with_defer_output(defer)
            .with_color(false)
    }

    fn run_console(
        reporter: ConsoleReporter<Vec<u8>, Vec<u8>>,
        cases: &[TestCase],
        fail_fast: bool,
    ) -> (String, String) {
        let mut reporter = reporter;
        TestRunner::new()
            .with_fail_fast(fail_fast)
            .run(cases, &mut reporter);
        let (out, err) = reporter.into_inner();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_console_stdout_layout() {
        let cases = post_cases();
        let (out, _) = run_console(console(false, false), &cases[..1], false);

        assert!(out.starts_with(
            "# Running:\n\npost_test#test_post\nPostTest\nF\n\nFinished in "
        ));
        assert!(out.ends_with("s.\n\n1 runs, 1 assertions, 1 failures\n"));
    }

    #[test]
    fn test_console_inline_failure_block() {
        let cases = post_cases();
        let (_, err) = run_console(console(false, false), &cases, false);

        assert_eq!(
            err,
            "\nFailure:\npost_test#test_post [test/post_test.tl:3]:\nwups!\n\ntally test/post_test.tl:3\n\
             \nError:\npost_test#test_boom [test/post_test.tl:7]:\nRaised: boom\n\ntally test/post_test.tl:7\n"
        );
    }

    #[test]
    fn test_failure_block_snapshot() {
        let cases = post_cases();
        let (_, err) = run_console(console(false, false), &cases[..1], false);

        insta::assert_snapshot!(err.trim(), @r"
        Failure:
        post_test#test_post [test/post_test.tl:3]:
        wups!

        tally test/post_test.tl:3
        ");
    }

    #[test]
    fn test_console_summary_with_errors() {
        let cases = post_cases();
        let (out, _) = run_console(console(false, false), &cases, false);
        assert!(out.ends_with("3 runs, 2 assertions, 1 failures, 1 errors\n"));
        assert!(out.contains("F\npost_test#test_boom\nE\npost_test#test_fine\n.\n"));
    }

    #[test]
    fn test_console_verbose_lines() {
        let cases = post_cases();
        let (out, _) = run_console(console(true, false), &cases[2..], false);
        assert!(out.contains("post_test#test_fine\npost_test#test_fine = 0.00 s = .\n"));
    }

    #[test]
    fn test_deferred_run_reports_every_failure() {
        let cases = post_cases();
        let (out, err) = run_console(console(false, true), &cases, false);

        assert_eq!(err.matches("Failure:").count(), 1);
        assert_eq!(err.matches("Error:").count(), 1);
        assert!(out.contains("F\npost_test#test_boom\nE\n"));
    }

    #[test]
    fn test_deferred_output_is_empty_until_complete() {
        let cases = post_cases();
        let mut reporter = console(false, true);
        let run = TestRun {
            test: cases[0].clone(),
            result: TestResult::Fail {
                message: "wups!".to_string(),
                line: 3,
                duration: Duration::from_millis(1),
            },
            assertions: 1,
        };

        reporter.on_test_complete(&run);
        assert!(reporter.err.is_empty());

        let mut summary = RunSummary::default();
        summary.record(&run);
        reporter.on_run_complete(&summary);
        let err = String::from_utf8(reporter.err.clone()).unwrap();
        assert!(err.contains("wups!"));
    }

    #[test]
    fn test_interrupt_notice_goes_to_stderr() {
        let cases = post_cases();
        let (out, err) = run_console(console(false, false), &cases, true);

        assert!(err.contains("Interrupt: stopping after first failure in post_test#test_post (--fail-fast)"));
        assert!(!out.contains("test_boom"));
        assert!(out.ends_with("1 runs, 1 assertions, 1 failures\n"));
    }

    #[test]
    fn test_json_document() {
        let cases = post_cases();
        let mut reporter = JsonReporter::new(Vec::new());
        TestRunner::new().run(&cases, &mut reporter);

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(text.trim()).unwrap();

        assert_eq!(doc["runs"], 3);
        assert_eq!(doc["assertions"], 2);
        assert_eq!(doc["failures"], 1);
        assert_eq!(doc["errors"], 1);
        assert_eq!(doc["interrupted"], false);

        let results = doc["results"].as_array().unwrap();
        assert_eq!(results[0]["status"], "failed");
        assert_eq!(results[0]["message"], "wups!");
        assert_eq!(results[0]["line"], 3);
        assert_eq!(results[0]["output"], "PostTest\n");
        assert_eq!(results[1]["kind"], "Raised");
        assert_eq!(results[2]["status"], "passed");
        assert_eq!(results[2]["output"], "");
    }
}
