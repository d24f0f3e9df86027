//! CLI integration tests
//!
//! Runs the `tally` binary against fixture projects in temporary directories:
//! - File and line selection
//! - Failure output and exit codes
//! - Fail-fast interrupts
//! - Load errors
//! - Configuration and flags

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const ACCOUNT_TEST: &str = r#"fn test_truth() {
    print("AccountTest");
    assert(true);
}
"#;

const POST_TEST: &str = r#"fn test_post() {
    print("PostTest");
    assert(true);
}

fn test_line_filter_does_not_run_this() {
    print("line filter does not run this");
    assert(true);
}
"#;

const FAILING_POST_TEST: &str = r#"fn test_post() {
    print("PostTest");
    assert(false, "wups!");
}
"#;

const TWO_FAILURES: &str = r#"fn test_first() {
    flunk("first failure");
}

fn test_second() {
    flunk("second failure");
}
"#;

/// A project directory with a `test/` folder
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("test")).unwrap();
        Self { dir }
    }

    fn file(self, name: &str, content: &str) -> Self {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn tally(&self) -> Command {
        let mut cmd = Command::cargo_bin("tally").unwrap();
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("NO_COLOR", "1")
            .env_remove("TALLY_JSON")
            .env_remove("TALLY_FAIL_FAST")
            .env_remove("TALLY_TEST_DIR")
            .env_remove("TALLY_VERBOSE")
            .env_remove("TALLY_DEFER_OUTPUT")
            .env_remove("TALLY_LOG");
        cmd
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// FILE AND LINE SELECTION
// ══════════════════════════════════════════════════════════════════════════════

mod selection {
    use super::*;

    #[test]
    fn test_run_single_file() {
        let project = Project::new().file("test/account_test.tl", ACCOUNT_TEST);

        project
            .tally()
            .arg("test/account_test.tl")
            .assert()
            .success()
            .stdout(predicate::str::contains("AccountTest"))
            .stdout(predicate::str::contains("1 runs, 1 assertions, 0 failures"));
    }

    #[test]
    fn test_run_multiple_files() {
        let project = Project::new()
            .file("test/account_test.tl", ACCOUNT_TEST)
            .file("test/post_test.tl", FAILING_POST_TEST.replace("false", "true").as_str());

        project
            .tally()
            .args(["test/account_test.tl", "test/post_test.tl"])
            .assert()
            .success()
            .stdout(predicate::str::contains("AccountTest"))
            .stdout(predicate::str::contains("PostTest"))
            .stdout(predicate::str::contains("2 runs, 2 assertions, 0 failures"));
    }

    #[test]
    fn test_mix_files_and_line_filters() {
        let project = Project::new()
            .file("test/account_test.tl", ACCOUNT_TEST)
            .file("test/post_test.tl", POST_TEST);

        project
            .tally()
            .args(["test/account_test.tl", "test/post_test.tl:1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("AccountTest"))
            .stdout(predicate::str::contains("PostTest"))
            .stdout(predicate::str::contains("line filter does not run this").not())
            .stdout(predicate::str::contains("2 runs, 2 assertions, 0 failures"));
    }

    #[test]
    fn test_multiple_line_filters() {
        let project = Project::new()
            .file("test/account_test.tl", ACCOUNT_TEST)
            .file("test/post_test.tl", POST_TEST);

        project
            .tally()
            .args(["test/account_test.tl:2", "test/post_test.tl:3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("AccountTest"))
            .stdout(predicate::str::contains("PostTest"))
            .stdout(predicate::str::contains("line filter does not run this").not())
            .stdout(predicate::str::contains("2 runs, 2 assertions, 0 failures"));
    }

    #[test]
    fn test_line_filter_selects_second_case() {
        let project = Project::new().file("test/post_test.tl", POST_TEST);

        project
            .tally()
            .arg("test/post_test.tl:7")
            .assert()
            .success()
            .stdout(predicate::str::contains("post_test#test_line_filter_does_not_run_this"))
            .stdout(predicate::str::contains("PostTest").not())
            .stdout(predicate::str::contains("1 runs, 1 assertions, 0 failures"));
    }

    #[test]
    fn test_multiple_selectors_in_one_argument() {
        let project = Project::new().file("test/post_test.tl", POST_TEST);

        project
            .tally()
            .arg("test/post_test.tl:1:6")
            .assert()
            .success()
            .stdout(predicate::str::contains("2 runs, 2 assertions, 0 failures"));
    }

    #[test]
    fn test_trailing_colon_runs_everything() {
        let project = Project::new()
            .file("test/account_test.tl", ACCOUNT_TEST)
            .file("test/post_test.tl", POST_TEST);

        project
            .tally()
            .args(["test/account_test.tl:", "test/post_test.tl"])
            .assert()
            .success()
            .stdout(predicate::str::contains("AccountTest"))
            .stdout(predicate::str::contains("line filter does not run this"))
            .stdout(predicate::str::contains("3 runs, 3 assertions, 0 failures"));
    }

    #[test]
    fn test_line_between_cases_runs_nothing() {
        let project = Project::new().file("test/post_test.tl", POST_TEST);

        project
            .tally()
            .arg("test/post_test.tl:5")
            .assert()
            .success()
            .stdout(predicate::str::contains("0 runs, 0 assertions, 0 failures"));
    }

    #[test]
    fn test_duplicate_paths_run_twice() {
        let project = Project::new().file("test/account_test.tl", ACCOUNT_TEST);

        project
            .tally()
            .args(["test/account_test.tl", "test/account_test.tl"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 runs, 2 assertions, 0 failures"));
    }

    #[test]
    fn test_no_paths_runs_test_directory() {
        let project = Project::new()
            .file("test/account_test.tl", ACCOUNT_TEST)
            .file("test/models/post_test.tl", POST_TEST)
            .file("test/helper.tl", "fn test_not_collected() { flunk(); }\n");

        project
            .tally()
            .assert()
            .success()
            .stdout(predicate::str::contains("3 runs, 3 assertions, 0 failures"));
    }

    #[test]
    fn test_name_filter() {
        let project = Project::new().file("test/post_test.tl", POST_TEST);

        project
            .tally()
            .args(["-n", "/^test_post$/", "test/post_test.tl"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 runs, 1 assertions, 0 failures"));

        project
            .tally()
            .args(["--exclude", "line_filter", "test/post_test.tl"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 runs, 1 assertions, 0 failures"));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// FAILURE OUTPUT
// ══════════════════════════════════════════════════════════════════════════════

mod failures {
    use super::*;

    #[test]
    fn test_output_inline_by_default() {
        let project = Project::new().file("test/post_test.tl", FAILING_POST_TEST);

        project
            .tally()
            .arg("test/post_test.tl")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("# Running:"))
            .stdout(predicate::str::contains("post_test#test_post\nPostTest\nF\n"))
            .stdout(predicate::str::contains("1 runs, 1 assertions, 1 failures"))
            .stderr(predicate::str::contains(
                "Failure:\npost_test#test_post [test/post_test.tl:3]:\nwups!\n",
            ))
            .stderr(predicate::str::contains("tally test/post_test.tl:3"));
    }

    #[test]
    fn test_errors_are_counted_separately() {
        let project = Project::new().file(
            "test/boom_test.tl",
            "fn test_boom() {\n    raise(\"boom\");\n}\n",
        );

        project
            .tally()
            .arg("test/boom_test.tl")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("1 runs, 0 assertions, 0 failures, 1 errors"))
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("Raised: boom"));
    }

    #[test]
    fn test_fail_fast() {
        let project = Project::new().file("test/two_test.tl", TWO_FAILURES);

        project
            .tally()
            .args(["--fail-fast", "test/two_test.tl"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("1 runs, 1 assertions, 1 failures"))
            .stderr(predicate::str::contains("first failure"))
            .stderr(predicate::str::contains("second failure").not())
            .stderr(predicate::str::contains("Interrupt"));
    }

    #[test]
    fn test_without_fail_fast_runs_everything() {
        let project = Project::new().file("test/two_test.tl", TWO_FAILURES);

        project
            .tally()
            .arg("test/two_test.tl")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("2 runs, 2 assertions, 2 failures"))
            .stderr(predicate::str::contains("Interrupt").not());
    }

    #[test]
    fn test_missing_file() {
        let project = Project::new().file("test/account_test.tl", ACCOUNT_TEST);

        project
            .tally()
            .args(["test/account_test.tl", "test/not_exists.tl"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "cannot load such file -- test/not_exists.tl",
            ))
            .stdout(predicate::str::contains("runs,").not());
    }

    #[test]
    fn test_syntax_error_is_a_load_error() {
        let project =
            Project::new().file("test/broken_test.tl", "fn test_broken() {\n    assert(\n");

        project
            .tally()
            .arg("test/broken_test.tl")
            .assert()
            .failure()
            .stderr(predicate::str::contains("syntax error in test/broken_test.tl"))
            .stdout(predicate::str::contains("runs,").not());
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// FLAGS AND CONFIGURATION
// ══════════════════════════════════════════════════════════════════════════════

mod flags {
    use super::*;

    #[test]
    fn test_help_shows_examples() {
        Command::cargo_bin("tally")
            .unwrap()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("EXAMPLES"))
            .stdout(predicate::str::contains("--fail-fast"))
            .stdout(predicate::str::contains("NO_COLOR"));
    }

    #[test]
    fn test_completions() {
        Command::cargo_bin("tally")
            .unwrap()
            .args(["--completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("tally"));
    }

    #[test]
    fn test_verbose_output() {
        let project = Project::new().file("test/account_test.tl", ACCOUNT_TEST);

        project
            .tally()
            .args(["-v", "test/account_test.tl"])
            .assert()
            .success()
            .stdout(predicate::str::is_match(r"account_test#test_truth = \d+\.\d{2} s = \.").unwrap());
    }

    #[test]
    fn test_json_output() {
        let project = Project::new().file("test/post_test.tl", FAILING_POST_TEST);

        let output = project
            .tally()
            .args(["--json", "test/post_test.tl"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(doc["runs"], 1);
        assert_eq!(doc["failures"], 1);
        assert_eq!(doc["results"][0]["message"], "wups!");
        assert_eq!(doc["results"][0]["output"], "PostTest\n");
    }

    #[test]
    fn test_project_config_sets_suffix_and_fail_fast() {
        let project = Project::new()
            .file(
                "tally.toml",
                "[runner]\ntest_dir = \"checks\"\nsuffix = \"_check.tl\"\nfail_fast = true\n",
            )
            .file("checks/two_check.tl", TWO_FAILURES)
            .file("checks/ignored_test.tl", ACCOUNT_TEST);

        project
            .tally()
            .assert()
            .code(1)
            .stdout(predicate::str::contains("1 runs, 1 assertions, 1 failures"))
            .stderr(predicate::str::contains("Interrupt"));

        // Fixture layout sanity check
        assert!(project.path().join("checks").is_dir());
    }

    #[test]
    fn test_env_fail_fast() {
        let project = Project::new().file("test/two_test.tl", TWO_FAILURES);

        project
            .tally()
            .env("TALLY_FAIL_FAST", "1")
            .arg("test/two_test.tl")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Interrupt"));
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let project = Project::new()
            .file("tally.toml", "[runner\nbroken")
            .file("test/account_test.tl", ACCOUNT_TEST);

        project
            .tally()
            .arg("test/account_test.tl")
            .assert()
            .success()
            .stdout(predicate::str::contains("1 runs, 1 assertions, 0 failures"))
            .stderr(predicate::str::contains("ignoring invalid configuration"));
    }
}
