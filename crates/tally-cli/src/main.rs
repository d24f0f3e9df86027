use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io;
use std::process::ExitCode;

mod commands;
mod config;
mod logging;
mod testing;

/// Line-filtered test runner for tally scripts.
///
/// Runs the test cases in each given file. A `:LINE` suffix runs only the
/// test whose body contains that line; `:4-9` runs every test overlapping
/// the range and `path:4:9` combines selectors. A directory runs every
/// `*_test.tl` file below it. With no paths the configured test directory
/// (default `test`) is used.
///
/// EXAMPLES:
///     tally test/post_test.tl           Run every test in a file
///     tally test/post_test.tl:12        Run the test around line 12
///     tally test/a_test.tl test/b_test.tl:4
///     tally --fail-fast test/           Stop at the first failure
///     tally -n /^test_parse/            Run tests matching a regex
///
/// ENVIRONMENT VARIABLES:
///     TALLY_JSON        Set to 'true' for JSON output by default
///     TALLY_LOG         Log filter (e.g. 'debug'), default 'warn'
///     TALLY_TEST_DIR    Directory used when no paths are given
///     TALLY_FAIL_FAST   Set to '1' to enable fail-fast
///     NO_COLOR          Set to disable colored output
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version)]
struct Cli {
    /// Test files or directories, optionally suffixed with `:LINE`
    #[arg(value_name = "PATH[:LINE]")]
    paths: Vec<String>,

    /// Stop running tests after the first failure or error
    #[arg(long, short = 'f')]
    fail_fast: bool,

    /// Show each test name with its duration
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Only run tests whose name contains PATTERN (or matches /REGEX/)
    #[arg(long, short = 'n', value_name = "PATTERN")]
    name: Option<String>,

    /// Skip tests whose name contains PATTERN (or matches /REGEX/)
    #[arg(long, short = 'e', value_name = "PATTERN")]
    exclude: Option<String>,

    /// Print failure details after the run instead of inline
    #[arg(long, short = 'd')]
    defer_output: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Output results as a single JSON document
    #[arg(long, env = "TALLY_JSON")]
    json: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cli_config = config::CliConfig::from_env();

    logging::init(&cli_config.log_filter);

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    // An unusable tally.toml must not block a test run
    let project_config = match tally_config::ConfigLoader::new()
        .load_from_directory(&std::env::current_dir()?)
    {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring invalid configuration");
            tally_config::Config::default()
        }
    };

    let args = commands::test::TestArgs {
        paths: cli.paths,
        fail_fast: cli.fail_fast,
        verbose: cli.verbose,
        name: cli.name,
        exclude: cli.exclude,
        defer_output: cli.defer_output,
        no_color: cli.no_color || cli_config.no_color,
        json: cli.json,
    };

    let status = commands::test::run(args, &project_config)?;
    Ok(status.into())
}
