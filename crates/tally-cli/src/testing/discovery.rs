//! Test discovery - load test files and register their test cases

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_runtime::{Execution, Script, SyntaxError};
use thiserror::Error;

/// Errors raised while loading a test file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot load such file -- {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot load such file -- {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("syntax error in {}:{}: {}", path.display(), error.span.line, error.message)]
    Syntax { path: PathBuf, error: SyntaxError },
}

impl LoadError {
    /// Path of the file that failed to load
    pub fn path(&self) -> &Path {
        match self {
            LoadError::NotFound { path }
            | LoadError::Unreadable { path, .. }
            | LoadError::Syntax { path, .. } => path,
        }
    }
}

/// Something a test case can execute
pub trait Runnable {
    /// Run the body, writing any output to `out`
    fn run(&self, out: &mut dyn Write) -> Execution;
}

impl<F> Runnable for F
where
    F: Fn(&mut dyn Write) -> Execution,
{
    fn run(&self, out: &mut dyn Write) -> Execution {
        self(out)
    }
}

/// A test function inside a parsed script
struct ScriptFunction {
    script: Script,
    name: String,
}

impl Runnable for ScriptFunction {
    fn run(&self, out: &mut dyn Write) -> Execution {
        self.script.run(&self.name, out)
    }
}

/// A registered test case
#[derive(Clone)]
pub struct TestCase {
    /// Name of the test function (e.g., "test_truth")
    pub name: String,
    /// File containing the test
    pub file: PathBuf,
    /// Line of the declaration
    pub start_line: u32,
    /// Line of the closing brace
    pub end_line: u32,
    body: Arc<dyn Runnable>,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        file: impl Into<PathBuf>,
        start_line: u32,
        end_line: u32,
        body: Arc<dyn Runnable>,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            start_line,
            end_line,
            body,
        }
    }

    /// Suite label derived from the file name (`post_test` for `test/post_test.tl`)
    pub fn suite(&self) -> String {
        self.file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string())
    }

    /// `suite#name`, as shown in reports
    pub fn label(&self) -> String {
        format!("{}#{}", self.suite(), self.name)
    }

    /// Execute the case body
    pub fn run(&self, out: &mut dyn Write) -> Execution {
        self.body.run(out)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("file", &self.file)
            .field("start_line", &self.start_line)
            .field("end_line", &self.end_line)
            .finish_non_exhaustive()
    }
}

/// A loaded test file and its cases in declaration order
#[derive(Debug, Clone)]
pub struct TestFile {
    pub path: PathBuf,
    pub cases: Vec<TestCase>,
}

impl TestFile {
    /// Read and parse a test file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let source = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        Self::from_source(path, &source)
    }

    /// Parse test source that was read from `path`
    pub fn from_source(path: &Path, source: &str) -> Result<Self, LoadError> {
        let script = Script::parse(source).map_err(|error| LoadError::Syntax {
            path: path.to_path_buf(),
            error,
        })?;

        for func in script.functions() {
            if func.name.starts_with("test_") && !func.params.is_empty() {
                tracing::warn!(
                    file = %path.display(),
                    test = %func.name,
                    "test takes parameters, skipping (tests must have no parameters)"
                );
            }
        }

        let cases = script
            .tests()
            .map(|func| {
                let body = ScriptFunction {
                    script: script.clone(),
                    name: func.name.clone(),
                };
                TestCase::new(
                    func.name.clone(),
                    path,
                    func.span.line,
                    func.end_line,
                    Arc::new(body),
                )
            })
            .collect::<Vec<_>>();

        tracing::debug!(file = %path.display(), cases = cases.len(), "loaded test file");

        Ok(Self {
            path: path.to_path_buf(),
            cases,
        })
    }
}
