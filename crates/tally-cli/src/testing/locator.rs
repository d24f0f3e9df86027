//! Test file locator - resolve `path`, `path:line` and directory arguments

use crate::testing::discovery::{LoadError, TestFile};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One line selector from a `path:SELECTOR` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSelector {
    /// `path:4`
    Line(u32),
    /// `path:4-9` (inclusive)
    Range(u32, u32),
}

impl LineSelector {
    /// Parse `4` or `4-9`
    fn parse(text: &str) -> Option<Self> {
        if let Some((from, to)) = text.split_once('-') {
            let from = parse_line(from)?;
            let to = parse_line(to)?;
            return Some(LineSelector::Range(from.min(to), from.max(to)));
        }
        parse_line(text).map(LineSelector::Line)
    }

    /// Whether a case spanning `start..=end` is selected
    pub fn selects(&self, start: u32, end: u32) -> bool {
        match *self {
            LineSelector::Line(line) => (start..=end).contains(&line),
            LineSelector::Range(from, to) => start <= to && from <= end,
        }
    }
}

impl fmt::Display for LineSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSelector::Line(line) => write!(f, "{}", line),
            LineSelector::Range(from, to) => write!(f, "{}-{}", from, to),
        }
    }
}

fn parse_line(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// A parsed command-line target: a path plus its line filter
///
/// An empty `lines` list means every case in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestTarget {
    pub path: PathBuf,
    pub lines: Vec<LineSelector>,
}

impl TestTarget {
    /// Split an argument into path and line selectors
    ///
    /// Trailing `:N`, `:N-M` and bare `:` segments are peeled off from the
    /// right, so `test/a_test.tl:4:9` selects lines 4 and 9 and
    /// `test/a_test.tl:` selects everything.
    pub fn parse(arg: &str) -> Self {
        let mut rest = arg;
        let mut lines = Vec::new();

        while let Some((head, tail)) = rest.rsplit_once(':') {
            if head.is_empty() {
                break;
            }
            if tail.is_empty() {
                rest = head;
                continue;
            }
            match LineSelector::parse(tail) {
                Some(selector) => {
                    lines.push(selector);
                    rest = head;
                }
                None => break,
            }
        }

        lines.reverse();
        Self {
            path: PathBuf::from(rest),
            lines,
        }
    }
}

/// A loaded file paired with the line filter that selected it
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file: TestFile,
    pub lines: Vec<LineSelector>,
}

/// Files that loaded, plus every load error in argument order
#[derive(Debug, Default)]
pub struct LoadReport {
    pub files: Vec<SelectedFile>,
    pub errors: Vec<LoadError>,
}

impl LoadReport {
    /// The error reported for the whole invocation
    pub fn first_error(&self) -> Option<&LoadError> {
        self.errors.first()
    }
}

/// Resolves arguments to test files
pub struct Locator {
    /// File-name suffix of test files inside directories
    suffix: String,
    /// Directory used when no arguments are given
    default_dir: PathBuf,
}

impl Locator {
    pub fn new(suffix: impl Into<String>, default_dir: impl Into<PathBuf>) -> Self {
        Self {
            suffix: suffix.into(),
            default_dir: default_dir.into(),
        }
    }

    /// Resolve arguments into file targets, preserving argument order
    ///
    /// Directories expand to their test files sorted by path. Duplicates are kept.
    pub fn resolve(&self, args: &[String]) -> Vec<TestTarget> {
        if args.is_empty() {
            if !self.default_dir.is_dir() {
                tracing::debug!(dir = %self.default_dir.display(), "default test directory missing");
                return Vec::new();
            }
            return self.expand_dir(&self.default_dir);
        }

        let mut targets = Vec::new();
        for arg in args {
            let target = TestTarget::parse(arg);
            if target.path.is_dir() {
                if !target.lines.is_empty() {
                    tracing::warn!(
                        dir = %target.path.display(),
                        "line filters are ignored for directories"
                    );
                }
                targets.extend(self.expand_dir(&target.path));
            } else {
                targets.push(target);
            }
        }
        targets
    }

    /// Load every target, continuing past failures
    pub fn load(&self, targets: Vec<TestTarget>) -> LoadReport {
        let mut report = LoadReport::default();

        for target in targets {
            match TestFile::load(&target.path) {
                Ok(file) => report.files.push(SelectedFile {
                    file,
                    lines: target.lines,
                }),
                Err(e) => {
                    tracing::debug!(path = %e.path().display(), error = %e, "failed to load test file");
                    report.errors.push(e);
                }
            }
        }

        report
    }

    /// Find test files in a directory tree
    fn expand_dir(&self, dir: &Path) -> Vec<TestTarget> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(&self.suffix))
            })
            .map(|entry| entry.into_path())
            .collect();

        // Sort for deterministic order
        files.sort();

        files
            .into_iter()
            .map(|path| TestTarget {
                path,
                lines: Vec::new(),
            })
            .collect()
    }
}
