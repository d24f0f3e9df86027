//! Test case filter - narrow loaded files down to the cases to run

use crate::testing::discovery::TestCase;
use crate::testing::locator::{LineSelector, SelectedFile};
use regex::Regex;

/// A `--name` / `--exclude` pattern
#[derive(Debug, Clone)]
pub enum NamePattern {
    /// Plain text matched anywhere in the case name
    Substring(String),
    /// `/regex/`
    Regex(Regex),
}

impl NamePattern {
    /// Parse a pattern, treating `/.../` as a regular expression
    pub fn parse(pattern: &str) -> Result<Self, regex::Error> {
        match pattern
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(re) => Ok(NamePattern::Regex(Regex::new(re)?)),
            None => Ok(NamePattern::Substring(pattern.to_string())),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Substring(text) => name.contains(text.as_str()),
            NamePattern::Regex(re) => re.is_match(name),
        }
    }
}

/// Selects test cases by line and name
#[derive(Debug, Clone, Default)]
pub struct TestFilter {
    include: Option<NamePattern>,
    exclude: Option<NamePattern>,
}

impl TestFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only cases whose name matches
    pub fn with_include(mut self, pattern: Option<NamePattern>) -> Self {
        self.include = pattern;
        self
    }

    /// Drop cases whose name matches
    pub fn with_exclude(mut self, pattern: Option<NamePattern>) -> Self {
        self.exclude = pattern;
        self
    }

    /// Flatten the selected files into an ordered list of cases
    ///
    /// Files keep argument order and cases keep declaration order. A line
    /// selector that hits no case contributes nothing.
    pub fn select(&self, files: &[SelectedFile]) -> Vec<TestCase> {
        let mut selected = Vec::new();

        for entry in files {
            let before = selected.len();
            selected.extend(
                select_lines(&entry.file.cases, &entry.lines)
                    .filter(|case| self.matches_name(&case.name))
                    .cloned(),
            );

            if !entry.lines.is_empty() && selected.len() == before {
                tracing::debug!(
                    file = %entry.file.path.display(),
                    lines = ?entry.lines,
                    "line filter matched no test cases"
                );
            }
        }

        selected
    }

    fn matches_name(&self, name: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.matches(name) {
                return false;
            }
        }
        match &self.exclude {
            Some(exclude) => !exclude.matches(name),
            None => true,
        }
    }
}

/// Cases whose range is hit by any selector; every case when there are none
pub fn select_lines<'a>(
    cases: &'a [TestCase],
    lines: &'a [LineSelector],
) -> impl Iterator<Item = &'a TestCase> + 'a {
    cases.iter().filter(move |case| {
        lines.is_empty()
            || lines
                .iter()
                .any(|selector| selector.selects(case.start_line, case.end_line))
    })
}
